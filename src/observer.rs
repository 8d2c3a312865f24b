use crate::decoder::candidates::Candidate;
use crate::Length;

/// Decode progress notifications.
///
/// All methods have empty default implementations so an observer only
/// implements the events it cares about. Callbacks are purely observational:
/// they receive borrowed decoder state and cannot influence the decode.
pub trait DecodeObserver<LineId> {
    /// Ranked candidates were generated for a location reference point.
    fn candidates_found(&mut self, _lrp_index: usize, _candidates: &[Candidate<LineId>]) {}

    /// A candidate pair was selected for routing between two subsequent
    /// location reference points.
    fn candidates_selected(
        &mut self,
        _pair: usize,
        _start: &Candidate<LineId>,
        _end: &Candidate<LineId>,
    ) {
    }

    /// A route between the selected candidate pair was found and accepted.
    fn route_found(&mut self, _pair: usize, _path: &[LineId], _length: Length) {}

    /// No route connects the selected candidate pair.
    fn route_not_found(&mut self, _pair: usize) {}

    /// A route was found but its length is not compatible with the distance
    /// to next point of the reference.
    fn length_mismatch(&mut self, _pair: usize, _expected: Length, _actual: Length) {}

    /// The candidates of a pair were exhausted and the decoder stepped back
    /// to a previous location reference point.
    fn backtracked(&mut self, _pair: usize) {}

    /// The decode completed successfully.
    fn decode_finished(&mut self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl<LineId> DecodeObserver<LineId> for NoOpObserver {}
