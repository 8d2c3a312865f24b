use thiserror::Error;

use crate::Length;

/// Terminal failures of a decode call.
///
/// Per-pair routing failures and DNP mismatches are not errors: they make the
/// decoder backtrack to the next ranked candidate combination and only
/// surface through the observer. `E` is the map reader error type.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DecodeError<E> {
    /// Candidate generation yielded no line for the location reference point
    /// at the given index.
    #[error("no candidate line found for location reference point {0}")]
    NoCandidates(usize),
    /// Every ranked candidate combination was exhausted without a route
    /// sequence satisfying the reference.
    #[error("no candidate combination matches the location reference")]
    NoMatch,
    /// The offsets consume the whole decoded path.
    #[error("offsets ({pos} + {neg}) exceed the decoded location length")]
    InvalidOffsets { pos: Length, neg: Length },
    /// The location reference is malformed.
    #[error("invalid location reference: {0}")]
    InvalidReference(&'static str),
    /// The map reader failed; propagated without retry.
    #[error("map reader error: {0}")]
    MapReader(#[from] E),
}
