use crate::{Coordinate, DecodeError, Length, MapReader, Orientation, SideOfRoad};

/// Location in a map resolved from a line location reference.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLocation<LineId> {
    /// Complete list of lines covering the location.
    pub path: Vec<LineId>,
    /// Distance from the start of the first line to the start of the
    /// location.
    pub pos_offset: Length,
    /// Distance from the end of the location to the end of the last line.
    pub neg_offset: Length,
}

/// Location in a map resolved from a point along line location reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAlongLineLocation<LineId> {
    /// Line holding the point.
    pub line: LineId,
    /// Distance from the start of the line to the point.
    pub offset: Length,
    /// Coordinate of the point on the line geometry.
    pub coordinate: Coordinate,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

/// Location in a map resolved from a POI with access point reference: the
/// access point on the road network plus the point of interest itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiLocation<LineId> {
    pub point: PointAlongLineLocation<LineId>,
    pub poi: Coordinate,
}

impl<LineId: Copy> LineLocation<LineId> {
    /// Total length of the lines covering the location, offsets not applied.
    pub fn path_length<R>(&self, map: &R) -> Result<Length, R::Error>
    where
        R: MapReader<LineId = LineId>,
    {
        let mut length = Length::ZERO;
        for &line in &self.path {
            length += map.line_length(line)?;
        }
        Ok(length)
    }

    /// Removes the leading and trailing lines fully consumed by the offsets
    /// and adjusts the remaining offsets accordingly.
    ///
    /// The sum of the positive and negative offset cannot be greater than
    /// the total length of the location lines, otherwise the whole location
    /// would be consumed and [`DecodeError::InvalidOffsets`] is returned.
    pub fn trim<R>(mut self, map: &R) -> Result<Self, DecodeError<R::Error>>
    where
        R: MapReader<LineId = LineId>,
    {
        let total = self.path_length(map)?;

        if self.pos_offset + self.neg_offset >= total {
            return Err(DecodeError::InvalidOffsets {
                pos: self.pos_offset,
                neg: self.neg_offset,
            });
        }

        let mut consumed = 0;
        for &line in &self.path {
            let length = map.line_length(line)?;
            if self.pos_offset < length {
                break;
            }
            self.pos_offset -= length;
            consumed += 1;
        }
        self.path.drain(..consumed);

        let mut consumed = 0;
        for &line in self.path.iter().rev() {
            let length = map.line_length(line)?;
            if self.neg_offset < length {
                break;
            }
            self.neg_offset -= length;
            consumed += 1;
        }
        self.path.drain(self.path.len() - consumed..);

        debug_assert!(!self.path.is_empty());
        Ok(self)
    }
}

/// Returns true only if all the lines of the path are sequentially connected
/// in the map.
pub fn is_path_connected<R: MapReader>(map: &R, path: &[R::LineId]) -> Result<bool, R::Error> {
    for window in path.windows(2) {
        if map.line_end_node(window[0])? != map.line_start_node(window[1])? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Walks the path and returns the line holding the point at `target` meters
/// from the path start, together with the distance from that line's start.
/// The target is clamped into the path; `None` only for an empty path.
pub(crate) fn point_along_path<R: MapReader>(
    map: &R,
    path: &[R::LineId],
    target: Length,
) -> Result<Option<(R::LineId, Length)>, R::Error> {
    let mut walked = Length::ZERO;
    let mut last = None;

    for &line in path {
        let length = map.line_length(line)?;
        if walked + length >= target {
            return Ok(Some((line, (target - walked).max(Length::ZERO))));
        }
        walked += length;
        last = Some((line, length));
    }

    Ok(last)
}
