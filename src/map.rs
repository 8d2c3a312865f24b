use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash;

use crate::{Coordinate, Fow, Frc, Length};

/// Boundary between the decoder and the target map.
///
/// Exposes the behavior of a geospatial index and of a directed road network
/// graph. Lines are directed; a two-way road appears as two opposing lines.
/// The decoder only reads from the map and may query it many times per
/// decode, so implementations should be cheap to call or cache internally.
/// Every reader failure aborts the running decode without retry.
///
/// Degenerate zero-length lines should not be surfaced by implementations.
pub trait MapReader {
    /// Custom error associated type.
    type Error: Error;
    /// Uniquely identifies a directed line of the map.
    type LineId: Debug + Copy + Eq + Ord + Hash;
    /// Uniquely identifies a node of the map.
    type NodeId: Debug + Copy + Eq + Ord + Hash;

    /// Gets all the lines with any point within `radius` of the coordinate.
    /// Lines must be returned in a deterministic order.
    fn lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> Result<impl Iterator<Item = Self::LineId>, Self::Error>;

    /// Gets the polyline geometry of the line, from its start node to its
    /// end node.
    fn line_geometry(
        &self,
        line: Self::LineId,
    ) -> Result<impl Iterator<Item = Coordinate>, Self::Error>;

    /// Gets the geodesic length of the line.
    fn line_length(&self, line: Self::LineId) -> Result<Length, Self::Error>;

    /// Gets the Functional Road Class (FRC) of the line.
    fn line_frc(&self, line: Self::LineId) -> Result<Frc, Self::Error>;

    /// Gets the Form of Way (FOW) of the line.
    fn line_fow(&self, line: Self::LineId) -> Result<Fow, Self::Error>;

    /// Gets the node the line starts from.
    fn line_start_node(&self, line: Self::LineId) -> Result<Self::NodeId, Self::Error>;

    /// Gets the node the line ends into.
    fn line_end_node(&self, line: Self::LineId) -> Result<Self::NodeId, Self::Error>;

    /// Gets the node coordinate.
    fn node_coordinate(&self, node: Self::NodeId) -> Result<Coordinate, Self::Error>;

    /// Gets an iterator over all the lines leaving the node.
    fn outgoing_lines(
        &self,
        node: Self::NodeId,
    ) -> Result<impl Iterator<Item = Self::LineId>, Self::Error>;

    /// Gets an iterator over all the lines entering the node.
    fn incoming_lines(
        &self,
        node: Self::NodeId,
    ) -> Result<impl Iterator<Item = Self::LineId>, Self::Error>;
}
