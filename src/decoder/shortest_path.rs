use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{Frc, Length, MapReader};

/// Shortest connected path between two nodes of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath<LineId> {
    pub length: Length,
    pub lines: Vec<LineId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapElement<NodeId> {
    /// Current shortest distance from the origin to this node.
    distance: Length,
    node: NodeId,
}

// The priority queue depends on the implementation of the Ord trait.
// By default std::BinaryHeap is a max heap.
// Explicitly implement the trait so the queue becomes a min heap.
impl<NodeId: Ord> Ord for HeapElement<NodeId> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            // breaking ties in a deterministic way
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<NodeId: Ord> PartialOrd for HeapElement<NodeId> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra between two nodes over the directed lines of the map.
///
/// Only lines with a functional road class at least as important as
/// `frc_ceiling` may be traversed, and the search gives up beyond
/// `max_length`. Lines are relaxed in ascending id order so equal-length
/// paths resolve to the lexicographically smallest line sequence.
pub(crate) fn shortest_path<R: MapReader>(
    map: &R,
    origin: R::NodeId,
    destination: R::NodeId,
    frc_ceiling: Frc,
    max_length: Length,
) -> Result<Option<ShortestPath<R::LineId>>, R::Error> {
    debug!("Computing shortest path {origin:?} -> {destination:?} (frc <= {frc_ceiling:?})");

    // (current) shortest distance from origin to this node
    let mut shortest_distances = FxHashMap::from_iter([(origin, Length::ZERO)]);

    // line and node (value) preceding this node (key) on the current best
    // known path from the origin
    let mut previous: FxHashMap<R::NodeId, (R::LineId, R::NodeId)> = FxHashMap::default();

    // priority queue of discovered nodes that may need to be visited
    let mut frontier = BinaryHeap::from([HeapElement {
        distance: Length::ZERO,
        node: origin,
    }]);

    while let Some(element) = frontier.pop() {
        if element.node == destination {
            // unpacking: walk the path from the destination back to the origin
            let mut lines = vec![];
            let mut next = destination;
            while let Some(&(line, node)) = previous.get(&next) {
                next = node;
                lines.push(line);
            }
            lines.reverse();

            return Ok(Some(ShortestPath {
                length: element.distance,
                lines,
            }));
        }

        // check if we already know a cheaper way to reach this node
        let shortest_distance = *shortest_distances.get(&element.node).unwrap_or(&Length::MAX);
        if element.distance > shortest_distance {
            continue;
        }

        let mut outgoing: Vec<_> = map.outgoing_lines(element.node)?.collect();
        outgoing.sort_unstable();

        for line in outgoing {
            if map.line_frc(line)? > frc_ceiling {
                continue;
            }

            let distance = element.distance + map.line_length(line)?;
            if distance > max_length {
                continue;
            }

            let node = map.line_end_node(line)?;
            let shortest_distance = *shortest_distances.get(&node).unwrap_or(&Length::MAX);

            // check if we can follow the current line to reach the neighbor
            // in a cheaper way
            if distance < shortest_distance {
                // relax: we have now found a better way that we are going to explore
                shortest_distances.insert(node, distance);
                previous.insert(node, (line, element.node));
                frontier.push(HeapElement { distance, node });
            }
        }
    }

    Ok(None)
}
