use std::fmt::Debug;

use tracing::{debug, trace};

use crate::decoder::rating::{RatedAttributes, rate_candidate};
use crate::{
    Coordinate, DecodeError, DecoderConfig, Length, LocationReferencePoint, MapReader, Score, geo,
};

/// Projection offsets closer than this to a line endpoint are snapped onto
/// the endpoint, so a location reference point sitting on a node never
/// produces a zero-length line fragment.
const ENDPOINT_SNAP: Length = Length::from_meters(1.0);

/// The projection of a location reference point onto a line of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<LineId> {
    pub line: LineId,
    /// Distance from the line start node to the projection, following the
    /// line geometry. Zero for candidates sitting on the start node.
    pub offset: Length,
    /// The projected coordinate on the line.
    pub coordinate: Coordinate,
    pub score: Score,
}

/// Ranked candidates of one location reference point, best score first.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLines<LineId> {
    pub lrp: LocationReferencePoint,
    pub candidates: Vec<Candidate<LineId>>,
}

/// Generates the ranked candidate list for every location reference point of
/// the reference. Fails with [`DecodeError::NoCandidates`] as soon as one
/// point has no acceptable candidate, since no routing can succeed then.
pub fn find_candidates<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    points: &[LocationReferencePoint],
) -> Result<Vec<CandidateLines<R::LineId>>, DecodeError<R::Error>> {
    let mut all = Vec::with_capacity(points.len());

    for (index, lrp) in points.iter().enumerate() {
        let is_last = index + 1 == points.len();
        let candidates = find_lrp_candidates(config, map, lrp, is_last)?;

        if candidates.is_empty() {
            return Err(DecodeError::NoCandidates(index));
        }

        all.push(CandidateLines {
            lrp: *lrp,
            candidates,
        });
    }

    Ok(all)
}

/// Each location reference point is projected onto all the lines close to
/// its coordinate. A projection falling onto the terminal node of a line
/// would leave nothing of that line to traverse, so it is replaced by
/// candidates at the start of each line leaving that node. The last point
/// describes the incoming line instead: its candidates keep projections onto
/// line ends and drop projections onto line starts.
fn find_lrp_candidates<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    lrp: &LocationReferencePoint,
    is_last: bool,
) -> Result<Vec<Candidate<R::LineId>>, DecodeError<R::Error>> {
    debug!("Finding candidate lines for {lrp:?} (last: {is_last})");

    let mut candidates: Vec<Candidate<R::LineId>> = vec![];
    let lines: Vec<_> = map
        .lines_close_to(lrp.coordinate, config.search_radius)?
        .collect();

    for line in lines {
        let length = map.line_length(line)?;
        if length.is_zero() {
            trace!("Skipping {line:?}: degenerate geometry");
            continue;
        }

        let geometry: Vec<Coordinate> = map.line_geometry(line)?.collect();
        let Some(projection) = geo::project(&geometry, lrp.coordinate) else {
            continue;
        };

        if projection.distance_to_point > config.search_radius {
            trace!("Skipping {line:?}: projection out of search radius");
            continue;
        }

        let offset = snap_to_endpoints(projection.distance_along.min(length), length);

        if is_last {
            if offset.is_zero() {
                // nothing of this line would be traversed before the location end
                trace!("Skipping {line:?}: projection at line start of last point");
                continue;
            }

            let rated = RatedAttributes {
                frc: map.line_frc(line)?,
                fow: map.line_fow(line)?,
                bearing: geo::segment_bearing(&geometry, offset, -config.bear_dist),
                distance: projection.distance_to_point,
            };

            push_candidate(
                &mut candidates,
                config.min_score,
                Candidate {
                    line,
                    offset,
                    coordinate: projection.coordinate,
                    score: rate_candidate(config, &lrp.line, rated),
                },
            );
        } else if offset == length {
            append_outgoing_candidates(config, map, lrp, line, &mut candidates)?;
        } else {
            let rated = RatedAttributes {
                frc: map.line_frc(line)?,
                fow: map.line_fow(line)?,
                bearing: geo::segment_bearing(&geometry, offset, config.bear_dist),
                distance: projection.distance_to_point,
            };

            push_candidate(
                &mut candidates,
                config.min_score,
                Candidate {
                    line,
                    offset,
                    coordinate: projection.coordinate,
                    score: rate_candidate(config, &lrp.line, rated),
                },
            );
        }
    }

    candidates.sort_unstable_by(|a, b| b.score.cmp(&a.score).then_with(|| a.line.cmp(&b.line)));
    Ok(candidates)
}

/// Emits one candidate at the start of every line leaving the terminal node
/// a projection landed on.
fn append_outgoing_candidates<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    lrp: &LocationReferencePoint,
    line: R::LineId,
    candidates: &mut Vec<Candidate<R::LineId>>,
) -> Result<(), DecodeError<R::Error>> {
    let node = map.line_end_node(line)?;
    let node_coordinate = map.node_coordinate(node)?;
    let distance = geo::distance(lrp.coordinate, node_coordinate);

    trace!("Promoting projection on {line:?} to the lines leaving {node:?}");

    let outgoing: Vec<_> = map.outgoing_lines(node)?.collect();
    for outgoing_line in outgoing {
        if map.line_length(outgoing_line)?.is_zero() {
            continue;
        }

        let geometry: Vec<Coordinate> = map.line_geometry(outgoing_line)?.collect();

        let rated = RatedAttributes {
            frc: map.line_frc(outgoing_line)?,
            fow: map.line_fow(outgoing_line)?,
            bearing: geo::segment_bearing(&geometry, Length::ZERO, config.bear_dist),
            distance,
        };

        push_candidate(
            candidates,
            config.min_score,
            Candidate {
                line: outgoing_line,
                offset: Length::ZERO,
                coordinate: node_coordinate,
                score: rate_candidate(config, &lrp.line, rated),
            },
        );
    }

    Ok(())
}

/// Keeps at most one candidate per line, preferring the higher score when a
/// projection and an endpoint promotion produce the same line.
fn push_candidate<LineId: Debug + Copy + PartialEq>(
    candidates: &mut Vec<Candidate<LineId>>,
    min_score: Score,
    candidate: Candidate<LineId>,
) {
    if candidate.score < min_score {
        trace!("Discarding {candidate:?}: score below minimum");
        return;
    }

    if let Some(existing) = candidates.iter_mut().find(|c| c.line == candidate.line) {
        if existing.score < candidate.score {
            debug!("Overriding candidate line with {candidate:?}");
            *existing = candidate;
        } else {
            trace!("Discarding {candidate:?}: already present with better score");
        }
    } else {
        debug!("Accepted candidate: {candidate:?}");
        candidates.push(candidate);
    }
}

fn snap_to_endpoints(offset: Length, length: Length) -> Length {
    if offset < ENDPOINT_SNAP {
        Length::ZERO
    } else if length - offset < ENDPOINT_SNAP {
        length
    } else {
        offset
    }
}
