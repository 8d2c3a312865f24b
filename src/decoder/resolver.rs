use std::fmt::Debug;

use tracing::{debug, trace};

use crate::decoder::candidates::{Candidate, CandidateLines};
use crate::decoder::shortest_path::shortest_path;
use crate::observer::DecodeObserver;
use crate::{DecodeError, DecoderConfig, Length, MapReader, Offsets, PathAttributes};

/// Resolved sub-path between two subsequent location reference points.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Route<LineId> {
    /// Full lines traversed by the sub-path, the start candidate line first.
    /// The end candidate line is omitted when the sub-path terminates on its
    /// start node.
    pub lines: Vec<LineId>,
    /// Length of the sub-path measured between the two projection points.
    pub length: Length,
    pub start: Candidate<LineId>,
    pub end: Candidate<LineId>,
}

/// Ordered sub-paths covering the whole location reference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Routes<LineId>(pub Vec<Route<LineId>>);

/// Determines a route between every pair of subsequent location reference
/// points, searching depth-first through the ranked candidate combinations.
///
/// The cursor of the pair's second point advances first, so all candidates
/// for the tail are tried before stepping back to the previous point. When a
/// pair exhausts its tail candidates the resolver backtracks: the shared
/// cursor advances and the previous pair is re-routed, since changing the
/// shared candidate invalidates its route as well. Exhausting the first
/// point's candidates fails the decode.
pub(crate) fn resolve_routes<R, O>(
    config: &DecoderConfig,
    map: &R,
    candidates: &[CandidateLines<R::LineId>],
    observer: &mut O,
) -> Result<Routes<R::LineId>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    debug_assert!(candidates.len() >= 2);

    let pairs = candidates.len() - 1;
    let mut cursors = vec![0_usize; candidates.len()];
    let mut routes: Vec<Option<Route<R::LineId>>> = vec![None; pairs];
    let mut pair = 0_usize;

    loop {
        let start = candidates[pair].candidates[cursors[pair]];
        let end = candidates[pair + 1].candidates[cursors[pair + 1]];
        observer.candidates_selected(pair, &start, &end);

        if let Some(route) = route_pair(config, map, pair, &candidates[pair].lrp.path, start, end, observer)? {
            routes[pair] = Some(route);
            pair += 1;

            if pair == pairs {
                let routes = routes.into_iter().flatten().collect();
                return Ok(Routes(routes));
            }
            continue;
        }

        // the selected combination failed: try the next candidate for the
        // second point of the pair, backtracking on exhaustion
        cursors[pair + 1] += 1;

        while cursors[pair + 1] >= candidates[pair + 1].candidates.len() {
            cursors[pair + 1] = 0;
            observer.backtracked(pair);
            debug!("Backtracking from pair {pair}");

            if pair == 0 {
                cursors[0] += 1;
                if cursors[0] >= candidates[0].candidates.len() {
                    return Err(DecodeError::NoMatch);
                }
                break;
            }

            pair -= 1;
            cursors[pair + 1] += 1;
        }
    }
}

/// Routes a single candidate pair and verifies the resulting length against
/// the distance to next point. Returns `None` when the pair cannot produce
/// an acceptable sub-path, which makes the resolver try the next candidate
/// combination.
fn route_pair<R, O>(
    config: &DecoderConfig,
    map: &R,
    pair: usize,
    path: &Option<PathAttributes>,
    start: Candidate<R::LineId>,
    end: Candidate<R::LineId>,
    observer: &mut O,
) -> Result<Option<Route<R::LineId>>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    let Some(PathAttributes { lfrcnp, dnp }) = *path else {
        return Err(DecodeError::InvalidReference(
            "location reference point without path attributes",
        ));
    };

    trace!("Routing pair {pair}: {start:?} -> {end:?}");

    let route = if start.line == end.line {
        if end.offset < start.offset {
            // candidates projected against the line direction cannot form a
            // forward sub-path
            trace!("Rejecting pair {pair}: same line projections in reverse order");
            observer.route_not_found(pair);
            return Ok(None);
        }

        Route {
            lines: vec![start.line],
            length: end.offset - start.offset,
            start,
            end,
        }
    } else {
        let origin = map.line_end_node(start.line)?;
        let destination = map.line_start_node(end.line)?;
        let frc_ceiling = config.frc_ceiling(lfrcnp);
        let max_length = dnp + config.dnp_tolerance(dnp);

        let Some(interior) = shortest_path(map, origin, destination, frc_ceiling, max_length)?
        else {
            trace!("No route for pair {pair}");
            observer.route_not_found(pair);
            return Ok(None);
        };

        let length = (map.line_length(start.line)? - start.offset) + interior.length + end.offset;

        let mut lines = Vec::with_capacity(interior.lines.len() + 2);
        lines.push(start.line);
        lines.extend(interior.lines);
        if !end.offset.is_zero() {
            lines.push(end.line);
        }

        Route {
            lines,
            length,
            start,
            end,
        }
    };

    let deviation = (route.length - dnp).abs();
    if deviation > config.dnp_tolerance(dnp) {
        debug!("Rejecting pair {pair}: length {} vs dnp {dnp}", route.length);
        observer.length_mismatch(pair, dnp, route.length);
        return Ok(None);
    }

    debug!("Route for pair {pair}: {:?} ({})", route.lines, route.length);
    observer.route_found(pair, &route.lines, route.length);
    Ok(Some(route))
}

impl<LineId: Debug + Copy + PartialEq> Routes<LineId> {
    /// Concatenates the sub-paths into a single line sequence, collapsing
    /// the line shared by two subsequent sub-paths joining mid-line.
    pub fn concatenate(&self) -> Vec<LineId> {
        let mut path: Vec<LineId> = vec![];

        for route in &self.0 {
            let mut lines = route.lines.iter().copied();
            if let (Some(last), Some(first)) = (path.last(), route.lines.first())
                && last == first
            {
                lines.next();
            }
            path.extend(lines);
        }

        debug_assert!(path.windows(2).all(|w| w[0] != w[1]));
        path
    }

    /// Gets the positive and negative offsets in meters, combining the
    /// offsets of the reference (fractions of the first/last sub-path) with
    /// the projection distances of the first and last candidates.
    pub fn offsets<R>(&self, map: &R, offsets: Offsets) -> Result<(Length, Length), R::Error>
    where
        R: MapReader<LineId = LineId>,
    {
        let (Some(first), Some(last)) = (self.0.first(), self.0.last()) else {
            return Ok((Length::ZERO, Length::ZERO));
        };

        let distance_from_start = first.start.offset;
        let distance_to_end = if last.end.offset.is_zero() {
            Length::ZERO
        } else {
            map.line_length(last.end.line)? - last.end.offset
        };

        let pos_offset = offsets.pos.along(first.length) + distance_from_start;
        let neg_offset = offsets.neg.along(last.length) + distance_to_end;

        Ok((pos_offset, neg_offset))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::decoder::candidates::find_candidates;
    use crate::map::tests::BERLIN_MAP;
    use crate::observer::NoOpObserver;
    use crate::{
        Bearing, Coordinate, Fow, Frc, LineAttributes, LocationReferencePoint, Offset, Score,
    };

    fn lrp(lon: f64, lat: f64, bearing: u16, path: Option<(Frc, f64)>) -> LocationReferencePoint {
        LocationReferencePoint {
            coordinate: Coordinate { lon, lat },
            line: LineAttributes {
                frc: Frc::Frc3,
                fow: Fow::SingleCarriageway,
                bearing: Bearing::from_degrees(bearing),
            },
            path: path.map(|(lfrcnp, dnp)| PathAttributes {
                lfrcnp,
                dnp: Length::from_meters(dnp),
            }),
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        backtracks: usize,
        route_failures: usize,
        length_mismatches: usize,
        routes_found: usize,
    }

    impl<LineId> DecodeObserver<LineId> for Recorder {
        fn route_found(&mut self, _pair: usize, _path: &[LineId], _length: Length) {
            self.routes_found += 1;
        }
        fn route_not_found(&mut self, _pair: usize) {
            self.route_failures += 1;
        }
        fn length_mismatch(&mut self, _pair: usize, _expected: Length, _actual: Length) {
            self.length_mismatches += 1;
        }
        fn backtracked(&mut self, _pair: usize) {
            self.backtracks += 1;
        }
    }

    fn resolve(
        config: &DecoderConfig,
        points: &[LocationReferencePoint],
        observer: &mut impl DecodeObserver<i64>,
    ) -> Result<Routes<i64>, DecodeError<std::convert::Infallible>> {
        let map = &*BERLIN_MAP;
        let candidates = find_candidates(config, map, points)?;
        resolve_routes(config, map, &candidates, observer)
    }

    #[test]
    fn resolves_a_single_line_pair() {
        let config = DecoderConfig::default();

        let points = [
            lrp(13.4100, 52.5230, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4160, 52.5250, 241, None),
        ];

        let routes = resolve(&config, &points, &mut NoOpObserver).unwrap();
        assert_eq!(routes.0.len(), 1);
        assert_eq!(routes.0[0].lines, [101]);
        assert!((routes.0[0].length.meters() - 464.0).abs() < 2.0);
    }

    #[test]
    fn falls_back_to_the_second_candidate_when_routing_fails() {
        let config = DecoderConfig::default();

        // closest to the parallel one-way street 201, which leads nowhere
        let points = [
            lrp(13.4102, 52.5224, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4160, 52.5250, 241, None),
        ];

        let mut recorder = Recorder::default();
        let routes = resolve(&config, &points, &mut recorder).unwrap();

        assert_eq!(routes.0[0].lines, [101]);
        assert_eq!(recorder.backtracks, 1);
        assert!(recorder.route_failures >= 1);
    }

    #[test]
    fn lowest_frc_filter_forces_a_detour() {
        let config = DecoderConfig::default();

        let points = [
            lrp(13.4040, 52.5200, 90, Some((Frc::Frc3, 1444.0))),
            lrp(13.4220, 52.5200, 270, None),
        ];

        let routes = resolve(&config, &points, &mut NoOpObserver).unwrap();
        assert_eq!(routes.0[0].lines, [300, 302, 303, 304, 305]);
        assert!(!routes.0[0].lines.contains(&301));
        assert!((routes.0[0].length.meters() - 1444.0).abs() < 5.0);
    }

    #[test]
    fn wrong_direction_pairings_are_rejected() {
        let config = DecoderConfig::default();

        // both points project onto line 101, the second one before the first
        let points = [
            lrp(13.413880, 52.524293, 61, Some((Frc::Frc3, 200.0))),
            lrp(13.411293, 52.523431, 241, None),
        ];

        let mut recorder = Recorder::default();
        let routes = resolve(&config, &points, &mut recorder).unwrap();

        // the only forward sub-path of the right length runs on the
        // opposing carriageway
        assert_eq!(routes.0[0].lines, [-101]);
        assert!((routes.0[0].length.meters() - 200.0).abs() < 5.0);
        assert!(recorder.route_failures >= 1);
        assert_eq!(recorder.backtracks, 1);
    }

    #[test]
    fn exhausted_candidates_fail_with_no_match() {
        let config = DecoderConfig::default();

        // the southern corridor cannot be reached from the northern streets
        let points = [
            lrp(13.4100, 52.5230, 61, Some((Frc::Frc3, 500.0))),
            lrp(13.4160, 52.5190, 270, None),
        ];

        let mut recorder = Recorder::default();
        let error = resolve(&config, &points, &mut recorder).unwrap_err();

        assert_eq!(error, DecodeError::NoMatch);
        assert!(recorder.backtracks >= 1);
        assert_eq!(recorder.routes_found, 0);
    }

    #[test]
    fn resolves_subsequent_pairs_through_the_shared_candidate() {
        let config = DecoderConfig::default();

        let points = [
            lrp(13.4100, 52.5230, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4160, 52.5250, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4220, 52.5270, 241, None),
        ];

        let routes = resolve(&config, &points, &mut NoOpObserver).unwrap();
        assert_eq!(routes.0.len(), 2);
        assert_eq!(routes.concatenate(), [101, 102]);
    }

    #[test]
    fn concatenation_collapses_the_line_shared_at_a_join() {
        let candidate = |line, offset| Candidate {
            line,
            offset: Length::from_meters(offset),
            coordinate: Coordinate::default(),
            score: Score::from(1.0),
        };

        // both sub-paths contain line 2: the join sits in the middle of it
        let routes = Routes(vec![
            Route {
                lines: vec![1, 2],
                length: Length::from_meters(100.0),
                start: candidate(1, 0.0),
                end: candidate(2, 50.0),
            },
            Route {
                lines: vec![2, 3],
                length: Length::from_meters(100.0),
                start: candidate(2, 50.0),
                end: candidate(3, 30.0),
            },
        ]);

        assert_eq!(routes.concatenate(), [1, 2, 3]);
    }

    #[test]
    fn offsets_combine_fractions_and_projections() {
        let config = DecoderConfig::default();
        let map = &*BERLIN_MAP;

        let points = [
            lrp(13.4100, 52.5230, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4160, 52.5250, 61, Some((Frc::Frc3, 464.0))),
            lrp(13.4220, 52.5270, 241, None),
        ];

        let routes = resolve(&config, &points, &mut NoOpObserver).unwrap();

        let offsets = Offsets {
            pos: Offset::from_fraction(0.25),
            neg: Offset::from_fraction(0.25),
        };
        let (pos, neg) = routes.offsets(map, offsets).unwrap();

        assert!((pos.meters() - 116.0).abs() < 2.0, "pos = {pos}");
        assert!((neg.meters() - 116.0).abs() < 2.0, "neg = {neg}");

        let (pos, neg) = routes.offsets(map, Offsets::default()).unwrap();
        assert_eq!(pos, Length::ZERO);
        assert_eq!(neg, Length::ZERO);
    }
}
