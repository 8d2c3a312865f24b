//! The decoder resolves a (map-dependent) location reference using its own
//! map. This map might differ from the one used during encoding.
//!
//! 1. For each location reference point find candidate lines by projection.
//! 2. Rate candidate lines for each location reference point.
//! 3. Determine shortest-path(s) between two subsequent location reference
//!    points, backtracking over ranked candidate combinations.
//! 4. Check validity of the calculated shortest-path(s) against the distance
//!    to next point.
//! 5. Concatenate shortest-path(s) to form the location and trim the path
//!    according to the offsets.

pub mod candidates;
pub mod rating;
mod resolver;
mod shortest_path;

use tracing::debug;

use crate::decoder::candidates::find_candidates;
use crate::decoder::resolver::resolve_routes;
use crate::location::{is_path_connected, point_along_path};
use crate::observer::{DecodeObserver, NoOpObserver};
use crate::{
    Coordinate, DecodeError, Frc, Length, LineLocation, LineReference, LocationReferencePoint,
    MapReader, Offsets, PoiLocation, PoiReference, PointAlongLineLocation,
    PointAlongLineReference, Score, geo,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Radius around each location reference point in which candidate lines
    /// are looked up.
    pub search_radius: Length,
    /// Weight of the geographic distance rating.
    pub geo_weight: f64,
    /// Weight of the functional road class rating.
    pub frc_weight: f64,
    /// Weight of the form of way rating.
    pub fow_weight: f64,
    /// Weight of the bearing rating.
    pub bear_weight: f64,
    /// Minimum score for a line to be accepted as candidate.
    pub min_score: Score,
    /// Permitted deviation from the distance to next point, as a fraction
    /// of that distance.
    pub max_dnp_deviation_rel: f64,
    /// Permitted absolute deviation from the distance to next point.
    pub max_dnp_deviation_abs: Length,
    /// Length of the line section over which bearings are measured.
    pub bear_dist: Length,
    /// Slack added to the lowest FRC routing ceiling, indexed by the LFRCNP
    /// value. Accounts for functional road class drift between the encoder
    /// map and this map.
    pub tolerated_lfrc: [u8; 8],
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            search_radius: Length::from_meters(100.0),
            geo_weight: 0.25,
            frc_weight: 0.25,
            fow_weight: 0.25,
            bear_weight: 0.25,
            min_score: Score::from(0.3),
            max_dnp_deviation_rel: 0.1,
            max_dnp_deviation_abs: Length::from_meters(20.0),
            bear_dist: Length::from_meters(20.0),
            tolerated_lfrc: [1; 8],
        }
    }
}

impl DecoderConfig {
    /// Permitted deviation between a resolved route length and the distance
    /// to next point it covers.
    pub(crate) fn dnp_tolerance(&self, dnp: Length) -> Length {
        self.max_dnp_deviation_abs.max(dnp * self.max_dnp_deviation_rel)
    }

    /// Least important functional road class the router may traverse between
    /// two location reference points.
    pub(crate) fn frc_ceiling(&self, lfrcnp: Frc) -> Frc {
        lfrcnp.relaxed_by(self.tolerated_lfrc[lfrcnp as usize])
    }
}

/// Resolves a line location reference against the map.
pub fn decode_line<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    reference: &LineReference,
) -> Result<LineLocation<R::LineId>, DecodeError<R::Error>> {
    decode_line_with_observer(config, map, reference, &mut NoOpObserver)
}

/// Resolves a line location reference, notifying the observer of every
/// decode event.
pub fn decode_line_with_observer<R, O>(
    config: &DecoderConfig,
    map: &R,
    reference: &LineReference,
    observer: &mut O,
) -> Result<LineLocation<R::LineId>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    ensure_offset_is_valid(reference.offsets.pos.fraction())?;
    ensure_offset_is_valid(reference.offsets.neg.fraction())?;

    let location = decode_line_location(config, map, reference, observer)?;
    observer.decode_finished();
    Ok(location)
}

/// Resolves a point along line location reference against the map.
pub fn decode_point_along_line<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    reference: &PointAlongLineReference,
) -> Result<PointAlongLineLocation<R::LineId>, DecodeError<R::Error>> {
    decode_point_along_line_with_observer(config, map, reference, &mut NoOpObserver)
}

/// Resolves a point along line location reference, notifying the observer of
/// every decode event.
///
/// The underlying line location is resolved first; the point is the position
/// at the offset fraction of the path between the two location reference
/// points.
pub fn decode_point_along_line_with_observer<R, O>(
    config: &DecoderConfig,
    map: &R,
    reference: &PointAlongLineReference,
    observer: &mut O,
) -> Result<PointAlongLineLocation<R::LineId>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    let fraction = reference.offset.fraction();
    if !(0.0..=1.0).contains(&fraction) {
        return Err(DecodeError::InvalidReference("offset outside [0, 1]"));
    }

    // points do not trim: the reference offset locates the point instead
    let line_reference = LineReference {
        points: reference.points.to_vec(),
        offsets: Offsets::default(),
    };
    let location = decode_line_location(config, map, &line_reference, observer)?;

    let length = location.path_length(map)? - location.pos_offset - location.neg_offset;
    let target = location.pos_offset + length * fraction;

    let Some((line, offset)) = point_along_path(map, &location.path, target)? else {
        return Err(DecodeError::NoMatch);
    };

    let geometry: Vec<Coordinate> = map.line_geometry(line)?.collect();
    let coordinate = geo::interpolate(&geometry, offset).ok_or(DecodeError::NoMatch)?;

    observer.decode_finished();

    Ok(PointAlongLineLocation {
        line,
        offset,
        coordinate,
        orientation: reference.orientation,
        side: reference.side,
    })
}

/// Resolves a POI with access point location reference against the map.
pub fn decode_poi_with_access_point<R: MapReader>(
    config: &DecoderConfig,
    map: &R,
    reference: &PoiReference,
) -> Result<PoiLocation<R::LineId>, DecodeError<R::Error>> {
    decode_poi_with_access_point_with_observer(config, map, reference, &mut NoOpObserver)
}

/// Resolves a POI with access point location reference, notifying the
/// observer of every decode event. The POI coordinate is passed through
/// unchanged next to the resolved access point.
pub fn decode_poi_with_access_point_with_observer<R, O>(
    config: &DecoderConfig,
    map: &R,
    reference: &PoiReference,
    observer: &mut O,
) -> Result<PoiLocation<R::LineId>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    let point = decode_point_along_line_with_observer(config, map, &reference.point, observer)?;

    Ok(PoiLocation {
        point,
        poi: reference.poi,
    })
}

fn decode_line_location<R, O>(
    config: &DecoderConfig,
    map: &R,
    reference: &LineReference,
    observer: &mut O,
) -> Result<LineLocation<R::LineId>, DecodeError<R::Error>>
where
    R: MapReader,
    O: DecodeObserver<R::LineId>,
{
    ensure_points_are_valid(&reference.points)?;
    debug!("Decoding {reference:?} with {config:?}");

    let candidates = find_candidates(config, map, &reference.points)?;
    debug_assert_eq!(candidates.len(), reference.points.len());

    for (index, lines) in candidates.iter().enumerate() {
        observer.candidates_found(index, &lines.candidates);
    }

    let routes = resolve_routes(config, map, &candidates, observer)?;
    let (pos_offset, neg_offset) = routes.offsets(map, reference.offsets)?;

    let location = LineLocation {
        path: routes.concatenate(),
        pos_offset,
        neg_offset,
    }
    .trim(map)?;

    debug_assert!(!location.path.is_empty());
    debug_assert!(matches!(is_path_connected(map, &location.path), Ok(true)));

    Ok(location)
}

fn ensure_points_are_valid<E>(points: &[LocationReferencePoint]) -> Result<(), DecodeError<E>> {
    let Some((last, intermediate)) = points.split_last() else {
        return Err(DecodeError::InvalidReference("no location reference points"));
    };

    if intermediate.is_empty() {
        return Err(DecodeError::InvalidReference(
            "a line needs at least two location reference points",
        ));
    }

    if intermediate.iter().any(|point| point.path.is_none()) {
        return Err(DecodeError::InvalidReference(
            "intermediate point without path attributes",
        ));
    }

    if last.path.is_some() {
        return Err(DecodeError::InvalidReference(
            "last point carries path attributes",
        ));
    }

    Ok(())
}

fn ensure_offset_is_valid<E>(fraction: f64) -> Result<(), DecodeError<E>> {
    if (0.0..1.0).contains(&fraction) {
        Ok(())
    } else {
        Err(DecodeError::InvalidReference("offset outside [0, 1)"))
    }
}
