use strum::EnumCount;
use tracing::trace;

use crate::{Bearing, DecoderConfig, Fow, Frc, Length, LineAttributes, Score};

/// Rating that one form of way gets when standing in for another.
///
/// Identical forms rate 1.0, except that an undefined form cannot confirm
/// anything and always rates 0.5 (its own diagonal included). Forms that are
/// physically compatible stand-ins for each other (motorway for multiple
/// carriageway, multiple for single carriageway, single carriageway for
/// roundabouts and traffic squares) rate 0.8; every other combination rates
/// 0.5. The table is symmetric and indexed `[wanted][actual]`.
pub const FOW_RATING: [[f64; Fow::COUNT]; Fow::COUNT] = [
    // Undefined, Motorway, Multiple, Single, Roundabout, TrafficSquare, SlipRoad, Other
    [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5], // Undefined
    [0.5, 1.0, 0.8, 0.5, 0.5, 0.5, 0.5, 0.5], // Motorway
    [0.5, 0.8, 1.0, 0.8, 0.5, 0.5, 0.5, 0.5], // MultipleCarriageway
    [0.5, 0.5, 0.8, 1.0, 0.8, 0.8, 0.5, 0.5], // SingleCarriageway
    [0.5, 0.5, 0.5, 0.8, 1.0, 0.5, 0.5, 0.5], // Roundabout
    [0.5, 0.5, 0.5, 0.8, 0.5, 1.0, 0.5, 0.5], // TrafficSquare
    [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 1.0, 0.5], // SlipRoad
    [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 1.0], // Other
];

/// Candidate line attributes to be rated against a location reference point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RatedAttributes {
    pub frc: Frc,
    pub fow: Fow,
    /// Bearing of the relevant line section; `None` for degenerate geometry.
    pub bearing: Option<Bearing>,
    /// Straight line distance from the location reference point to the
    /// candidate (projection point or promoted node).
    pub distance: Length,
}

/// How close the candidate is to the location reference point coordinate,
/// relative to the search radius.
fn geographic_rating(distance: Length, radius: Length) -> f64 {
    1.0 - distance.min(radius).meters() / radius.meters()
}

/// How well the functional road class matches, degrading linearly over the
/// eight classes.
fn frc_rating(wanted: Frc, actual: Frc) -> f64 {
    let difference = (wanted as u8).abs_diff(actual as u8);
    (1.0 - f64::from(difference) / 8.0).max(0.0)
}

fn fow_rating(wanted: Fow, actual: Fow) -> f64 {
    FOW_RATING[wanted as usize][actual as usize]
}

/// How well the bearings align, 1.0 for identical angles and 0.0 for
/// opposite directions.
fn bearing_rating(wanted: Bearing, actual: Option<Bearing>) -> f64 {
    actual.map_or(0.0, |bearing| {
        1.0 - f64::from(bearing.difference(&wanted)) / 180.0
    })
}

/// Rates a candidate line against the attributes of a location reference
/// point, combining the four sub-ratings into a weighted score in `[0, 1]`.
/// A weight configuration summing to zero falls back to equal weights.
pub(crate) fn rate_candidate(
    config: &DecoderConfig,
    wanted: &LineAttributes,
    candidate: RatedAttributes,
) -> Score {
    let geo = geographic_rating(candidate.distance, config.search_radius);
    let frc = frc_rating(wanted.frc, candidate.frc);
    let fow = fow_rating(wanted.fow, candidate.fow);
    let bearing = bearing_rating(wanted.bearing, candidate.bearing);

    let weight_sum =
        config.geo_weight + config.frc_weight + config.fow_weight + config.bear_weight;

    let score = if weight_sum > 0.0 {
        (config.geo_weight * geo
            + config.frc_weight * frc
            + config.fow_weight * fow
            + config.bear_weight * bearing)
            / weight_sum
    } else {
        (geo + frc + fow + bearing) / 4.0
    };

    trace!("Rated {candidate:?}: geo={geo:.3} frc={frc:.3} fow={fow:.3} bear={bearing:.3} = {score:.3}");
    debug_assert!((0.0..=1.0).contains(&score));

    Score::from(score)
}
