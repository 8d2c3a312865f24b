//! WGS84 geodesic utilities over polyline geometries.
//!
//! Distances, bearings and interpolation are computed on the ellipsoid
//! (Karney's method); the only spherical primitive is the closest-point
//! projection foot, whose result is then measured geodesically.

use geo::{Bearing as _, Closest, Distance, Geodesic, HaversineClosestPoint, InterpolatePoint, Line, Point};

use crate::{Bearing, Coordinate, Length};

impl From<Coordinate> for Point {
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.lon, coordinate.lat)
    }
}

impl From<Point> for Coordinate {
    fn from(point: Point) -> Self {
        Coordinate {
            lon: point.x(),
            lat: point.y(),
        }
    }
}

/// Geodesic distance between two coordinates.
pub fn distance(a: Coordinate, b: Coordinate) -> Length {
    Length::from_meters(Geodesic.distance(Point::from(a), Point::from(b)))
}

/// Initial geodesic bearing from `a` to `b` in degrees, in `[0, 360)`.
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic.bearing(Point::from(a), Point::from(b)).rem_euclid(360.0)
}

/// Total geodesic length of a polyline.
pub fn path_length(coordinates: &[Coordinate]) -> Length {
    coordinates
        .windows(2)
        .map(|segment| distance(segment[0], segment[1]))
        .sum()
}

/// Coordinate on the polyline at the given distance from its start.
/// The distance is clamped to `[0, length]`; returns `None` for an empty
/// polyline.
pub fn interpolate(coordinates: &[Coordinate], distance_from_start: Length) -> Option<Coordinate> {
    let (&first, rest) = coordinates.split_first()?;

    if distance_from_start <= Length::ZERO {
        return Some(first);
    }

    let mut walked = Length::ZERO;
    let mut previous = first;

    for &coordinate in rest {
        let segment = distance(previous, coordinate);
        if segment.is_zero() {
            continue;
        }

        if walked + segment >= distance_from_start {
            let ratio = (distance_from_start - walked).meters() / segment.meters();
            let point = Geodesic.point_at_ratio_between(
                Point::from(previous),
                Point::from(coordinate),
                ratio,
            );
            return Some(Coordinate::from(point));
        }

        walked += segment;
        previous = coordinate;
    }

    Some(previous)
}

/// The projection of a coordinate onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOnLine {
    /// Distance from the start of the polyline to the projection, following
    /// the polyline.
    pub distance_along: Length,
    /// The projected coordinate on the polyline.
    pub coordinate: Coordinate,
    /// Geodesic distance between the input coordinate and the projection.
    pub distance_to_point: Length,
}

/// Projects a coordinate onto the closest point of the polyline.
/// Returns `None` for polylines with fewer than two coordinates or with
/// degenerate segments.
pub fn project(coordinates: &[Coordinate], coordinate: Coordinate) -> Option<PointOnLine> {
    let point = Point::from(coordinate);

    let mut projection: Option<PointOnLine> = None;
    let mut walked = Length::ZERO;

    for segment in coordinates.windows(2) {
        let [start, end] = [segment[0], segment[1]];
        let line = Line::new(Point::from(start), Point::from(end));

        let closest = match line.haversine_closest_point(&point) {
            Closest::SinglePoint(closest) | Closest::Intersection(closest) => closest,
            Closest::Indeterminate => return None,
        };

        let distance_to_point = Length::from_meters(Geodesic.distance(point, closest));

        if projection.is_none_or(|p| distance_to_point < p.distance_to_point) {
            projection = Some(PointOnLine {
                distance_along: walked + distance(start, Coordinate::from(closest)),
                coordinate: Coordinate::from(closest),
                distance_to_point,
            });
        }

        walked += distance(start, end);
    }

    projection
}

/// Bearing of the sub-section of the polyline that starts at
/// `distance_from_start` and spans `segment_length` meters following the
/// geometry. A negative span measures backwards towards the polyline start.
/// Returns `None` when the section collapses to a single point.
pub fn segment_bearing(
    coordinates: &[Coordinate],
    distance_from_start: Length,
    segment_length: Length,
) -> Option<Bearing> {
    let length = path_length(coordinates);
    let start = distance_from_start.clamp(Length::ZERO, length);
    let end = (start + segment_length).clamp(Length::ZERO, length);

    let a = interpolate(coordinates, start)?;
    let b = interpolate(coordinates, end)?;

    if a == b {
        return None;
    }

    let degrees = bearing(a, b).round() as u16;
    Some(Bearing::from_degrees(degrees))
}
