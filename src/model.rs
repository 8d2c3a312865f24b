use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use approx::abs_diff_eq;
use ordered_float::OrderedFloat;
use strum::{EnumCount, FromRepr};

/// Functional Road Class.
/// The functional road class (FRC) of a line is a road classification
/// based on the importance of the road represented by the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr)]
#[repr(u8)]
pub enum Frc {
    /// Main road, highest importance.
    Frc0 = 0,
    /// First class road.
    Frc1 = 1,
    /// Second class road.
    Frc2 = 2,
    /// Third class road.
    Frc3 = 3,
    /// Fourth class road.
    Frc4 = 4,
    /// Fifth class road.
    Frc5 = 5,
    /// Sixth class road.
    Frc6 = 6,
    /// Other class road, lowest importance.
    Frc7 = 7,
}

impl Default for Frc {
    fn default() -> Self {
        Self::Frc7
    }
}

impl Frc {
    /// Lowers the importance of this class by `slack` steps, saturating at [`Frc::Frc7`].
    pub fn relaxed_by(self, slack: u8) -> Self {
        Self::from_repr((self as u8).saturating_add(slack).min(Frc::Frc7 as u8))
            .unwrap_or(Self::Frc7)
    }
}

/// Form of Way.
/// The form of way (FOW) describes the physical road type of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumCount)]
#[repr(u8)]
pub enum Fow {
    /// The physical road type is unknown.
    Undefined = 0,
    /// A Motorway is defined as a road permitted for motorized vehicles
    /// only in combination with a prescribed minimum speed. It has two
    /// or more physically separated carriageways and no single level-crossings.
    Motorway = 1,
    /// A multiple carriageway is defined as a road with physically separated
    /// carriageways regardless of the number of lanes. If a road is also a
    /// motorway, it should be coded as such and not as a multiple carriageway.
    MultipleCarriageway = 2,
    /// All roads without separate carriageways are considered as roads with
    /// a single carriageway.
    SingleCarriageway = 3,
    /// A Roundabout is a road which forms a ring on which traffic traveling
    /// in only one direction is allowed.
    Roundabout = 4,
    /// A Traffic Square is an open area (partly) enclosed by roads which is
    /// used for non-traffic purposes and which is not a Roundabout.
    TrafficSquare = 5,
    /// A Slip Road is a road especially designed to enter or leave a line.
    SlipRoad = 6,
    /// The physical road type is known but does not fit into one of the
    /// other categories.
    Other = 7,
}

impl Default for Fow {
    fn default() -> Self {
        Self::Other
    }
}

/// The side of road information (SOR) describes the relationship between the
/// point of interest and a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr)]
#[repr(u8)]
pub enum SideOfRoad {
    /// Point is directly on (or above) the road, or determination of right/left
    /// side is not applicable.
    OnRoadOrUnknown = 0,
    /// Point is on right side of the road.
    Right = 1,
    /// Point is on left side of the road.
    Left = 2,
    /// Point is on both sides of the road.
    Both = 3,
}

impl Default for SideOfRoad {
    fn default() -> Self {
        Self::OnRoadOrUnknown
    }
}

/// The orientation information (ORI) describes the relationship between the
/// point of interest and the direction of a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr)]
#[repr(u8)]
pub enum Orientation {
    /// Point has no sense of orientation, or determination of orientation
    /// is not applicable.
    Unknown = 0,
    /// Point has orientation from first LRP towards second LRP.
    Forward = 1,
    /// Point has orientation from second LRP towards first LRP.
    Backward = 2,
    /// Point has orientation in both directions.
    Both = 3,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Distance in meters.
/// Totally ordered so lengths can act as priority-queue keys and sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length(OrderedFloat<f64>);

impl Length {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
    pub const MAX: Self = Self(OrderedFloat(f64::MAX));

    pub const fn from_meters(meters: f64) -> Self {
        Self(OrderedFloat(meters))
    }

    pub const fn meters(&self) -> f64 {
        self.0.0
    }

    pub fn round(self) -> Self {
        Self::from_meters(self.meters().round())
    }

    pub fn abs(self) -> Self {
        Self::from_meters(self.meters().abs())
    }

    pub fn is_zero(&self) -> bool {
        self.meters() == 0.0
    }
}

impl Add for Length {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::from_meters(self.meters() + rhs.meters())
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Length {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::from_meters(self.meters() - rhs.meters())
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Length {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::from_meters(self.meters() * rhs)
    }
}

impl Neg for Length {
    type Output = Self;
    fn neg(self) -> Self {
        Self::from_meters(-self.meters())
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}m", self.meters())
    }
}

/// The bearing describes the angle between the true North and the road.
/// An integer value between 0 and 360 whereby "0" is included and "360"
/// is excluded from that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bearing(u16);

impl Bearing {
    pub const fn from_degrees(degrees: u16) -> Self {
        Self(degrees % 360)
    }

    pub const fn degrees(&self) -> u16 {
        self.0
    }

    /// Smaller of the two angles between this bearing and the other, in `[0, 180]`.
    pub const fn difference(&self, other: &Self) -> u16 {
        let difference = self.0.abs_diff(other.0);
        if difference > 180 { 360 - difference } else { difference }
    }
}

/// Rating of a candidate line in `[0, 1]`, 1 being a perfect match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Score(OrderedFloat<f64>);

impl Score {
    pub const ZERO: Self = Self(OrderedFloat(0.0));

    pub const fn value(&self) -> f64 {
        self.0.0
    }
}

impl From<f64> for Score {
    fn from(score: f64) -> Self {
        Self(OrderedFloat(score))
    }
}

/// Coordinate pair stands for a pair of WGS84 longitude (lon) and latitude
/// (lat) values. This coordinate pair specifies a geometric point in a
/// digital map.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        const EPSILON: f64 = 1e-7;
        abs_diff_eq!(self.lon, other.lon, epsilon = EPSILON)
            && abs_diff_eq!(self.lat, other.lat, epsilon = EPSILON)
    }
}

/// Line attributes are part of a location reference point and consist of
/// functional road class (FRC), form of way (FOW) and bearing (BEAR) data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineAttributes {
    pub frc: Frc,
    pub fow: Fow,
    /// Bearing of the first part of the outgoing line; for the last location
    /// reference point, bearing of the last part of the incoming line against
    /// the direction of travel.
    pub bearing: Bearing,
}

/// The path attributes are part of a location reference point (except for the
/// last location reference point) and consist of lowest functional road class
/// to next point (LFRCNP) and distance to next point (DNP) data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathAttributes {
    /// Lowest functional road class to next point.
    pub lfrcnp: Frc,
    /// Distance to next point.
    pub dnp: Length,
}

/// The basis of a location reference is a sequence of location reference
/// points (LRPs). The coordinates refer to a node of a line or a point on a
/// line and the additional attributes refer to attributes of a line.
/// The last point of a reference carries no path attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationReferencePoint {
    pub coordinate: Coordinate,
    pub line: LineAttributes,
    pub path: Option<PathAttributes>,
}

/// Offsets are used to locate the start and end of a location more precisely
/// than bounding to the nodes in a network. An offset is a fraction in
/// `[0, 1)` of the path between the two location reference points it refers
/// to; a missing offset means an offset of 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset(f64);

impl Offset {
    pub const fn from_fraction(fraction: f64) -> Self {
        Self(fraction)
    }

    pub const fn fraction(&self) -> f64 {
        self.0
    }

    /// Meters covered by this offset along a path of the given length.
    pub fn along(&self, length: Length) -> Length {
        length * self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub pos: Offset,
    pub neg: Offset,
}

/// A line location reference describes a path within a map and consists of
/// location reference point(s), a last location reference point and offset
/// data. There must be at least two location reference points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineReference {
    pub points: Vec<LocationReferencePoint>,
    pub offsets: Offsets,
}

/// Point along line is a point location which is defined by a line and an
/// offset value. The line will be referenced by two location reference points
/// and the concrete position on that line is referenced using the positive
/// offset. Additionally information about the side of the road where the
/// point is located and the orientation with respect to the direction of the
/// line can be added.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointAlongLineReference {
    pub points: [LocationReferencePoint; 2],
    pub offset: Offset,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

/// Point along line with access is a point location which is defined by a
/// line, an offset value and a coordinate. The point of interest is
/// identified by the coordinate pair; the access point on the referenced
/// line is identified by the offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoiReference {
    pub point: PointAlongLineReference,
    pub poi: Coordinate,
}
