#![doc = include_str!("../README.md")]

mod decoder;
mod error;
pub mod geo;
mod location;
mod map;
mod model;
mod observer;

pub use decoder::candidates::{Candidate, CandidateLines, find_candidates};
pub use decoder::rating::FOW_RATING;
pub use decoder::{
    DecoderConfig, decode_line, decode_line_with_observer, decode_point_along_line,
    decode_point_along_line_with_observer, decode_poi_with_access_point,
    decode_poi_with_access_point_with_observer,
};
pub use error::DecodeError;
pub use location::{LineLocation, PoiLocation, PointAlongLineLocation, is_path_connected};
pub use map::MapReader;
pub use model::{
    Bearing, Coordinate, Fow, Frc, Length, LineAttributes, LineReference, LocationReferencePoint,
    Offset, Offsets, Orientation, PathAttributes, PoiReference, PointAlongLineReference, Score,
    SideOfRoad,
};
pub use observer::{DecodeObserver, NoOpObserver};
