//! Test road network loaded from GeoJSON and indexed with an R-tree,
//! exposed to the decoder through the [`MapReader`] boundary.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::LazyLock;

use geo::{BoundingRect, Closest, Distance, Geodesic, HaversineClosestPoint, LineString, Point, coord};
use geojson::{Feature, FeatureCollection, Value};
use openlr_dereferencer::geo::path_length;
use openlr_dereferencer::{Coordinate, Fow, Frc, Length, MapReader};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

pub static KIEZ_MAP: LazyLock<GeoMap> =
    LazyLock::new(|| GeoMap::parse_geojson(include_str!("kiez.geojson")));

pub struct GeoMap {
    nodes: HashMap<u64, Coordinate>,
    lines: HashMap<i64, GeoLine>,
    index: RTree<IndexedLine>,
}

struct GeoLine {
    start: u64,
    end: u64,
    frc: Frc,
    fow: Fow,
    geometry: Vec<Coordinate>,
    length: Length,
}

struct IndexedLine {
    line: i64,
    geometry: LineString,
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<Point>;

    fn envelope(&self) -> Self::Envelope {
        let bbox = self.geometry.bounding_rect().unwrap();
        AABB::from_corners(
            Point::new(bbox.min().x, bbox.min().y),
            Point::new(bbox.max().x, bbox.max().y),
        )
    }
}

impl PointDistance for IndexedLine {
    fn distance_2(&self, point: &Point) -> f64 {
        use Closest::*;
        match self.geometry.haversine_closest_point(point) {
            SinglePoint(p) | Intersection(p) => Geodesic.distance(p, *point).powi(2),
            Indeterminate => f64::INFINITY,
        }
    }
}

impl GeoMap {
    fn parse_geojson(geojson: &str) -> Self {
        let FeatureCollection { features, .. } = geojson.parse().unwrap();

        let mut nodes: HashMap<u64, Coordinate> = HashMap::new();
        let mut lines: HashMap<i64, GeoLine> = HashMap::new();

        for Feature {
            geometry,
            properties,
            ..
        } in &features
        {
            let geometry = geometry.as_ref().unwrap();
            let properties = properties.as_ref().unwrap();

            if let Value::Point(point) = &geometry.value {
                let id = properties.get("id").unwrap().as_u64().unwrap();
                nodes.insert(
                    id,
                    Coordinate {
                        lon: point[0],
                        lat: point[1],
                    },
                );
            }
        }

        for Feature {
            geometry,
            properties,
            ..
        } in &features
        {
            let geometry = geometry.as_ref().unwrap();
            let properties = properties.as_ref().unwrap();

            if let Value::LineString(positions) = &geometry.value {
                let id = properties.get("id").unwrap().as_i64().unwrap();
                let start = properties.get("startId").unwrap().as_u64().unwrap();
                let end = properties.get("endId").unwrap().as_u64().unwrap();
                let frc = properties.get("frc").unwrap().as_u64().unwrap() as u8;
                let fow = properties.get("fow").unwrap().as_u64().unwrap() as u8;
                let direction = properties.get("direction").unwrap().as_i64().unwrap();

                let frc = Frc::from_repr(frc).unwrap();
                let fow = Fow::from_repr(fow).unwrap();

                let forward: Vec<Coordinate> = positions
                    .iter()
                    .map(|position| Coordinate {
                        lon: position[0],
                        lat: position[1],
                    })
                    .collect();

                if direction == 1 {
                    // both directions: add also the opposing line
                    let backward: Vec<Coordinate> = forward.iter().rev().copied().collect();
                    let length = path_length(&backward);
                    lines.insert(
                        -id,
                        GeoLine {
                            start: end,
                            end: start,
                            frc,
                            fow,
                            geometry: backward,
                            length,
                        },
                    );
                }

                let length = path_length(&forward);
                lines.insert(
                    id,
                    GeoLine {
                        start,
                        end,
                        frc,
                        fow,
                        geometry: forward,
                        length,
                    },
                );
            }
        }

        let indexed = lines
            .iter()
            .map(|(&line, properties)| IndexedLine {
                line,
                geometry: LineString::from_iter(
                    properties
                        .geometry
                        .iter()
                        .map(|c| coord! { x: c.lon, y: c.lat }),
                ),
            })
            .collect();

        GeoMap {
            nodes,
            lines,
            index: RTree::bulk_load(indexed),
        }
    }

    fn get(&self, line: i64) -> &GeoLine {
        self.lines
            .get(&line)
            .unwrap_or_else(|| panic!("unknown line {line}"))
    }
}

impl MapReader for GeoMap {
    type Error = Infallible;
    type LineId = i64;
    type NodeId = u64;

    fn lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> Result<impl Iterator<Item = i64>, Infallible> {
        let point = Point::new(coordinate.lon, coordinate.lat);
        let radius_2 = radius.meters() * radius.meters();

        let mut close: Vec<(Length, i64)> = self
            .index
            .nearest_neighbor_iter_with_distance_2(&point)
            .take_while(|(_, distance_2)| *distance_2 <= radius_2)
            .map(|(indexed, distance_2)| (Length::from_meters(distance_2.sqrt()), indexed.line))
            .collect();

        // opposing lines tie on distance, order by id to stay deterministic
        close.sort_unstable();
        Ok(close.into_iter().map(|(_, line)| line))
    }

    fn line_geometry(&self, line: i64) -> Result<impl Iterator<Item = Coordinate>, Infallible> {
        Ok(self.get(line).geometry.iter().copied())
    }

    fn line_length(&self, line: i64) -> Result<Length, Infallible> {
        Ok(self.get(line).length)
    }

    fn line_frc(&self, line: i64) -> Result<Frc, Infallible> {
        Ok(self.get(line).frc)
    }

    fn line_fow(&self, line: i64) -> Result<Fow, Infallible> {
        Ok(self.get(line).fow)
    }

    fn line_start_node(&self, line: i64) -> Result<u64, Infallible> {
        Ok(self.get(line).start)
    }

    fn line_end_node(&self, line: i64) -> Result<u64, Infallible> {
        Ok(self.get(line).end)
    }

    fn node_coordinate(&self, node: u64) -> Result<Coordinate, Infallible> {
        Ok(*self
            .nodes
            .get(&node)
            .unwrap_or_else(|| panic!("unknown node {node}")))
    }

    fn outgoing_lines(&self, node: u64) -> Result<impl Iterator<Item = i64>, Infallible> {
        let mut lines: Vec<i64> = self
            .lines
            .iter()
            .filter(|(_, line)| line.start == node)
            .map(|(&id, _)| id)
            .collect();
        lines.sort_unstable();
        Ok(lines.into_iter())
    }

    fn incoming_lines(&self, node: u64) -> Result<impl Iterator<Item = i64>, Infallible> {
        let mut lines: Vec<i64> = self
            .lines
            .iter()
            .filter(|(_, line)| line.end == node)
            .map(|(&id, _)| id)
            .collect();
        lines.sort_unstable();
        Ok(lines.into_iter())
    }
}

/// Node coordinate shorthand for test assertions.
pub fn node(id: u64) -> Coordinate {
    KIEZ_MAP.node_coordinate(id).unwrap()
}
