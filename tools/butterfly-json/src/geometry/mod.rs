//! Representative point and bounding box for ways and relations

mod line;
mod polygon;
mod relation;
mod ring;

use geo::{BoundingRect, LineString, Point};

use crate::codec::NodeCoord;
use crate::entrance::Entrance;

pub use line::line_centroid;
pub use polygon::{polygon_centroid, simplify_ring};
pub use relation::{relation_geometry, MemberGeometry};
pub use ring::assemble_rings;

/// Floor applied to each bounds edge length so degenerate boxes still compare by area
pub const MIN_EDGE_DEGREES: f64 = 0.000001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// Bounding box of `points` (x = lon, y = lat); `None` when empty
    pub fn from_points(points: &[Point<f64>]) -> Option<Self> {
        let line: LineString<f64> = points.iter().map(|p| p.0).collect();
        line.bounding_rect().map(|rect| Bounds {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        })
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn area(&self) -> f64 {
        self.width().max(MIN_EDGE_DEGREES) * self.height().max(MIN_EDGE_DEGREES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidKind {
    Computed,
    Entrance,
    AdminCentre,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
    pub kind: CentroidKind,
}

impl Centroid {
    fn computed(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
            kind: CentroidKind::Computed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub centroid: Centroid,
    pub bounds: Bounds,
}

pub fn to_points(coords: &[NodeCoord]) -> Vec<Point<f64>> {
    coords.iter().map(|c| Point::new(c.lon, c.lat)).collect()
}

/// More than two points, first and last at the same position
pub fn is_closed(points: &[Point<f64>]) -> bool {
    points.len() > 2 && points.first() == points.last()
}

/// Pick the entrance standing in for a way's centroid: a main entrance first, then any
/// wheelchair-accessible one, then the first entrance found.
pub fn select_entrance(coords: &[NodeCoord]) -> Option<&NodeCoord> {
    coords
        .iter()
        .find(|c| c.entrance == Entrance::Main)
        .or_else(|| {
            coords
                .iter()
                .find(|c| c.is_entrance() && c.access.is_accessible())
        })
        .or_else(|| coords.iter().find(|c| c.is_entrance()))
}

/// Centroid and bounds of a way from its resolved nodes, in way order.
///
/// Bounds always cover every node. The centroid is an entrance node if one exists, the
/// spherical mean of the simplified ring for closed ways, and the distance midpoint for open
/// ones. Returns `None` for an empty node list.
pub fn way_geometry(coords: &[NodeCoord]) -> Option<Geometry> {
    let points = to_points(coords);
    let bounds = Bounds::from_points(&points)?;

    let centroid = match select_entrance(coords) {
        Some(entrance) => Centroid {
            lat: entrance.lat,
            lon: entrance.lon,
            kind: CentroidKind::Entrance,
        },
        None if is_closed(&points) => Centroid::computed(polygon_centroid(&points)),
        None => Centroid::computed(line_centroid(&points)),
    };

    Some(Geometry { centroid, bounds })
}
