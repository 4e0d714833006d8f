//! JSON-lines output records

use butterfly_common::Result;
use serde::Serialize;
use std::io::Write;

use crate::codec::NodeCoord;
use crate::entity::Tags;
use crate::geometry::{Bounds, Centroid, CentroidKind};

/// Decimal places for centroid, bounds and way node coordinates
pub const COORD_PRECISION: usize = 7;

pub fn format_coord(value: f64) -> String {
    format!("{:.*}", COORD_PRECISION, value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: String,
    pub lon: String,
}

impl From<&NodeCoord> for LatLon {
    fn from(coord: &NodeCoord) -> Self {
        Self {
            lat: format_coord(coord.lat),
            lon: format_coord(coord.lon),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentroidRecord {
    pub lat: String,
    pub lon: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl From<&Centroid> for CentroidRecord {
    fn from(centroid: &Centroid) -> Self {
        Self {
            lat: format_coord(centroid.lat),
            lon: format_coord(centroid.lon),
            kind: match centroid.kind {
                CentroidKind::Computed => None,
                CentroidKind::Entrance => Some("entrance"),
                CentroidKind::AdminCentre => Some("admin_centre"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsRecord {
    pub e: String,
    pub n: String,
    pub s: String,
    pub w: String,
}

impl From<&Bounds> for BoundsRecord {
    fn from(bounds: &Bounds) -> Self {
        Self {
            e: format_coord(bounds.east),
            n: format_coord(bounds.north),
            s: format_coord(bounds.south),
            w: format_coord(bounds.west),
        }
    }
}

/// One output line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        tags: Tags,
    },
    Way {
        id: i64,
        tags: Tags,
        centroid: CentroidRecord,
        bounds: BoundsRecord,
        #[serde(skip_serializing_if = "Option::is_none")]
        nodes: Option<Vec<LatLon>>,
    },
    Relation {
        id: i64,
        tags: Tags,
        centroid: CentroidRecord,
        bounds: BoundsRecord,
    },
}

/// Writes one JSON object per line
pub struct RecordSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> RecordSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
