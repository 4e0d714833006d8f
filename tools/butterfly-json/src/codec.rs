//! Binary encoding of cached node coordinates and way reference lists
//!
//! Node value layout (12 or 13 bytes, big-endian):
//!
//! ```text
//! [0..6)   lat  - top 48 bits of the f64 bit pattern
//! [6..12)  lon  - top 48 bits of the f64 bit pattern
//! [12]     meta - optional; bits 7-6 entrance, bits 5-4 wheelchair, bits 3-0 zero
//! ```
//!
//! The metadata byte is only written for entrances. Dropping the low 16 mantissa bits keeps
//! roughly 11 significant decimal digits, well past the 7 we emit.
//!
//! Way reference lists are the member node ids as consecutive 8-byte big-endian i64 values,
//! with no length prefix.

use butterfly_common::{Error, Result};
use byteorder::{BigEndian, ByteOrder};

use crate::entity::Node;
use crate::entrance::{Accessibility, Entrance};

const COORD_BYTES: usize = 6;
const COORDS_LEN: usize = 2 * COORD_BYTES;
const ID_BYTES: usize = 8;

/// Key prefix separating way reference lists from node ids in the shared key space
pub const WAY_KEY_PREFIX: char = 'W';

/// A node as read back from the coordinate cache
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeCoord {
    pub lat: f64,
    pub lon: f64,
    pub entrance: Entrance,
    pub access: Accessibility,
}

impl NodeCoord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ..Default::default()
        }
    }

    /// Coordinates plus entrance metadata classified from the node's tags
    pub fn from_node(node: &Node) -> Self {
        Self {
            lat: node.lat,
            lon: node.lon,
            entrance: Entrance::from_tags(&node.tags),
            access: Accessibility::from_tags(&node.tags),
        }
    }

    pub fn is_entrance(&self) -> bool {
        self.entrance != Entrance::None
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; COORDS_LEN];
        BigEndian::write_uint(&mut buf[..COORD_BYTES], truncate(self.lat), COORD_BYTES);
        BigEndian::write_uint(&mut buf[COORD_BYTES..], truncate(self.lon), COORD_BYTES);

        if self.is_entrance() {
            buf.push(((self.entrance.bits() & 0b11) << 6) | ((self.access.bits() & 0b11) << 4));
        }
        buf
    }

    /// Decode a cached node value; `key` is only used for error reporting
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < COORDS_LEN {
            return Err(Error::corrupt(
                key,
                format!("node value is {} bytes, expected at least {COORDS_LEN}", bytes.len()),
            ));
        }

        let lat = expand(BigEndian::read_uint(&bytes[..COORD_BYTES], COORD_BYTES));
        let lon = expand(BigEndian::read_uint(&bytes[COORD_BYTES..COORDS_LEN], COORD_BYTES));

        let (entrance, access) = match bytes.get(COORDS_LEN) {
            Some(meta) => (
                Entrance::from_bits((meta & 0b1100_0000) >> 6),
                Accessibility::from_bits((meta & 0b0011_0000) >> 4),
            ),
            None => (Entrance::None, Accessibility::Unknown),
        };

        Ok(Self {
            lat,
            lon,
            entrance,
            access,
        })
    }
}

#[inline]
fn truncate(value: f64) -> u64 {
    value.to_bits() >> 16
}

#[inline]
fn expand(bits: u64) -> f64 {
    f64::from_bits(bits << 16)
}

pub fn encode_ids(ids: &[i64]) -> Vec<u8> {
    let mut buf = vec![0u8; ids.len() * ID_BYTES];
    BigEndian::write_i64_into(ids, &mut buf);
    buf
}

/// Decode a way reference list; fails if the value is not a whole number of ids
pub fn decode_ids(key: &str, bytes: &[u8]) -> Result<Vec<i64>> {
    if bytes.len() % ID_BYTES != 0 {
        return Err(Error::corrupt(
            key,
            format!("length {} is not a multiple of {ID_BYTES}", bytes.len()),
        ));
    }
    let mut ids = vec![0i64; bytes.len() / ID_BYTES];
    BigEndian::read_i64_into(bytes, &mut ids);
    Ok(ids)
}

pub fn node_key(id: i64) -> String {
    id.to_string()
}

pub fn way_key(id: i64) -> String {
    format!("{WAY_KEY_PREFIX}{id}")
}
