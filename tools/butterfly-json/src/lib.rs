//! Butterfly-json library
//!
//! Turns an OpenStreetMap PBF extract into one JSON record per matching node, way and
//! relation. Ways and relations are denormalized: their node references are resolved through
//! an on-disk coordinate cache and each record carries a representative centroid and a
//! bounding box.
//!
//! The input is read three times. The first pass marks matching entities and what they
//! reference, the second marks the nodes of ways that are only needed as relation members,
//! and the third caches coordinates and emits records. Memory stays bounded by the identifier
//! bitsets; coordinates live in the key-value store.

pub mod bitset;
pub mod cache;
pub mod codec;
pub mod entity;
pub mod entrance;
pub mod geometry;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod tags;

pub use bitset::BitSet;
pub use cache::CoordinateCache;
pub use entity::{Entity, Member, MemberKind, Node, Relation, Tags, Way};
pub use index::IdIndex;
pub use output::{Record, RecordSink};
pub use pipeline::{run, Config, Options, RunStats};
pub use source::{EntitySource, PbfSource, VecSource};
pub use store::{KeyValueStore, MemoryStore, RocksStore};
pub use tags::TagFilter;
