//! Identifier index: which entities matter for each downstream decision
//!
//! Built by the first two passes over the stream, read-only afterwards.

use butterfly_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::bitset::BitSet;
use crate::entity::{MemberKind, Relation, Way};

#[derive(Debug, Default)]
pub struct IdIndex {
    /// Nodes matching the tag rules
    pub nodes: BitSet,
    /// Ways matching the tag rules
    pub ways: BitSet,
    /// Relations matching the tag rules (and having at least one way member)
    pub relations: BitSet,
    /// Nodes referenced by a matching way
    pub way_refs: BitSet,
    /// Nodes referenced by a matching relation, directly or through a member way
    pub rel_nodes: BitSet,
    /// Ways referenced by a matching relation
    pub rel_ways: BitSet,
    /// Relations referenced by a matching relation
    pub rel_relations: BitSet,
}

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    nodes: Vec<(u64, u64)>,
    ways: Vec<(u64, u64)>,
    relations: Vec<(u64, u64)>,
    way_refs: Vec<(u64, u64)>,
    rel_nodes: Vec<(u64, u64)>,
    rel_ways: Vec<(u64, u64)>,
    rel_relations: Vec<(u64, u64)>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a matching way and every node it references
    pub fn mark_way(&self, way: &Way) {
        self.ways.insert(way.id);
        for node_id in &way.refs {
            self.way_refs.insert(*node_id);
        }
    }

    /// Record a matching relation and its members by kind.
    ///
    /// Relations without a single way member cannot produce a geometry and are left out;
    /// returns whether the relation was marked.
    pub fn mark_relation(&self, relation: &Relation) -> bool {
        let way_members = relation
            .members
            .iter()
            .filter(|m| m.kind == MemberKind::Way)
            .count();
        if way_members == 0 {
            return false;
        }

        self.relations.insert(relation.id);
        for member in &relation.members {
            match member.kind {
                MemberKind::Node => self.rel_nodes.insert(member.id),
                MemberKind::Way => self.rel_ways.insert(member.id),
                MemberKind::Relation => self.rel_relations.insert(member.id),
            }
        }
        true
    }

    /// Mark the nodes of a way that is needed only as a relation member
    pub fn mark_relation_way_nodes(&self, way: &Way) {
        for node_id in &way.refs {
            self.rel_nodes.insert(*node_id);
        }
    }

    /// Whether a node must be written to the coordinate cache
    pub fn is_cached_node(&self, id: i64) -> bool {
        self.way_refs.has(id) || self.rel_nodes.has(id)
    }

    fn named_sets(&self) -> [(&'static str, &BitSet); 7] {
        [
            ("nodes", &self.nodes),
            ("ways", &self.ways),
            ("relations", &self.relations),
            ("way_refs", &self.way_refs),
            ("rel_nodes", &self.rel_nodes),
            ("rel_ways", &self.rel_ways),
            ("rel_relations", &self.rel_relations),
        ]
    }

    /// Log the population of every set. Full scan, debug level only.
    pub fn log_stats(&self) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for (name, set) in self.named_sets() {
            log::debug!("index {name}: {}", set.len());
        }
    }

    /// Write a snapshot of the index to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = IndexSnapshot {
            nodes: self.nodes.words(),
            ways: self.ways.words(),
            relations: self.relations.words(),
            way_refs: self.way_refs.words(),
            rel_nodes: self.rel_nodes.words(),
            rel_ways: self.rel_ways.words(),
            rel_relations: self.rel_relations.words(),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &snapshot)
            .map_err(|e| Error::SerializationError(format!("index snapshot: {e}")))?;
        writer.flush()?;

        log::info!("wrote index: {}", path.display());
        Ok(())
    }

    /// Read an index snapshot previously written by [`IdIndex::save`]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("index file not found: {}", path.display()),
            )));
        }

        let reader = BufReader::new(File::open(path)?);
        let snapshot: IndexSnapshot = bincode::deserialize_from(reader)
            .map_err(|e| Error::SerializationError(format!("index snapshot: {e}")))?;

        log::info!("read index: {}", path.display());
        Ok(Self {
            nodes: BitSet::from_words(snapshot.nodes),
            ways: BitSet::from_words(snapshot.ways),
            relations: BitSet::from_words(snapshot.relations),
            way_refs: BitSet::from_words(snapshot.way_refs),
            rel_nodes: BitSet::from_words(snapshot.rel_nodes),
            rel_ways: BitSet::from_words(snapshot.rel_ways),
            rel_relations: BitSet::from_words(snapshot.rel_relations),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Member, Tags};
    use tempfile::NamedTempFile;

    fn member(kind: MemberKind, id: i64, role: &str) -> Member {
        Member {
            kind,
            id,
            role: role.to_string(),
        }
    }

    #[test]
    fn test_mark_way() {
        let index = IdIndex::new();
        index.mark_way(&Way {
            id: 10,
            tags: Tags::new(),
            refs: vec![1, 2, 3, 1],
        });
        assert!(index.ways.has(10));
        assert_eq!(index.way_refs.len(), 3);
        assert!(index.is_cached_node(2));
        assert!(!index.is_cached_node(4));
    }

    #[test]
    fn test_relation_without_way_members_is_skipped() {
        let index = IdIndex::new();
        let relation = Relation {
            id: 5,
            tags: Tags::new(),
            members: vec![member(MemberKind::Node, 1, "admin_centre")],
        };
        assert!(!index.mark_relation(&relation));
        assert!(index.relations.is_empty());
        assert!(index.rel_nodes.is_empty());
    }

    #[test]
    fn test_relation_members_by_kind() {
        let index = IdIndex::new();
        let relation = Relation {
            id: 5,
            tags: Tags::new(),
            members: vec![
                member(MemberKind::Node, 1, "admin_centre"),
                member(MemberKind::Way, 2, "outer"),
                member(MemberKind::Relation, 3, "subarea"),
            ],
        };
        assert!(index.mark_relation(&relation));
        assert!(index.relations.has(5));
        assert!(index.rel_nodes.has(1));
        assert!(index.rel_ways.has(2));
        assert!(index.rel_relations.has(3));
        assert!(!index.rel_ways.has(1));
    }

    #[test]
    fn test_save_and_load() {
        let index = IdIndex::new();
        index.nodes.insert(1);
        index.ways.insert(2);
        index.relations.insert(3);
        index.way_refs.insert(4);
        index.rel_nodes.insert(5);
        index.rel_ways.insert(6);
        index.rel_relations.insert(7);

        let tmpfile = NamedTempFile::new().unwrap();
        index.save(tmpfile.path()).unwrap();
        let loaded = IdIndex::load(tmpfile.path()).unwrap();

        assert!(loaded.nodes.has(1));
        assert!(loaded.ways.has(2));
        assert!(loaded.relations.has(3));
        assert!(loaded.way_refs.has(4));
        assert!(loaded.rel_nodes.has(5));
        assert!(loaded.rel_ways.has(6));
        assert!(loaded.rel_relations.has(7));
        assert!(!loaded.nodes.has(2));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = IdIndex::load(&dir.path().join("missing.idx"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
