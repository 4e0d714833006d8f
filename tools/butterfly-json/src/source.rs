//! Restartable streams of decoded entities

use butterfly_common::{Error, Result};
use osmpbf::{BlobDecode, BlobReader, Element, RelMemberType};
use std::path::{Path, PathBuf};

use crate::entity::{Entity, Member, MemberKind, Node, Relation, Tags, Way};

/// A stream of entities that can be read from the start any number of times.
///
/// Each call delivers nodes, then ways, then relations. The first error returned by `f`
/// stops delivery and is returned.
pub trait EntitySource {
    fn for_each_entity(&mut self, f: &mut dyn FnMut(Entity) -> Result<()>) -> Result<()>;
}

/// OSM PBF file, reopened for every pass and decoded one blob at a time
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Input file not found: {}", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntitySource for PbfSource {
    fn for_each_entity(&mut self, f: &mut dyn FnMut(Entity) -> Result<()>) -> Result<()> {
        let reader = BlobReader::from_path(&self.path)
            .map_err(|e| Error::InvalidInput(format!("Failed to open PBF file: {e}")))?;

        for blob in reader {
            let blob =
                blob.map_err(|e| Error::DecodeError(format!("Failed to read PBF blob: {e}")))?;
            let decoded = blob
                .decode()
                .map_err(|e| Error::DecodeError(format!("Failed to decode PBF blob: {e}")))?;

            if let BlobDecode::OsmData(block) = decoded {
                for element in block.elements() {
                    f(convert(element))?;
                }
            }
        }
        Ok(())
    }
}

fn collect_tags<'a>(tags: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    tags.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn convert(element: Element<'_>) -> Entity {
    match element {
        Element::Node(node) => Entity::Node(Node {
            id: node.id(),
            lat: node.lat(),
            lon: node.lon(),
            tags: collect_tags(node.tags()),
        }),
        Element::DenseNode(node) => Entity::Node(Node {
            id: node.id(),
            lat: node.lat(),
            lon: node.lon(),
            tags: collect_tags(node.tags()),
        }),
        Element::Way(way) => Entity::Way(Way {
            id: way.id(),
            tags: collect_tags(way.tags()),
            refs: way.refs().collect(),
        }),
        Element::Relation(relation) => Entity::Relation(Relation {
            id: relation.id(),
            tags: collect_tags(relation.tags()),
            members: relation
                .members()
                .map(|member| Member {
                    kind: match member.member_type {
                        RelMemberType::Node => MemberKind::Node,
                        RelMemberType::Way => MemberKind::Way,
                        RelMemberType::Relation => MemberKind::Relation,
                    },
                    id: member.member_id,
                    role: member.role().unwrap_or("").to_string(),
                })
                .collect(),
        }),
    }
}

/// In-memory entity list; counts how many passes were read
#[derive(Debug, Default)]
pub struct VecSource {
    entities: Vec<Entity>,
    passes: usize,
}

impl VecSource {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            passes: 0,
        }
    }

    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl EntitySource for VecSource {
    fn for_each_entity(&mut self, f: &mut dyn FnMut(Entity) -> Result<()>) -> Result<()> {
        self.passes += 1;
        for entity in &self.entities {
            f(entity.clone())?;
        }
        Ok(())
    }
}
