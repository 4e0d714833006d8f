//! Decoded OSM entities as delivered by an [`EntitySource`](crate::source::EntitySource)

use std::collections::BTreeMap;
use std::fmt;

/// Tag map; ordered so emitted JSON is stable
pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub tags: Tags,
    /// Member node ids in way order
    pub refs: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: MemberKind,
    pub id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub tags: Tags,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

/// Entity category. Within one pass a stream delivers all nodes, then all ways, then all
/// relations; the derived ordering follows that sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Node,
    Way,
    Relation,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Node => "node",
            Category::Way => "way",
            Category::Relation => "relation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Entity {
    pub fn id(&self) -> i64 {
        match self {
            Entity::Node(n) => n.id,
            Entity::Way(w) => w.id,
            Entity::Relation(r) => r.id,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Entity::Node(_) => Category::Node,
            Entity::Way(_) => Category::Way,
            Entity::Relation(_) => Category::Relation,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Entity::Node(n) => &n.tags,
            Entity::Way(w) => &w.tags,
            Entity::Relation(r) => &r.tags,
        }
    }
}

/// Copy of `tags` with surrounding whitespace removed from every key and value
pub fn trim_tags(tags: &Tags) -> Tags {
    tags.iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}
