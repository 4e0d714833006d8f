//! Tag match rules
//!
//! Rules are written as comma-separated groups of `+`-joined conditions, each condition being
//! `key` (key must be present) or `key~value` (key must carry exactly that value). An entity
//! matches when every condition of at least one group holds.

use butterfly_common::{Error, Result};
use std::str::FromStr;

use crate::entity::Tags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub key: String,
    pub value: Option<String>,
}

impl Condition {
    fn matches(&self, tags: &Tags) -> bool {
        match (tags.get(&self.key), &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(found), Some(expected)) => found == expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    groups: Vec<Vec<Condition>>,
}

impl TagFilter {
    pub fn groups(&self) -> &[Vec<Condition>] {
        &self.groups
    }

    /// True if `tags` is non-empty and satisfies at least one group
    pub fn matches(&self, tags: &Tags) -> bool {
        if tags.is_empty() {
            return false;
        }
        self.groups
            .iter()
            .any(|group| group.iter().all(|cond| cond.matches(tags)))
    }
}

impl FromStr for TagFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut groups = Vec::new();

        for group in s.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            let mut conditions = Vec::new();
            for cond in group.split('+').map(str::trim) {
                let (key, value) = match cond.split_once('~') {
                    Some((k, v)) => (k.trim(), Some(v.trim().to_string())),
                    None => (cond, None),
                };
                if key.is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "empty tag key in group '{group}'"
                    )));
                }
                conditions.push(Condition {
                    key: key.to_string(),
                    value,
                });
            }
            groups.push(conditions);
        }

        if groups.is_empty() {
            return Err(Error::InvalidInput(
                "nothing to do, you must specify tags to match against".to_string(),
            ));
        }

        Ok(Self { groups })
    }
}
