//! Entrance and wheelchair classification of nodes
//!
//! See <https://wiki.openstreetmap.org/wiki/Key:entrance> and
//! <https://wiki.openstreetmap.org/wiki/Key:wheelchair>.

use crate::entity::Tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Entrance {
    #[default]
    None,
    Normal,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accessibility {
    #[default]
    Unknown,
    No,
    ImplicitYes,
    ExplicitYes,
}

impl Entrance {
    pub fn from_tags(tags: &Tags) -> Self {
        match tags.get("entrance").map(|v| v.to_lowercase()).as_deref() {
            Some("main") => Entrance::Main,
            Some("yes" | "home" | "staircase") => Entrance::Normal,
            _ => Entrance::None,
        }
    }

    pub(crate) fn bits(self) -> u8 {
        match self {
            Entrance::None => 0,
            Entrance::Normal => 1,
            Entrance::Main => 2,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Entrance::Normal,
            2 => Entrance::Main,
            _ => Entrance::None,
        }
    }
}

impl Accessibility {
    pub fn from_tags(tags: &Tags) -> Self {
        match tags.get("wheelchair").map(|v| v.to_lowercase()).as_deref() {
            None => Accessibility::Unknown,
            Some("yes") => Accessibility::ExplicitYes,
            Some("no") => Accessibility::No,
            Some(_) => Accessibility::ImplicitYes,
        }
    }

    /// Unknown is stored as No; the field only matters for entrances.
    pub(crate) fn bits(self) -> u8 {
        match self {
            Accessibility::Unknown | Accessibility::No => 0,
            Accessibility::ImplicitYes => 1,
            Accessibility::ExplicitYes => 2,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Accessibility::ImplicitYes,
            2 => Accessibility::ExplicitYes,
            _ => Accessibility::No,
        }
    }

    pub fn is_accessible(self) -> bool {
        matches!(self, Accessibility::ImplicitYes | Accessibility::ExplicitYes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_entrance_classification() {
        assert_eq!(Entrance::from_tags(&tags(&[("entrance", "main")])), Entrance::Main);
        assert_eq!(Entrance::from_tags(&tags(&[("entrance", "MAIN")])), Entrance::Main);
        assert_eq!(Entrance::from_tags(&tags(&[("entrance", "yes")])), Entrance::Normal);
        assert_eq!(Entrance::from_tags(&tags(&[("entrance", "Home")])), Entrance::Normal);
        assert_eq!(
            Entrance::from_tags(&tags(&[("entrance", "staircase")])),
            Entrance::Normal
        );
        assert_eq!(Entrance::from_tags(&tags(&[("entrance", "service")])), Entrance::None);
        assert_eq!(Entrance::from_tags(&Tags::new()), Entrance::None);
    }

    #[test]
    fn test_accessibility_classification() {
        assert_eq!(
            Accessibility::from_tags(&tags(&[("wheelchair", "yes")])),
            Accessibility::ExplicitYes
        );
        assert_eq!(
            Accessibility::from_tags(&tags(&[("wheelchair", "No")])),
            Accessibility::No
        );
        assert_eq!(
            Accessibility::from_tags(&tags(&[("wheelchair", "limited")])),
            Accessibility::ImplicitYes
        );
        assert_eq!(Accessibility::from_tags(&Tags::new()), Accessibility::Unknown);
    }

    #[test]
    fn test_unknown_stored_as_no() {
        assert_eq!(Accessibility::Unknown.bits(), Accessibility::No.bits());
        assert_eq!(Accessibility::from_bits(0), Accessibility::No);
        assert!(!Accessibility::Unknown.is_accessible());
    }
}
