//! Game tags (clans, players, wars).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized `#`-prefixed game tag.
///
/// Tags from the API and from user input are compared after normalization, so
/// `"pj2uvurc"`, `" #PJ2UVURC"` and `"#pj2uvurc"` are the same tag.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Tag(String);

impl Tag {
    /// War slots that are not scheduled yet come back as `#0`.
    pub const PLACEHOLDER: &'static str = "#0";

    /// Create a tag, normalizing case and the leading `#`.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().to_uppercase();
        if trimmed.starts_with('#') {
            Self(trimmed)
        } else {
            Self(format!("#{}", trimmed))
        }
    }

    /// Get the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag without its leading `#`, used for file names.
    pub fn bare(&self) -> &str {
        self.0.trim_start_matches('#')
    }

    /// True for unscheduled war slots.
    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Type alias for clan tags
pub type ClanTag = Tag;

/// Type alias for player tags
pub type PlayerTag = Tag;

/// Type alias for league war tags
pub type WarTag = Tag;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_normalizes_case_and_prefix() {
        assert_eq!(Tag::new("pj2uvurc").as_str(), "#PJ2UVURC");
        assert_eq!(Tag::new(" #pj2uvurc ").as_str(), "#PJ2UVURC");
        assert_eq!(Tag::new("#PJ2UVURC"), Tag::from("pj2uvurc"));
    }

    #[test]
    fn test_tag_bare() {
        assert_eq!(Tag::new("#2PRG8V0G2").bare(), "2PRG8V0G2");
    }

    #[test]
    fn test_placeholder() {
        assert!(Tag::new("#0").is_placeholder());
        assert!(!Tag::new("#8QU8J9LP").is_placeholder());
    }

    #[test]
    fn test_tag_deserialization_normalizes() {
        let tag: Tag = serde_json::from_str("\"#abc123\"").unwrap();
        assert_eq!(tag.as_str(), "#ABC123");

        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"#ABC123\"");
    }

    #[test]
    fn test_tag_display_and_debug() {
        let tag = Tag::new("#GCCUC2YR");
        assert_eq!(format!("{}", tag), "#GCCUC2YR");
        assert!(format!("{:?}", tag).contains("GCCUC2YR"));
    }
}
