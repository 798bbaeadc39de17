//! Strongly-typed wrappers for game concepts
//!
//! Instead of using bare Strings for different concepts, we wrap them in
//! distinct types that cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fold a display string into the ascii-lowercase form used for comparisons
pub fn fold_text(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase().trim().to_string()
}

/// Card subtype / classification (e.g. "Hero", "Villain", "Floodborn", "Pirate")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subtype(String);

impl Subtype {
    pub fn new(s: impl Into<String>) -> Self {
        Subtype(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison
    pub fn is(&self, other: &str) -> bool {
        fold_text(&self.0) == fold_text(other)
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Subtype {
    fn from(s: &str) -> Self {
        Subtype(s.to_string())
    }
}

/// Card name (distinct from other string types)
///
/// Printed names are "Base - Version" (e.g. "Mickey Mouse - Brave Little Tailor").
/// Rules text refers to the base name only ("a character named Mickey Mouse").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }

    /// The part before " - " (the whole name when there is no version)
    pub fn base_name(&self) -> &str {
        self.0.split(" - ").next().unwrap_or(&self.0).trim()
    }

    /// Does this name answer to `query` ("named X" in rules text)?
    pub fn matches(&self, query: &str) -> bool {
        let query = fold_text(query);
        fold_text(self.base_name()) == query || fold_text(&self.0) == query
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Player name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype() {
        let subtype = Subtype::new("Floodborn");
        assert_eq!(subtype.as_str(), "Floodborn");
        assert!(subtype.is("floodborn"));
        assert!(!subtype.is("Storyborn"));
    }

    #[test]
    fn test_card_name_base() {
        let name = CardName::new("Mickey Mouse - Brave Little Tailor");
        assert_eq!(name.base_name(), "Mickey Mouse");
        assert!(name.matches("mickey mouse"));
        assert!(name.matches("Mickey Mouse - Brave Little Tailor"));
        assert!(!name.matches("minnie mouse"));
    }

    #[test]
    fn test_card_name_unicode_fold() {
        let name = CardName::new("Maui’s Fish Hook");
        assert!(name.matches("maui's fish hook"));
    }

    #[test]
    fn test_player_name() {
        let name = PlayerName::new("Alice");
        assert_eq!(name.as_str(), "Alice");
    }
}
