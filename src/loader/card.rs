//! Card catalogue loader (JSON)
//!
//! The catalogue is a JSON array of card templates, or an object with a
//! `cards` array. Templates are validated on load and shared through `Arc`.

use crate::core::{Card, CardType};
use crate::parser::parse_card_report;
use crate::{LoreError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Card>),
    Wrapped { cards: Vec<Card> },
}

/// Every card template from one catalogue file
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<Arc<Card>>,
}

impl CardCatalog {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(LoreError::IoError)?;
        Self::from_json(&content)
    }

    /// Parse and validate a catalogue
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| LoreError::InvalidCardFormat(e.to_string()))?;
        let cards = match file {
            CatalogFile::List(cards) | CatalogFile::Wrapped { cards } => cards,
        };

        let mut seen = FxHashSet::default();
        for card in &cards {
            validate(card)?;
            if !seen.insert(card.id.clone()) {
                return Err(LoreError::InvalidCardFormat(format!("duplicate card id {}", card.id)));
            }
        }
        Ok(CardCatalog {
            cards: cards.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn cards(&self) -> &[Arc<Card>] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Arc<Card>> {
        self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Parse every card and tally what the parser could not match
    pub fn diagnostics(&self) -> ParseDiagnostics {
        let mut diagnostics = ParseDiagnostics::default();
        let mut patterns: FxHashMap<String, usize> = FxHashMap::default();

        for card in &self.cards {
            let report = parse_card_report(card);
            diagnostics.cards += 1;
            diagnostics.parsed_sections += report.abilities.len();
            diagnostics.unparsed_sections += report.unparsed.len();
            if report.is_complete() {
                diagnostics.fully_parsed_cards += 1;
            }
            for text in &report.unparsed {
                *patterns.entry(pattern_of(text)).or_default() += 1;
            }
        }

        let mut patterns: Vec<(String, usize)> = patterns.into_iter().collect();
        patterns.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        diagnostics.unmatched = patterns;
        diagnostics
    }
}

fn validate(card: &Card) -> Result<()> {
    let name = card.full_name();
    if card.id.trim().is_empty() {
        return Err(LoreError::InvalidCardFormat(format!("{name} has no id")));
    }
    if card.cost < 0 {
        return Err(LoreError::InvalidCardFormat(format!("{name} has a negative cost")));
    }
    match card.card_type {
        CardType::Character if card.strength.is_none() || card.willpower.is_none() => Err(
            LoreError::InvalidCardFormat(format!("character {name} needs strength and willpower")),
        ),
        CardType::Location if card.willpower.is_none() => {
            Err(LoreError::InvalidCardFormat(format!("location {name} needs willpower")))
        }
        _ => Ok(()),
    }
}

/// Unmatched text with every digit run replaced by `N`
pub fn pattern_of(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_number = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            if !in_number {
                out.push('N');
            }
            in_number = true;
        } else {
            out.push(c);
            in_number = false;
        }
    }
    out
}

/// Output of the parse diagnostics pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseDiagnostics {
    pub cards: usize,
    pub fully_parsed_cards: usize,
    pub parsed_sections: usize,
    pub unparsed_sections: usize,
    /// Normalized unmatched text and how often it occurs, most frequent first
    pub unmatched: Vec<(String, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {
            "id": "1-001",
            "name": "Ariel",
            "version": "On Human Legs",
            "cost": 4,
            "color": "amber",
            "inkable": true,
            "type": "character",
            "strength": 3,
            "willpower": 4,
            "lore": 2,
            "subtypes": ["Storyborn", "Hero", "Princess"],
            "abilities": [{"name": "VOICELESS", "text": "This character can't sing songs."}]
        },
        {
            "id": "1-002",
            "name": "Fire the Cannons!",
            "cost": 1,
            "color": "ruby",
            "type": "action",
            "full_text": ["Deal 2 damage to chosen character."]
        }
    ]"#;

    #[test]
    fn test_load_array_catalog() {
        let catalog = CardCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        let ariel = &catalog.cards()[0];
        assert_eq!(ariel.full_name(), "Ariel - On Human Legs");
        assert!(ariel.has_subtype("hero"));
        assert!(!catalog.cards()[1].inkable);
    }

    #[test]
    fn test_wrapped_catalog() {
        let json = format!(r#"{{"cards": {CATALOG}}}"#);
        assert_eq!(CardCatalog::from_json(&json).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_bad_cards() {
        let missing_stats = r#"[{"id": "x", "name": "Ghost", "cost": 1, "color": "steel", "type": "character"}]"#;
        assert!(matches!(
            CardCatalog::from_json(missing_stats),
            Err(LoreError::InvalidCardFormat(_))
        ));
        let duplicate = r#"[
            {"id": "x", "name": "A", "cost": 1, "color": "steel", "type": "item"},
            {"id": "x", "name": "B", "cost": 1, "color": "steel", "type": "item"}
        ]"#;
        assert!(CardCatalog::from_json(duplicate).is_err());
        assert!(CardCatalog::from_json("{").is_err());
    }

    #[test]
    fn test_pattern_of_folds_numbers() {
        assert_eq!(pattern_of("gain 12 lore and 3 cards"), "gain N lore and N cards");
    }

    #[test]
    fn test_diagnostics_counts() {
        let json = r#"[
            {"id": "a", "name": "Odd", "cost": 2, "color": "emerald", "type": "action",
             "full_text": ["Juggle 3 torches.", "Draw a card."]},
            {"id": "b", "name": "Odder", "cost": 2, "color": "emerald", "type": "item",
             "full_text": ["Juggle 5 torches."]}
        ]"#;
        let diagnostics = CardCatalog::from_json(json).unwrap().diagnostics();
        assert_eq!(diagnostics.cards, 2);
        assert_eq!(diagnostics.unparsed_sections, 2);
        assert_eq!(diagnostics.fully_parsed_cards, 0);
        assert_eq!(diagnostics.unmatched.len(), 1);
        assert_eq!(diagnostics.unmatched[0].1, 2);
    }
}
