//! Deck list loader
//!
//! One entry per line: `N Card Name` or `Nx Card Name`. Blank lines,
//! `#`/`//` comments and `[Section]` headers are skipped.

use nom::{
    character::complete::{char, digit1, space0, space1},
    combinator::{map_res, opt, rest},
    IResult,
};
use std::fs;
use std::path::Path;
use crate::{LoreError, Result};

/// Most copies of one card a constructed deck may hold
pub const MAX_COPIES: u32 = 4;

/// Fewest cards in a constructed deck
pub const MIN_DECK_SIZE: usize = 60;

/// Deck loader for plain-text deck lists
pub struct DeckLoader;

fn entry_line(input: &str) -> IResult<&str, (u32, &str)> {
    let (input, _) = space0(input)?;
    let (input, count) = map_res(digit1, |digits: &str| digits.parse::<u32>())(input)?;
    let (input, _) = opt(char('x'))(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = rest(input)?;
    Ok((input, (count, name.trim())))
}

impl DeckLoader {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path).map_err(LoreError::IoError)?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut entries: Vec<DeckEntry> = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") || line.starts_with('[') {
                continue;
            }
            let (count, card_name) = match entry_line(line) {
                Ok((_, (count, name))) if count > 0 && !name.is_empty() => (count, name),
                _ => {
                    return Err(LoreError::InvalidDeckFormat(format!(
                        "line {}: expected \"<count> <card name>\", got {line:?}",
                        number + 1
                    )))
                }
            };
            // repeated lines for the same card add up
            match entries.iter_mut().find(|e| e.card_name.eq_ignore_ascii_case(card_name)) {
                Some(entry) => entry.count += count,
                None => entries.push(DeckEntry {
                    card_name: card_name.to_string(),
                    count,
                }),
            }
        }

        if entries.is_empty() {
            return Err(LoreError::InvalidDeckFormat("Empty deck".to_string()));
        }
        Ok(DeckList { entries })
    }
}

/// Represents a deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u32,
}

/// Represents a complete deck list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckList {
    pub entries: Vec<DeckEntry>,
}

impl DeckList {
    pub fn total_cards(&self) -> usize {
        self.entries.iter().map(|e| e.count as usize).sum()
    }

    /// Deck size and copy limits of constructed play
    pub fn check_constructed(&self) -> Result<()> {
        if let Some(entry) = self.entries.iter().find(|e| e.count > MAX_COPIES) {
            return Err(LoreError::InvalidDeckFormat(format!(
                "{} copies of {} (at most {MAX_COPIES})",
                entry.count, entry.card_name
            )));
        }
        let total = self.total_cards();
        if total < MIN_DECK_SIZE {
            return Err(LoreError::InvalidDeckFormat(format!(
                "{total} cards (at least {MIN_DECK_SIZE})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_deck() {
        let content = r#"
# Amber/Steel midrange
[Main]
4 Mickey Mouse - True Friend
4x Fire the Cannons!
2 Maui - Hero to All
1 Maui - Hero to All
"#;

        let deck = DeckLoader::parse(content).unwrap();
        assert_eq!(deck.entries.len(), 3);
        assert_eq!(deck.total_cards(), 11);
        assert_eq!(deck.entries[0].card_name, "Mickey Mouse - True Friend");
        assert_eq!(deck.entries[1].card_name, "Fire the Cannons!");
        assert_eq!(deck.entries[1].count, 4);
        assert_eq!(deck.entries[2].count, 3);
    }

    #[test]
    fn test_bad_lines() {
        assert!(matches!(
            DeckLoader::parse("Mickey Mouse\n"),
            Err(LoreError::InvalidDeckFormat(_))
        ));
        assert!(DeckLoader::parse("0 Mickey Mouse\n").is_err());
        assert!(DeckLoader::parse("# nothing here\n").is_err());
    }

    #[test]
    fn test_constructed_limits() {
        let deck = DeckLoader::parse("5 Stitch - Rock Star\n").unwrap();
        assert!(deck.check_constructed().is_err());
        let small = DeckLoader::parse("4 Stitch - Rock Star\n").unwrap();
        assert!(small.check_constructed().is_err());
        let lines: String = (0..15).map(|i| format!("4 Card {i}\n")).collect();
        assert!(DeckLoader::parse(&lines).unwrap().check_constructed().is_ok());
    }
}
