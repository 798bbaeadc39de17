//! Card database for looking up card templates
//!
//! Lookup is by catalogue id or by name. Names are folded (case, accents)
//! and may be either the full "Base - Version" name or, when only one
//! version exists, the base name alone.

use crate::core::{fold_text, Card};
use crate::loader::card::CardCatalog;
use crate::{LoreError, Result};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

/// Database of card templates
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    by_id: FxHashMap<String, Arc<Card>>,
    by_full_name: FxHashMap<String, Arc<Card>>,
    /// Base name to every version printed under it
    by_base_name: FxHashMap<String, Vec<Arc<Card>>>,
}

impl CardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: CardCatalog) -> Self {
        let mut db = CardDatabase::new();
        for card in catalog.into_cards() {
            db.add_card(card);
        }
        db
    }

    /// Load a JSON catalogue file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Card catalogue not found: {path:?}"),
            )));
        }
        Ok(Self::from_catalog(CardCatalog::load_from_file(path)?))
    }

    pub fn add_card(&mut self, card: Arc<Card>) {
        self.by_full_name
            .insert(fold_text(&card.full_name()), Arc::clone(&card));
        self.by_base_name
            .entry(fold_text(card.name.base_name()))
            .or_default()
            .push(Arc::clone(&card));
        self.by_id.insert(card.id.clone(), card);
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Arc<Card>> {
        self.by_id.get(id)
    }

    /// Look up a card by full name, or by base name when it is unambiguous
    pub fn get_card(&self, name: &str) -> Option<&Arc<Card>> {
        let key = fold_text(name);
        if let Some(card) = self.by_full_name.get(&key) {
            return Some(card);
        }
        match self.by_base_name.get(&key).map(Vec::as_slice) {
            Some([only]) => Some(only),
            _ => None,
        }
    }

    /// Like `get_card`, but explains a miss
    pub fn require(&self, name: &str) -> Result<Arc<Card>> {
        if let Some(card) = self.get_card(name) {
            return Ok(Arc::clone(card));
        }
        let versions = self
            .by_base_name
            .get(&fold_text(name))
            .map(Vec::len)
            .unwrap_or(0);
        if versions > 1 {
            Err(LoreError::InvalidDeckFormat(format!(
                "{name} is ambiguous ({versions} versions); use the full name"
            )))
        } else {
            Err(LoreError::InvalidDeckFormat(format!("Card not found in database: {name}")))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_card(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Arc<Card>> {
        self.by_id.values()
    }
}
