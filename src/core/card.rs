//! Card templates and in-game card instances

use crate::core::{AbilityDefinition, CardId, CardName, Duration, EntityId, GameEntity, PlayerId, Subtype};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Character,
    Action,
    /// An action that can be sung by an exerted character
    Song,
    Item,
    Location,
}

impl CardType {
    pub fn label(&self) -> &'static str {
        match self {
            CardType::Character => "character",
            CardType::Action => "action",
            CardType::Song => "song",
            CardType::Item => "item",
            CardType::Location => "location",
        }
    }

    /// Songs are actions too
    pub fn is_action(&self) -> bool {
        matches!(self, CardType::Action | CardType::Song)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkColor {
    Amber,
    Amethyst,
    Emerald,
    Ruby,
    Sapphire,
    Steel,
}

/// A named rules-text section as printed on the card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAbility {
    #[serde(default)]
    pub name: String,
    pub text: String,
}

/// Immutable card template
///
/// Loaded once from the card catalogue and shared between every instance of
/// the card through an `Arc`. Nothing in the engine mutates a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Stable catalogue id
    pub id: String,

    /// Base name (e.g., "Mickey Mouse")
    pub name: CardName,

    /// Version title (e.g., "Brave Little Tailor")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub cost: i32,

    pub color: InkColor,

    #[serde(default)]
    pub inkable: bool,

    #[serde(rename = "type")]
    pub card_type: CardType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub willpower: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<i32>,

    /// Ink cost to move a character here (locations only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_cost: Option<i32>,

    #[serde(default)]
    pub subtypes: SmallVec<[Subtype; 3]>,

    #[serde(default)]
    pub abilities: Vec<RawAbility>,

    /// Free-text rules sections not broken out into named abilities
    #[serde(default)]
    pub full_text: Vec<String>,

    /// Keyword shorthand ("Evasive", "Resist +1", "Singer 5")
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Card {
    /// Minimal template, mostly for tests and tools
    pub fn new(id: impl Into<String>, name: impl Into<CardName>, card_type: CardType, cost: i32) -> Self {
        Card {
            id: id.into(),
            name: name.into(),
            version: None,
            cost,
            color: InkColor::Amber,
            inkable: true,
            card_type,
            strength: None,
            willpower: None,
            lore: None,
            move_cost: None,
            subtypes: SmallVec::new(),
            abilities: Vec::new(),
            full_text: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_stats(mut self, strength: i32, willpower: i32, lore: i32) -> Self {
        self.strength = Some(strength);
        self.willpower = Some(willpower);
        self.lore = Some(lore);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.full_text.push(text.into());
        self
    }

    pub fn with_ability(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.abilities.push(RawAbility {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtypes.push(subtype.into());
        self
    }

    /// "Base - Version" display name
    pub fn full_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{} - {}", self.name, version),
            None => self.name.to_string(),
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.card_type == card_type || (card_type == CardType::Action && self.card_type.is_action())
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s.is(subtype))
    }
}

/// A prevention shield: absorbs up to `amount` damage before it lands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageShield {
    pub amount: i32,
    pub duration: Duration,
}

/// Ad-hoc per-instance state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceMeta {
    /// Consumed oldest first
    #[serde(default)]
    pub damage_shields: Vec<DamageShield>,

    /// Next play of this card costs nothing
    #[serde(default)]
    pub free_play: bool,

    /// Cards tucked beneath this one
    #[serde(default)]
    pub cards_under: Vec<CardId>,

    #[serde(default)]
    pub card_put_under_turn: Option<u32>,

    #[serde(default)]
    pub flags: BTreeMap<String, i64>,
}

/// A card in a game
///
/// The template is shared; everything that changes during play lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInstance {
    pub id: CardId,

    pub card: Arc<Card>,

    pub owner: PlayerId,

    pub zone: Zone,

    pub exerted: bool,

    pub damage: i32,

    /// Turn number this instance last entered play
    pub turn_played: Option<u32>,

    /// Location this character is at
    pub location: Option<CardId>,

    #[serde(default)]
    pub meta: InstanceMeta,

    /// Compiled abilities, filled on first zone entry and never recomputed
    parsed_effects: Option<Vec<AbilityDefinition>>,
}

impl CardInstance {
    pub fn new(id: CardId, card: Arc<Card>, owner: PlayerId) -> Self {
        CardInstance {
            id,
            card,
            owner,
            zone: Zone::Deck,
            exerted: false,
            damage: 0,
            turn_played: None,
            location: None,
            meta: InstanceMeta::default(),
            parsed_effects: None,
        }
    }

    /// Compile the template's text once. Later calls are no-ops.
    pub fn ensure_parsed(&mut self) {
        if self.parsed_effects.is_none() {
            self.parsed_effects = Some(crate::parser::parse_card(&self.card));
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed_effects.is_some()
    }

    /// Compiled abilities (empty until the instance has entered a zone)
    pub fn abilities(&self) -> &[AbilityDefinition] {
        self.parsed_effects.as_deref().unwrap_or(&[])
    }

    pub fn name(&self) -> &CardName {
        &self.card.name
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.card.is_type(card_type)
    }

    pub fn is_character(&self) -> bool {
        self.card.card_type == CardType::Character
    }

    pub fn is_location(&self) -> bool {
        self.card.card_type == CardType::Location
    }

    /// Printed strength (0 for cards without one)
    pub fn base_strength(&self) -> i32 {
        self.card.strength.unwrap_or(0)
    }

    pub fn base_willpower(&self) -> i32 {
        self.card.willpower.unwrap_or(0)
    }

    pub fn base_lore(&self) -> i32 {
        self.card.lore.unwrap_or(0)
    }

    pub fn exert(&mut self) {
        self.exerted = true;
    }

    pub fn ready(&mut self) {
        self.exerted = false;
    }

    /// Remove up to `amount` damage; never below zero. Returns the amount removed.
    pub fn remove_damage(&mut self, amount: i32) -> i32 {
        let removed = amount.clamp(0, self.damage);
        self.damage -= removed;
        removed
    }

    /// Run damage through the shield queue; returns what gets through
    pub fn absorb_with_shields(&mut self, mut amount: i32) -> i32 {
        while amount > 0 && !self.meta.damage_shields.is_empty() {
            let shield = &mut self.meta.damage_shields[0];
            let absorbed = shield.amount.min(amount);
            shield.amount -= absorbed;
            amount -= absorbed;
            if shield.amount <= 0 {
                self.meta.damage_shields.remove(0);
            }
        }
        amount
    }

    /// Forget in-play state when the card changes zones
    pub fn reset_play_state(&mut self) {
        self.exerted = false;
        self.damage = 0;
        self.location = None;
        self.meta.damage_shields.clear();
        self.meta.cards_under.clear();
        self.meta.card_put_under_turn = None;
        self.meta.flags.clear();
    }

    pub fn flag(&self, key: &str) -> i64 {
        self.meta.flags.get(key).copied().unwrap_or(0)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: i64) {
        self.meta.flags.insert(key.into(), value);
    }
}

impl GameEntity<CardInstance> for CardInstance {
    fn id(&self) -> EntityId<CardInstance> {
        self.id
    }

    fn name(&self) -> &str {
        self.card.name.as_str()
    }
}
