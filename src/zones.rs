//! Game zones (Deck, Hand, Play, Discard, Inkwell)

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Deck,
    Hand,
    Play,
    Discard,
    Inkwell,
    /// Beneath another card in play; tracked by the host card, not a player zone
    Under,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Deck => "deck",
            Zone::Hand => "hand",
            Zone::Play => "play",
            Zone::Discard => "discard",
            Zone::Inkwell => "inkwell",
            Zone::Under => "under",
        }
    }

    /// Zones whose contents all players can see
    pub fn is_public(&self) -> bool {
        matches!(self, Zone::Play | Zone::Discard)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An ordered collection of cards; the last element is the top
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardZone {
    /// Zone type
    pub zone_type: Zone,

    /// Owner of this zone
    pub owner: PlayerId,

    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn remove(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.cards.iter().position(|&id| id == card_id) {
            // Order-preserving: iteration order feeds deterministic choices
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Take the top card (decks)
    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// Top `n` cards, topmost first
    pub fn peek_top_n(&self, n: usize) -> Vec<CardId> {
        self.cards.iter().rev().take(n).copied().collect()
    }

    pub fn add_to_bottom(&mut self, card_id: CardId) {
        self.cards.insert(0, card_id);
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }
}

/// Collection of all zones for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerZones {
    pub deck: CardZone,
    pub hand: CardZone,
    pub play: CardZone,
    pub discard: CardZone,
    pub inkwell: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            deck: CardZone::new(Zone::Deck, player_id),
            hand: CardZone::new(Zone::Hand, player_id),
            play: CardZone::new(Zone::Play, player_id),
            discard: CardZone::new(Zone::Discard, player_id),
            inkwell: CardZone::new(Zone::Inkwell, player_id),
        }
    }

    pub fn get_zone(&self, zone: Zone) -> Option<&CardZone> {
        match zone {
            Zone::Deck => Some(&self.deck),
            Zone::Hand => Some(&self.hand),
            Zone::Play => Some(&self.play),
            Zone::Discard => Some(&self.discard),
            Zone::Inkwell => Some(&self.inkwell),
            Zone::Under => None,
        }
    }

    /// Deck, hand, play, discard and inkwell, in that order
    pub fn all_zones(&self) -> [&CardZone; 5] {
        [&self.deck, &self.hand, &self.play, &self.discard, &self.inkwell]
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Deck => Some(&mut self.deck),
            Zone::Hand => Some(&mut self.hand),
            Zone::Play => Some(&mut self.play),
            Zone::Discard => Some(&mut self.discard),
            Zone::Inkwell => Some(&mut self.inkwell),
            Zone::Under => None,
        }
    }
}
