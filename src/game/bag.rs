//! The bag: triggered abilities waiting to resolve
//!
//! Entries resolve one at a time. The entry that suspended on a choice is
//! always resumed first; otherwise the active player's entries go before
//! everyone else's, then the other players in turn order, each player's in
//! the order they were added.

use crate::core::{AbilityDefinition, CardId, PlayerId};
use crate::game::targeting::Participant;
use crate::game::{ChoiceRequest, GameEvent, ResolutionFrame};
use crate::{LoreError, Result};
use serde::{Deserialize, Serialize};

/// One queued ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagEntry {
    pub id: u64,
    pub ability: AbilityDefinition,
    pub source: Option<CardId>,
    pub controller: PlayerId,
    /// The event that triggered it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<GameEvent>,
    /// 1 for abilities triggered by a player action; one more than the
    /// resolving entry for abilities triggered during a resolution
    pub depth: u32,
    pub frame: ResolutionFrame,
    /// Has this entry started resolving (and been suspended)?
    #[serde(default)]
    pub started: bool,
    /// The request it is waiting on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<ChoiceRequest>,
    /// Targets picked by the host before the ability resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<Participant>>,
}

impl BagEntry {
    pub fn new(
        ability: AbilityDefinition,
        source: Option<CardId>,
        controller: PlayerId,
        event: Option<GameEvent>,
        depth: u32,
    ) -> Self {
        BagEntry {
            id: 0,
            ability,
            source,
            controller,
            event,
            depth,
            frame: ResolutionFrame::new(),
            started: false,
            pending: None,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Option<Vec<Participant>>) -> Self {
        self.payload = payload;
        self
    }

    pub fn label(&self) -> String {
        self.ability
            .name
            .clone()
            .unwrap_or_else(|| self.ability.text.clone())
    }
}

/// Turn-manager work deferred until the bag is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingStep {
    /// "Whenever this character challenges" abilities resolve before damage
    ChallengeDamage { attacker: CardId, defender: CardId },
    /// End-of-turn abilities have resolved; hand the turn over
    EndTurn,
    /// Start-of-turn abilities have resolved; open the main phase
    EnterMain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    entries: Vec<BagEntry>,
    next_id: u64,
    /// Chains dropped by the depth and length guards
    #[serde(default)]
    pub dropped_chains: u32,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry unless it breaks a guard
    pub fn push(&mut self, mut entry: BagEntry, max_depth: u32, max_len: usize) -> Result<u64> {
        if entry.depth > max_depth || self.entries.len() >= max_len {
            self.dropped_chains += 1;
            return Err(LoreError::RunawayTriggers { depth: entry.depth });
        }
        self.next_id += 1;
        entry.id = self.next_id;
        self.entries.push(entry);
        Ok(self.next_id)
    }

    pub fn entries(&self) -> &[BagEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry waiting on a choice, if any
    pub fn suspended(&self) -> Option<&BagEntry> {
        self.entries.iter().find(|e| e.pending.is_some())
    }

    pub fn suspended_mut(&mut self) -> Option<&mut BagEntry> {
        self.entries.iter_mut().find(|e| e.pending.is_some())
    }

    pub fn pending_request(&self) -> Option<&ChoiceRequest> {
        self.suspended().and_then(|e| e.pending.as_ref())
    }

    /// Index of the entry to resolve next; `order` is the turn order starting
    /// with the active player
    pub fn next_index(&self, order: &[PlayerId]) -> Option<usize> {
        if let Some(i) = self.entries.iter().position(|e| e.started) {
            return Some(i);
        }
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| {
                let seat = order
                    .iter()
                    .position(|p| *p == e.controller)
                    .unwrap_or(order.len());
                (seat, e.id)
            })
            .map(|(i, _)| i)
    }

    pub fn take(&mut self, index: usize) -> BagEntry {
        self.entries.remove(index)
    }

    /// Put a suspended entry back where it was
    pub fn restore(&mut self, index: usize, entry: BagEntry) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventKind, TriggerSpec};

    fn entry(controller: u32, depth: u32) -> BagEntry {
        let ability = AbilityDefinition::triggered(TriggerSpec::this_card(EventKind::CardPlayed), vec![], "test");
        BagEntry::new(ability, None, PlayerId::new(controller), None, depth)
    }

    #[test]
    fn test_active_player_first_then_fifo() {
        let mut bag = Bag::new();
        let order = [PlayerId::new(1), PlayerId::new(0)];
        let a = bag.push(entry(0, 1), 16, 256).unwrap();
        let b = bag.push(entry(1, 1), 16, 256).unwrap();
        let c = bag.push(entry(1, 1), 16, 256).unwrap();

        let first = bag.take(bag.next_index(&order).unwrap());
        assert_eq!(first.id, b);
        let second = bag.take(bag.next_index(&order).unwrap());
        assert_eq!(second.id, c);
        let third = bag.take(bag.next_index(&order).unwrap());
        assert_eq!(third.id, a);
        assert!(bag.next_index(&order).is_none());
    }

    #[test]
    fn test_suspended_entry_resumes_first() {
        let mut bag = Bag::new();
        let order = [PlayerId::new(0), PlayerId::new(1)];
        bag.push(entry(0, 1), 16, 256).unwrap();
        let late = bag.push(entry(1, 1), 16, 256).unwrap();
        let idx = bag.entries().iter().position(|e| e.id == late).unwrap();
        let mut suspended = bag.take(idx);
        suspended.started = true;
        bag.restore(idx, suspended);
        assert_eq!(bag.entries()[bag.next_index(&order).unwrap()].id, late);
    }

    #[test]
    fn test_guards_drop_entries() {
        let mut bag = Bag::new();
        assert!(matches!(
            bag.push(entry(0, 17), 16, 256),
            Err(LoreError::RunawayTriggers { depth: 17 })
        ));
        bag.push(entry(0, 1), 16, 1).unwrap();
        assert!(bag.push(entry(0, 1), 16, 1).is_err());
        assert_eq!(bag.dropped_chains, 2);
        assert_eq!(bag.len(), 1);
    }
}
