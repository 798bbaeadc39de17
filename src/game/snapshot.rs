//! Game snapshots and checkpoint history
//!
//! A snapshot is the complete `GameState` as JSON: zones, continuous
//! effects, the bag (including a suspended entry and its journal), pending
//! events and the RNG. Restoring one resumes the game exactly, including a
//! choice that was pending when it was taken.

use crate::game::state::GameState;
use crate::game::turn_manager::TurnManager;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A saved game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The complete game state
    pub game_state: GameState,

    /// Turn number when this snapshot was created
    pub turn_number: u32,

    /// Free-form label ("before challenge", "turn 3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GameSnapshot {
    pub fn new(game_state: GameState) -> Self {
        let turn_number = game_state.turn.turn_number;
        GameSnapshot {
            game_state,
            turn_number,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: GameSnapshot =
            serde_json::from_str(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Save this snapshot to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).map_err(|e| SnapshotError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| SnapshotError::Io(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Every card listed in a zone must exist and agree about where it is
    fn validate(&self) -> Result<(), SnapshotError> {
        let game = &self.game_state;
        for player in &game.players {
            for zone in player.zones.all_zones() {
                for id in &zone.cards {
                    let card = game
                        .card(*id)
                        .map_err(|_| SnapshotError::InvalidState(format!("{} lists missing card {id}", player.name)))?;
                    if card.zone != zone.zone_type {
                        return Err(SnapshotError::InvalidState(format!(
                            "card {id} is listed in {} but records {}",
                            zone.zone_type, card.zone
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// The state, ready to play on
    pub fn restore(self) -> GameState {
        self.game_state
    }
}

/// Errors that can occur during snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialization(String),

    #[error("Failed to deserialize snapshot: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid snapshot state: {0}")]
    InvalidState(String),
}

impl From<SnapshotError> for crate::LoreError {
    fn from(err: SnapshotError) -> Self {
        crate::LoreError::Serialization(err.to_string())
    }
}

/// Checkpoints for undo
///
/// Each checkpoint is a full clone of the state; the oldest is dropped once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct GameHistory {
    checkpoints: Vec<GameSnapshot>,
    capacity: usize,
}

impl Default for GameHistory {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        GameHistory {
            checkpoints: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn checkpoint(&mut self, game: &GameState, label: impl Into<String>) {
        if self.checkpoints.len() == self.capacity {
            self.checkpoints.remove(0);
        }
        self.checkpoints
            .push(GameSnapshot::new(game.clone()).with_label(label));
    }

    /// Pop the latest checkpoint
    pub fn undo(&mut self) -> Option<GameState> {
        self.checkpoints.pop().map(GameSnapshot::restore)
    }

    pub fn peek(&self) -> Option<&GameSnapshot> {
        self.checkpoints.last()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.checkpoints
            .iter()
            .filter_map(|s| s.label.as_deref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.checkpoints.clear();
    }
}

impl TurnManager {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::new(self.game.clone())
    }

    /// Resume from a snapshot; decision providers and observers start empty
    pub fn from_snapshot(snapshot: GameSnapshot) -> Self {
        TurnManager::new(snapshot.restore())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType};
    use crate::zones::Zone;
    use std::sync::Arc;

    fn sample() -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let card = Arc::new(Card::new("T-1", "Stitch", CardType::Character, 2).with_stats(2, 2, 1));
        let id = game.create_card(Arc::clone(&card), alice);
        game.move_card(id, Zone::Play).unwrap();
        game.card_mut(id).unwrap().damage = 1;
        game.create_card(card, alice);
        game.player_mut(alice).unwrap().lore = 4;
        game
    }

    #[test]
    fn test_json_round_trip_keeps_zones() {
        let game = sample();
        let json = GameSnapshot::new(game.clone()).with_label("mid-turn").to_json().unwrap();
        let back = GameSnapshot::from_json(&json).unwrap();
        assert_eq!(back.label.as_deref(), Some("mid-turn"));
        let restored = back.restore();
        let alice = restored.players[0].id;
        assert_eq!(restored.cards_in(alice, Zone::Play), game.cards_in(alice, Zone::Play));
        assert_eq!(restored.cards_in(alice, Zone::Deck).len(), 1);
        assert_eq!(restored.player(alice).unwrap().lore, 4);
        let id = restored.cards_in(alice, Zone::Play)[0];
        assert_eq!(restored.card(id).unwrap().damage, 1);
        assert!(restored.card(id).unwrap().is_parsed());
    }

    #[test]
    fn test_inconsistent_snapshot_is_rejected() {
        let mut game = sample();
        let alice = game.players[0].id;
        let id = game.cards_in(alice, Zone::Play)[0];
        game.card_mut(id).unwrap().zone = Zone::Hand;
        let json = GameSnapshot::new(game).to_json().unwrap();
        assert!(matches!(
            GameSnapshot::from_json(&json),
            Err(SnapshotError::InvalidState(_))
        ));
    }

    #[test]
    fn test_history_undo_and_capacity() {
        let mut game = sample();
        let alice = game.players[0].id;
        let mut history = GameHistory::with_capacity(2);
        history.checkpoint(&game, "a");
        game.player_mut(alice).unwrap().lore = 5;
        history.checkpoint(&game, "b");
        game.player_mut(alice).unwrap().lore = 6;
        history.checkpoint(&game, "c");
        assert_eq!(history.labels(), vec!["b", "c"]);

        let back = history.undo().unwrap();
        assert_eq!(back.player(alice).unwrap().lore, 6);
        let back = history.undo().unwrap();
        assert_eq!(back.player(alice).unwrap().lore, 5);
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("lore-snapshot-{}.json", std::process::id()));
        GameSnapshot::new(sample()).save_to_file(&path).unwrap();
        let loaded = GameSnapshot::load_from_file(&path).unwrap();
        assert_eq!(loaded.turn_number, 1);
        std::fs::remove_file(&path).unwrap();
    }
}
