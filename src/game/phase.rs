//! Turn phases

use crate::core::PlayerId;
use serde::{Deserialize, Serialize};

/// Phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Ready, set, draw
    Beginning,
    /// Player actions
    Main,
    /// End-of-turn triggers and cleanup
    End,
}

impl Phase {
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Beginning => Some(Phase::Main),
            Phase::Main => Some(Phase::End),
            Phase::End => None,
        }
    }
}

/// Represents the current turn structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Current turn number (starts at 1)
    pub turn_number: u32,

    pub phase: Phase,

    /// Active player (whose turn it is)
    pub active_player: PlayerId,

    /// Active player's index in `GameState::players`
    pub active_player_idx: usize,

    /// Has every player taken their first turn yet?
    pub first_round_done: bool,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId, starting_idx: usize) -> Self {
        TurnStructure {
            turn_number: 1,
            phase: Phase::Beginning,
            active_player: starting_player,
            active_player_idx: starting_idx,
            first_round_done: false,
        }
    }

    /// Advance to the next phase; false at the end of the turn
    pub fn advance_phase(&mut self) -> bool {
        if let Some(next) = self.phase.next() {
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Start a new turn
    pub fn next_turn(&mut self, next_player: PlayerId, next_idx: usize) {
        self.turn_number += 1;
        self.phase = Phase::Beginning;
        self.active_player = next_player;
        self.active_player_idx = next_idx;
    }

    pub fn is_main(&self) -> bool {
        self.phase == Phase::Main
    }
}
