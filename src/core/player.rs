//! Player representation

use crate::core::{CardFilter, Duration, GameEntity, PlayerId, PlayerName};
use crate::zones::PlayerZones;
use serde::{Deserialize, Serialize};

/// A one-shot cost reduction ("the next character you play this turn costs 2 less")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReduction {
    pub amount: i32,
    pub filter: CardFilter,
    /// Plays left before the reduction is used up
    pub uses: u32,
    pub duration: Duration,
}

/// Represents a player in the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Lore total (never negative)
    pub lore: i32,

    /// Deck, hand, play, discard and inkwell
    pub zones: PlayerZones,

    /// Has the player put a card into their inkwell this turn?
    pub inked_this_turn: bool,

    /// Pending one-shot cost reductions
    #[serde(default)]
    pub cost_reductions: Vec<CostReduction>,

    /// Has the player lost?
    pub has_lost: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Player {
            id,
            name: name.into(),
            lore: 0,
            zones: PlayerZones::new(id),
            inked_this_turn: false,
            cost_reductions: Vec::new(),
            has_lost: false,
        }
    }

    pub fn gain_lore(&mut self, amount: i32) {
        self.lore += amount.max(0);
    }

    /// Lose lore, flooring at zero. Returns the amount actually lost.
    pub fn lose_lore(&mut self, amount: i32) -> i32 {
        let lost = amount.clamp(0, self.lore);
        self.lore -= lost;
        lost
    }

    pub fn can_ink(&self) -> bool {
        !self.inked_this_turn
    }

    /// Reset per-turn bookkeeping at the start of this player's turn
    pub fn start_turn(&mut self) {
        self.inked_this_turn = false;
        self.cost_reductions
            .retain(|r| r.duration != Duration::UntilStartOfYourNextTurn);
    }

    /// Drop reductions that only lasted this turn
    pub fn end_turn(&mut self) {
        self.cost_reductions.retain(|r| r.duration != Duration::ThisTurn);
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let id = PlayerId::new(1);
        let player = Player::new(id, "Alice");

        assert_eq!(player.id, id);
        assert_eq!(player.name.as_str(), "Alice");
        assert_eq!(player.lore, 0);
        assert!(!player.has_lost);
        assert!(player.zones.hand.is_empty());
    }

    #[test]
    fn test_lore_floor() {
        let mut player = Player::new(PlayerId::new(1), "Bob");
        player.gain_lore(3);
        assert_eq!(player.lose_lore(2), 2);
        assert_eq!(player.lore, 1);
        assert_eq!(player.lose_lore(5), 1);
        assert_eq!(player.lore, 0);
        player.gain_lore(-4);
        assert_eq!(player.lore, 0);
    }

    #[test]
    fn test_inking_once_per_turn() {
        let mut player = Player::new(PlayerId::new(1), "Charlie");
        assert!(player.can_ink());
        player.inked_this_turn = true;
        assert!(!player.can_ink());
        player.start_turn();
        assert!(player.can_ink());
    }

    #[test]
    fn test_cost_reduction_expiry() {
        let mut player = Player::new(PlayerId::new(1), "Dana");
        player.cost_reductions.push(CostReduction {
            amount: 2,
            filter: CardFilter::default(),
            uses: 1,
            duration: Duration::ThisTurn,
        });
        player.end_turn();
        assert!(player.cost_reductions.is_empty());
    }
}
