//! Match configuration

use crate::game::VerbosityLevel;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Rules parameters and engine guards for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Lore needed to win
    pub lore_goal: i32,

    /// Opening hand size
    pub starting_hand: usize,

    /// Deepest allowed trigger nesting (a trigger caused by a trigger caused by ...)
    pub max_bag_depth: u32,

    /// Most abilities allowed to wait in the bag at once
    pub max_bag_len: usize,

    /// The starting player does not draw on their first turn
    pub first_player_skips_draw: bool,

    /// Seed for the shuffling RNG
    pub seed: u64,

    pub verbosity: VerbosityLevel,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lore_goal: 20,
            starting_hand: 7,
            max_bag_depth: 16,
            max_bag_len: 256,
            first_player_skips_draw: true,
            seed: 42,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

impl GameConfig {
    /// Parse a config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_lore_goal(mut self, goal: i32) -> Self {
        self.lore_goal = goal;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Caps on trigger nesting and bag growth
    pub fn with_bag_limits(mut self, max_depth: u32, max_len: usize) -> Self {
        self.max_bag_depth = max_depth;
        self.max_bag_len = max_len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.lore_goal, 20);
        assert_eq!(config.starting_hand, 7);
        assert_eq!(config.max_bag_depth, 16);
        assert!(config.first_player_skips_draw);
    }

    #[test]
    fn test_partial_json() {
        let config = GameConfig::from_json(r#"{"lore_goal": 10, "verbosity": "silent"}"#).unwrap();
        assert_eq!(config.lore_goal, 10);
        assert_eq!(config.verbosity, VerbosityLevel::Silent);
        assert_eq!(config.max_bag_len, 256);
    }

    #[test]
    fn test_builders() {
        let config = GameConfig::default().with_seed(7).with_lore_goal(5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.lore_goal, 5);
    }
}
