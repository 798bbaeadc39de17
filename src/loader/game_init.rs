//! Game initialization from decks
//!
//! Creates games from deck lists and a card database

use crate::core::PlayerId;
use crate::game::{GameConfig, GameState};
use crate::loader::{CardDatabase, DeckList};
use crate::Result;
use std::sync::Arc;

/// Game builder for initializing games from decks
pub struct GameInitializer<'a> {
    card_db: &'a CardDatabase,
    config: GameConfig,
}

impl<'a> GameInitializer<'a> {
    pub fn new(card_db: &'a CardDatabase) -> Self {
        GameInitializer {
            card_db,
            config: GameConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a game with one `(name, deck)` seat per player, in turn order
    ///
    /// Every card of every deck is looked up before anything is created, so
    /// a deck naming an unknown card fails without a half-built game.
    pub fn init_game(&self, seats: &[(&str, &DeckList)]) -> Result<GameState> {
        let mut resolved = Vec::with_capacity(seats.len());
        for (_, deck) in seats {
            let mut cards = Vec::new();
            for entry in &deck.entries {
                let card = self.card_db.require(&entry.card_name)?;
                cards.push((card, entry.count));
            }
            resolved.push(cards);
        }

        let names: Vec<&str> = seats.iter().map(|(name, _)| *name).collect();
        let mut game = GameState::new(&names, self.config.clone());
        let players: Vec<PlayerId> = game.players.iter().map(|p| p.id).collect();
        for (player, cards) in players.into_iter().zip(resolved) {
            for (card, count) in cards {
                for _ in 0..count {
                    game.create_card(Arc::clone(&card), player);
                }
            }
        }
        game.logger.debug(&format!("created {} cards", game.cards.len()));
        Ok(game)
    }

    pub fn init_two_player(
        &self,
        player1: (&str, &DeckList),
        player2: (&str, &DeckList),
    ) -> Result<GameState> {
        self.init_game(&[player1, player2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType};
    use crate::loader::DeckLoader;
    use crate::zones::Zone;

    fn db() -> CardDatabase {
        let mut db = CardDatabase::new();
        db.add_card(Arc::new(
            Card::new("1", "Stitch", CardType::Character, 2).with_stats(2, 2, 1),
        ));
        db.add_card(Arc::new(
            Card::new("2", "Fire the Cannons!", CardType::Action, 1).with_text("Deal 2 damage to chosen character."),
        ));
        db
    }

    #[test]
    fn test_init_simple_game() {
        let db = db();
        let deck = DeckLoader::parse("4 Stitch\n3 Fire the Cannons!\n").unwrap();
        let game = GameInitializer::new(&db)
            .init_two_player(("Alice", &deck), ("Bob", &deck))
            .unwrap();

        assert_eq!(game.players.len(), 2);
        for player in &game.players {
            assert_eq!(game.cards_in(player.id, Zone::Deck).len(), 7);
        }
        assert_eq!(game.cards.len(), 14);
        // every instance compiled its abilities on creation
        let bolt = game
            .cards
            .iter()
            .map(|(_, c)| c)
            .find(|c| c.card.id == "2")
            .unwrap();
        assert_eq!(bolt.abilities().len(), 1);
    }

    #[test]
    fn test_missing_card_error() {
        let db = db();
        let deck = DeckLoader::parse("1 Nonexistent Card\n").unwrap();
        let result = GameInitializer::new(&db).init_two_player(("Alice", &deck), ("Bob", &deck));
        assert!(result.is_err());
    }
}
