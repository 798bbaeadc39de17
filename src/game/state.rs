//! Main game state structure

use crate::core::{Card, CardId, CardInstance, EntityId, EntityStore, EventKind, Player, PlayerId};
use crate::game::{ActiveEffect, Bag, GameConfig, GameEvent, GameLogger, PendingStep, TurnStructure};
use crate::zones::Zone;
use crate::{LoreError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Complete game state
///
/// This is the central structure that holds all game information. Only the
/// executor's handlers and the turn manager mutate it; everything else reads.
/// It is self-contained, so cloning or serializing it is a full checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All card instances in the game, whatever zone they are in
    pub cards: EntityStore<CardInstance>,

    /// All players, in turn order
    pub players: Vec<Player>,

    /// Turn structure
    pub turn: TurnStructure,

    /// Continuous effects currently in force
    pub active_effects: Vec<ActiveEffect>,

    /// Triggered abilities waiting to resolve
    pub bag: Bag,

    /// Turn-manager work that runs once the bag is empty
    #[serde(default)]
    pub pending_step: Option<PendingStep>,

    /// Events emitted by handlers and not yet matched against triggers
    pub pending_events: Vec<GameEvent>,

    /// Every event published so far
    pub event_log: Vec<GameEvent>,

    pub config: GameConfig,

    /// Shuffling RNG (serializable so a restored game shuffles the same way)
    pub rng: ChaCha12Rng,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,

    pub winner: Option<PlayerId>,

    /// Centralized logger for game events
    pub logger: GameLogger,
}

impl GameState {
    /// Create a new game; players take turns in the order given
    pub fn new(names: &[&str], config: GameConfig) -> Self {
        let players: Vec<Player> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Player::new(PlayerId::new(i as u32), *name))
            .collect();
        let first = players.first().map(|p| p.id).unwrap_or(PlayerId::new(0));

        GameState {
            cards: EntityStore::new(),
            turn: TurnStructure::new(first, 0),
            active_effects: Vec::new(),
            bag: Bag::new(),
            pending_step: None,
            pending_events: Vec::new(),
            event_log: Vec::new(),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            logger: GameLogger::with_verbosity(config.verbosity),
            next_entity_id: players.len() as u32,
            players,
            config,
            winner: None,
        }
    }

    /// Create a new game with two players and the default configuration
    pub fn new_two_player(player1_name: &str, player2_name: &str) -> Self {
        Self::new(&[player1_name, player2_name], GameConfig::default())
    }

    /// Reseed the shuffling RNG
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = ChaCha12Rng::seed_from_u64(seed);
    }

    /// Get next entity ID (unified across all entity types)
    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Get a player by ID
    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(LoreError::EntityNotFound(id.as_u32()))
    }

    /// Get a mutable player by ID
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(LoreError::EntityNotFound(id.as_u32()))
    }

    /// Get the index of a player by ID
    pub fn player_idx(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    pub fn is_active(&self, player: PlayerId) -> bool {
        self.turn.active_player == player
    }

    /// All players in turn order, starting with `first`
    pub fn turn_order_from(&self, first: PlayerId) -> Vec<PlayerId> {
        let start = self.player_idx(first).unwrap_or(0);
        let n = self.players.len();
        (0..n).map(|i| self.players[(start + i) % n].id).collect()
    }

    /// Every other player, in turn order after `player`
    pub fn opponents(&self, player: PlayerId) -> Vec<PlayerId> {
        self.turn_order_from(player).into_iter().skip(1).collect()
    }

    pub fn card(&self, id: CardId) -> Result<&CardInstance> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut CardInstance> {
        self.cards.get_mut(id)
    }

    /// Create an instance of `card` on top of its owner's deck
    ///
    /// The instance compiles its abilities here, on its first zone entry.
    pub fn create_card(&mut self, card: Arc<Card>, owner: PlayerId) -> CardId {
        let id = self.next_id();
        let mut instance = CardInstance::new(id, card, owner);
        instance.ensure_parsed();
        self.cards.insert(id, instance);
        if let Ok(player) = self.player_mut(owner) {
            player.zones.deck.add(id);
        }
        id
    }

    /// Cards in one of a player's zones (bottom to top for the deck)
    pub fn cards_in(&self, player: PlayerId, zone: Zone) -> Vec<CardId> {
        self.player(player)
            .ok()
            .and_then(|p| p.zones.get_zone(zone))
            .map(|z| z.cards.clone())
            .unwrap_or_default()
    }

    /// Every card in play, in turn order from the first player
    pub fn in_play(&self) -> Vec<CardId> {
        self.players
            .iter()
            .flat_map(|p| p.zones.play.cards.iter().copied())
            .collect()
    }

    /// Take a card out of wherever it is now
    fn detach(&mut self, id: CardId, to: Zone) -> Result<Zone> {
        let (owner, from) = {
            let card = self.card(id)?;
            (card.owner, card.zone)
        };
        if from == Zone::Under {
            let host = self
                .cards
                .iter()
                .find(|(_, c)| c.meta.cards_under.contains(&id))
                .map(|(host, _)| *host);
            if let Some(host) = host {
                self.card_mut(host)?.meta.cards_under.retain(|c| *c != id);
            }
        } else if let Some(zone) = self.player_mut(owner)?.zones.get_zone_mut(from) {
            zone.remove(id);
        }
        if from == Zone::Play && to != Zone::Play {
            self.leave_play(id)?;
        }
        Ok(from)
    }

    /// Clean up after a card leaves play
    fn leave_play(&mut self, id: CardId) -> Result<()> {
        let (under, is_location) = {
            let card = self.card_mut(id)?;
            let under = std::mem::take(&mut card.meta.cards_under);
            card.reset_play_state();
            card.turn_played = None;
            (under, card.is_location())
        };
        self.remove_effects_from(id);
        self.forget_affected(id);
        if is_location {
            let ids = self.in_play();
            for other in ids {
                let card = self.card_mut(other)?;
                if card.location == Some(id) {
                    card.location = None;
                }
            }
        }
        for tucked in under {
            let owner = self.card(tucked)?.owner;
            self.card_mut(tucked)?.zone = Zone::Discard;
            self.player_mut(owner)?.zones.discard.add(tucked);
        }
        Ok(())
    }

    /// Move a card to the top of one of its owner's zones
    pub fn move_card(&mut self, id: CardId, to: Zone) -> Result<()> {
        if to == Zone::Under {
            return Err(LoreError::IllegalAction(
                "cards go under a host with put_under".to_string(),
            ));
        }
        if self.card(id)?.zone == to {
            return Ok(());
        }
        let owner = self.card(id)?.owner;
        let from = self.detach(id, to)?;
        if let Some(zone) = self.player_mut(owner)?.zones.get_zone_mut(to) {
            zone.add(id);
        }

        let turn = self.turn.turn_number;
        let card = self.card_mut(id)?;
        card.zone = to;
        card.ensure_parsed();
        if to == Zone::Play && from != Zone::Play {
            card.turn_played = Some(turn);
            card.exerted = false;
            self.register_statics(id)?;
        }
        Ok(())
    }

    /// Put a card on the bottom of its owner's deck
    pub fn move_to_bottom(&mut self, id: CardId) -> Result<()> {
        let owner = self.card(id)?.owner;
        self.detach(id, Zone::Deck)?;
        self.player_mut(owner)?.zones.deck.add_to_bottom(id);
        self.card_mut(id)?.zone = Zone::Deck;
        Ok(())
    }

    /// Tuck `card` beneath `host`
    pub fn put_under(&mut self, host: CardId, card: CardId) -> Result<()> {
        if host == card {
            return Err(LoreError::IllegalAction("a card cannot go under itself".to_string()));
        }
        self.detach(card, Zone::Under)?;
        self.card_mut(card)?.zone = Zone::Under;
        let turn = self.turn.turn_number;
        let host = self.card_mut(host)?;
        host.meta.cards_under.push(card);
        host.meta.card_put_under_turn = Some(turn);
        Ok(())
    }

    /// Finish playing a paid-for card: permanents enter play, actions resolve
    /// from the discard. Emits `CARD_PLAYED`.
    pub fn complete_play(&mut self, id: CardId) -> Result<()> {
        let (owner, is_action) = {
            let card = self.card(id)?;
            (card.owner, card.card.card_type.is_action())
        };
        let to = if is_action { Zone::Discard } else { Zone::Play };
        self.move_card(id, to)?;
        self.card_mut(id)?.meta.free_play = false;
        let event = self.event(EventKind::CardPlayed, owner).with_card(id);
        self.emit(event);
        Ok(())
    }

    /// Draw the top card of a player's deck; `None` when the deck is empty
    pub fn draw_card(&mut self, player: PlayerId) -> Result<Option<CardId>> {
        let Some(id) = self.player_mut(player)?.zones.deck.draw_top() else {
            return Ok(None);
        };
        self.player_mut(player)?.zones.hand.add(id);
        let card = self.card_mut(id)?;
        card.zone = Zone::Hand;
        card.ensure_parsed();
        let event = self.event(EventKind::CardDrawn, player).with_card(id);
        self.emit(event);
        Ok(Some(id))
    }

    /// Shuffle a player's deck using the game's RNG
    pub fn shuffle_deck(&mut self, player: PlayerId) -> Result<()> {
        let rng = &mut self.rng;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player)
            .ok_or(LoreError::EntityNotFound(player.as_u32()))?;
        player.zones.deck.shuffle(rng);
        Ok(())
    }

    /// Ready cards in a player's inkwell
    pub fn available_ink(&self, player: PlayerId) -> i32 {
        self.cards_in(player, Zone::Inkwell)
            .into_iter()
            .filter(|id| self.card(*id).map(|c| !c.exerted).unwrap_or(false))
            .count() as i32
    }

    /// Exert `amount` ready ink; nothing is exerted when there is not enough
    pub fn pay_ink(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let available = self.available_ink(player);
        if available < amount {
            return Err(LoreError::IllegalAction(format!(
                "needs {amount} ink, has {available}"
            )));
        }
        let mut left = amount;
        for id in self.cards_in(player, Zone::Inkwell) {
            if left == 0 {
                break;
            }
            let card = self.card_mut(id)?;
            if !card.exerted {
                card.exert();
                left -= 1;
            }
        }
        Ok(())
    }

    /// Event stamped with the current turn
    pub fn event(&self, kind: EventKind, player: PlayerId) -> GameEvent {
        GameEvent::new(kind, player, self.turn.turn_number)
    }

    /// Queue an event for trigger matching
    pub fn emit(&mut self, event: GameEvent) {
        self.logger.debug(&format!(
            "event {} (player {}, card {:?})",
            event.kind.as_str(),
            event.player,
            event.card
        ));
        self.pending_events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Declare a winner if someone reached the lore goal or is the last one standing
    pub fn check_victory(&mut self) -> Option<PlayerId> {
        if self.winner.is_some() {
            return self.winner;
        }
        let goal = self.config.lore_goal;
        let winner = self
            .players
            .iter()
            .find(|p| !p.has_lost && p.lore >= goal)
            .map(|p| p.id)
            .or_else(|| {
                let mut standing = self.players.iter().filter(|p| !p.has_lost);
                match (standing.next(), standing.next()) {
                    (Some(last), None) if self.players.len() > 1 => Some(last.id),
                    _ => None,
                }
            });
        if let Some(id) = winner {
            let name = self.player(id).map(|p| p.name.to_string()).unwrap_or_default();
            self.logger.info(&format!("{name} wins"));
            self.winner = Some(id);
        }
        winner
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    fn character(name: &str, cost: i32) -> Arc<Card> {
        Arc::new(Card::new("T-1", name, CardType::Character, cost).with_stats(2, 3, 1))
    }

    #[test]
    fn test_create_game() {
        let game = GameState::new_two_player("Alice", "Bob");
        assert_eq!(game.players.len(), 2);
        assert_eq!(game.active_player(), game.players[0].id);
        assert_eq!(game.opponents(game.players[0].id), vec![game.players[1].id]);
    }

    #[test]
    fn test_turn_order_wraps() {
        let game = GameState::new(&["A", "B", "C"], GameConfig::default());
        let ids: Vec<_> = game.players.iter().map(|p| p.id).collect();
        assert_eq!(game.turn_order_from(ids[1]), vec![ids[1], ids[2], ids[0]]);
        assert_eq!(game.opponents(ids[2]), vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_create_card_parses_on_entry() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let id = game.create_card(character("Stitch", 2), alice);
        let card = game.card(id).unwrap();
        assert!(card.is_parsed());
        assert_eq!(card.zone, Zone::Deck);
        assert_eq!(game.cards_in(alice, Zone::Deck), vec![id]);
    }

    #[test]
    fn test_move_card_between_zones() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let id = game.create_card(character("Stitch", 2), alice);
        game.move_card(id, Zone::Play).unwrap();
        assert!(game.cards_in(alice, Zone::Deck).is_empty());
        assert_eq!(game.in_play(), vec![id]);
        assert_eq!(game.card(id).unwrap().turn_played, Some(1));

        game.card_mut(id).unwrap().damage = 2;
        game.move_card(id, Zone::Discard).unwrap();
        let card = game.card(id).unwrap();
        assert_eq!(card.damage, 0);
        assert_eq!(card.turn_played, None);
        assert_eq!(game.cards_in(alice, Zone::Discard), vec![id]);
    }

    #[test]
    fn test_cards_under_follow_host_out_of_play() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let host = game.create_card(character("Stitch", 2), alice);
        let tucked = game.create_card(character("Lilo", 1), alice);
        game.move_card(host, Zone::Play).unwrap();
        game.put_under(host, tucked).unwrap();
        assert_eq!(game.card(tucked).unwrap().zone, Zone::Under);
        assert_eq!(game.card(host).unwrap().meta.card_put_under_turn, Some(1));

        game.move_card(host, Zone::Hand).unwrap();
        assert_eq!(game.card(tucked).unwrap().zone, Zone::Discard);
        assert!(game.card(host).unwrap().meta.cards_under.is_empty());
    }

    #[test]
    fn test_draw_from_empty_deck() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        assert_eq!(game.draw_card(alice).unwrap(), None);
        let id = game.create_card(character("Stitch", 2), alice);
        assert_eq!(game.draw_card(alice).unwrap(), Some(id));
        assert_eq!(game.take_events()[0].kind, EventKind::CardDrawn);
    }

    #[test]
    fn test_pay_ink_is_all_or_nothing() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        for _ in 0..2 {
            let id = game.create_card(character("Ink", 1), alice);
            game.move_card(id, Zone::Inkwell).unwrap();
        }
        assert_eq!(game.available_ink(alice), 2);
        assert!(game.pay_ink(alice, 3).is_err());
        assert_eq!(game.available_ink(alice), 2);
        game.pay_ink(alice, 2).unwrap();
        assert_eq!(game.available_ink(alice), 0);
    }

    #[test]
    fn test_victory_on_lore_goal() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let bob = game.players[1].id;
        assert_eq!(game.check_victory(), None);
        game.player_mut(bob).unwrap().gain_lore(20);
        assert_eq!(game.check_victory(), Some(bob));
        assert!(game.is_game_over());
    }

    #[test]
    fn test_last_player_standing_wins() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        game.player_mut(alice).unwrap().has_lost = true;
        assert_eq!(game.check_victory(), Some(bob));
    }
}
