//! End-to-end determinism tests
//!
//! Two unattended games built from the same decks and seed must produce the
//! same event log, turn for turn.

use lore_engine::core::{CardType, PlayerId};
use lore_engine::game::{ActionOutcome, GameConfig, GameEvent, TurnManager, VerbosityLevel};
use lore_engine::loader::{CardDatabase, DeckLoader, GameInitializer};
use lore_engine::zones::Zone;
use similar_asserts::assert_eq;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_decks").join(name)
}

fn new_game(seed: u64) -> TurnManager {
    let db = CardDatabase::load_from_file(&fixture("cards.json")).unwrap();
    let first = DeckLoader::load_from_file(&fixture("amber_ruby.deck")).unwrap();
    let second = DeckLoader::load_from_file(&fixture("amethyst_steel.deck")).unwrap();
    let config = GameConfig::default()
        .with_seed(seed)
        .with_verbosity(VerbosityLevel::Silent);
    let game = GameInitializer::new(&db)
        .with_config(config)
        .init_two_player(("Alice", &first), ("Bob", &second))
        .unwrap();
    TurnManager::new(game)
}

/// Ink, play the first affordable card, quest with everything, pass
fn take_turn(manager: &mut TurnManager, player: PlayerId) -> ActionOutcome {
    let hand = manager.game.cards_in(player, Zone::Hand);
    if let Some(card) = hand
        .iter()
        .copied()
        .find(|id| manager.game.card(*id).unwrap().card.inkable)
    {
        manager.ink_card(player, card).unwrap();
    }

    let ink = manager.game.available_ink(player);
    if let Some(card) = manager
        .game
        .cards_in(player, Zone::Hand)
        .into_iter()
        .find(|id| manager.game.effective_cost(*id) <= ink)
    {
        // songs and locations may still be refused; that is fine here
        if let Ok(ActionOutcome::GameOver(winner)) = manager.play_card(player, card) {
            return ActionOutcome::GameOver(winner);
        }
    }

    for id in manager.game.cards_in(player, Zone::Play) {
        if manager.game.card(id).unwrap().is_type(CardType::Character) {
            if let Ok(ActionOutcome::GameOver(winner)) = manager.quest(player, id) {
                return ActionOutcome::GameOver(winner);
            }
        }
    }
    manager.pass_turn(player).unwrap()
}

fn play_out(seed: u64, turns: u32) -> (Vec<GameEvent>, Option<PlayerId>) {
    let mut manager = new_game(seed);
    let mut outcome = manager.start_game().unwrap();
    while !matches!(outcome, ActionOutcome::GameOver(_)) && manager.game.turn.turn_number <= turns {
        let player = manager.game.active_player();
        outcome = take_turn(&mut manager, player);
    }
    (manager.game.event_log.clone(), manager.game.winner)
}

#[test]
fn test_same_seed_same_game() {
    let (log_a, winner_a) = play_out(42, 20);
    let (log_b, winner_b) = play_out(42, 20);
    assert!(!log_a.is_empty());
    assert_eq!(log_a, log_b);
    assert_eq!(winner_a, winner_b);
}

#[test]
fn test_different_seeds_deal_different_hands() {
    let mut a = new_game(1);
    let mut b = new_game(2);
    a.start_game().unwrap();
    b.start_game().unwrap();
    let alice = a.game.players[0].id;
    assert_eq!(a.game.cards_in(alice, Zone::Hand).len(), 7);
    assert_ne!(a.game.cards_in(alice, Zone::Hand), b.game.cards_in(alice, Zone::Hand));
}
