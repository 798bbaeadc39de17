//! Snapshot and undo tests
//!
//! A game saved in the middle of a choice resumes exactly where it stopped.

use lore_engine::core::{Card, CardId, CardType, PlayerId};
use lore_engine::game::{
    ChoiceResponse, ChoiceValue, GameHistory, GameSnapshot, GameState, PendingProvider, Phase, TurnManager,
};
use lore_engine::zones::Zone;
use similar_asserts::assert_eq;
use std::sync::Arc;

fn put(manager: &mut TurnManager, card: Card, owner: PlayerId, zone: Zone) -> CardId {
    let id = manager.game.create_card(Arc::new(card), owner);
    manager.game.move_card(id, zone).unwrap();
    id
}

fn setup() -> (TurnManager, PlayerId, PlayerId) {
    let game = GameState::new_two_player("Alice", "Bob");
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    let mut manager = TurnManager::new(game);
    manager.game.turn.phase = Phase::Main;
    for i in 0..3 {
        put(
            &mut manager,
            Card::new(format!("I-{i}"), "Ink", CardType::Item, 1),
            alice,
            Zone::Inkwell,
        );
    }
    (manager, alice, bob)
}

#[test]
fn test_resume_pending_choice_from_json() {
    let (mut manager, alice, bob) = setup();
    manager.decisions.register(alice, Box::new(PendingProvider));
    let jafar = put(
        &mut manager,
        Card::new("C-1", "Jafar", CardType::Character, 4).with_stats(3, 5, 1),
        bob,
        Zone::Play,
    );
    // a second candidate keeps the target ambiguous
    let iago = put(
        &mut manager,
        Card::new("C-5", "Iago", CardType::Character, 1).with_stats(1, 2, 1),
        bob,
        Zone::Play,
    );
    let bolt = put(
        &mut manager,
        Card::new("A-1", "Fire the Cannons!", CardType::Action, 1).with_text("Deal 2 damage to chosen character."),
        alice,
        Zone::Hand,
    );

    let request = manager.play_card(alice, bolt).unwrap().request().cloned().unwrap();
    let json = manager.snapshot().with_label("awaiting target").to_json().unwrap();

    let mut resumed = TurnManager::from_snapshot(GameSnapshot::from_json(&json).unwrap());
    assert_eq!(resumed.pending_choice(), Some(&request));
    assert_eq!(resumed.game.available_ink(alice), 2);

    let answer = ChoiceResponse::of_values(request.id.clone(), &[ChoiceValue::Card(jafar)]);
    assert!(resumed.submit_choice(answer).unwrap().is_ready());
    assert_eq!(resumed.game.card(jafar).unwrap().damage, 2);
    assert_eq!(resumed.game.card(iago).unwrap().damage, 0);
    assert_eq!(resumed.game.card(bolt).unwrap().zone, Zone::Discard);

    // the original is untouched
    assert_eq!(manager.game.card(jafar).unwrap().damage, 0);
}

#[test]
fn test_round_trip_keeps_zone_accessors() {
    let (mut manager, alice, bob) = setup();
    let hero = put(
        &mut manager,
        Card::new("C-2", "Mulan", CardType::Character, 3).with_stats(3, 3, 2),
        alice,
        Zone::Play,
    );
    put(
        &mut manager,
        Card::new("C-3", "Shan Yu", CardType::Character, 5).with_stats(5, 5, 2),
        bob,
        Zone::Hand,
    );
    manager.game.card_mut(hero).unwrap().damage = 1;

    let json = serde_json::to_string(&manager.game).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();
    for player in [alice, bob] {
        for zone in [Zone::Deck, Zone::Hand, Zone::Play, Zone::Discard, Zone::Inkwell] {
            assert_eq!(restored.cards_in(player, zone), manager.game.cards_in(player, zone));
        }
    }
    assert_eq!(restored.available_ink(alice), 3);
    assert_eq!(restored.strength(hero), 3);
    assert_eq!(restored.card(hero).unwrap().damage, 1);
    assert_eq!(restored.player(bob).unwrap().name, manager.game.player(bob).unwrap().name);
}

#[test]
fn test_undo_restores_before_action() {
    let (mut manager, alice, _) = setup();
    let card = put(
        &mut manager,
        Card::new("C-4", "Lefou", CardType::Character, 2)
            .with_stats(1, 2, 1)
            .with_text("When you play this character, gain 1 lore."),
        alice,
        Zone::Hand,
    );
    let mut history = GameHistory::new();
    history.checkpoint(&manager.game, "before play");
    manager.play_card(alice, card).unwrap();
    assert_eq!(manager.game.player(alice).unwrap().lore, 1);

    manager.game = history.undo().unwrap();
    assert_eq!(manager.game.player(alice).unwrap().lore, 0);
    assert_eq!(manager.game.card(card).unwrap().zone, Zone::Hand);
    assert_eq!(manager.game.available_ink(alice), 3);
}
