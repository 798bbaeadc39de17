//! Location family: moving characters to locations

use super::{ExecResult, GameContext};
use crate::core::{CardId, EventKind, TargetAst};
use crate::game::GameState;
use crate::zones::Zone;
use crate::{LoreError, Result};

/// Check that `character` may move to `location`; nothing is changed
pub fn check_move(game: &GameState, character: CardId, location: CardId) -> Result<()> {
    let mover = game.card(character)?;
    let place = game.card(location)?;
    if !mover.is_character() || mover.zone != Zone::Play {
        return Err(LoreError::IllegalAction(format!(
            "{} is not a character in play",
            mover.card.full_name()
        )));
    }
    if !place.is_location() || place.zone != Zone::Play {
        return Err(LoreError::IllegalAction(format!(
            "{} is not a location in play",
            place.card.full_name()
        )));
    }
    if mover.owner != place.owner {
        return Err(LoreError::IllegalAction(
            "characters only move to their owner's locations".to_string(),
        ));
    }
    if mover.location == Some(location) {
        return Err(LoreError::IllegalAction(format!(
            "{} is already at {}",
            mover.card.full_name(),
            place.card.full_name()
        )));
    }
    Ok(())
}

/// Move a character to a location, paying the move cost unless `pay` is false
///
/// Emits `CARD_MOVED` with the location as the counterpart card.
pub fn move_character(game: &mut GameState, character: CardId, location: CardId, pay: bool) -> Result<()> {
    check_move(game, character, location)?;
    let owner = game.card(character)?.owner;
    if pay {
        let cost = game.card(location)?.card.move_cost.unwrap_or(0);
        game.pay_ink(owner, cost)?;
    }
    game.card_mut(character)?.location = Some(location);
    let (who, place) = (game.card(character)?.card.full_name(), game.card(location)?.card.full_name());
    game.logger.effect(&format!("{who} moves to {place}"));
    let event = game
        .event(EventKind::CardMoved, owner)
        .with_card(character)
        .with_other(location);
    game.emit(event);
    Ok(())
}

pub(super) fn move_to_location(
    ctx: &mut GameContext<'_>,
    target: &TargetAst,
    location: &TargetAst,
    free: bool,
) -> ExecResult<()> {
    let Some(place) = ctx.resolve_cards(location, false)?.into_iter().next() else {
        return Ok(());
    };
    for character in ctx.resolve_cards(target, false)? {
        if let Err(err) = move_character(ctx.game, character, place, !free) {
            ctx.game.logger.info(&format!("move skipped: {err}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, PlayerId};
    use std::sync::Arc;

    fn setup() -> (GameState, PlayerId, CardId, CardId) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let mut harbor = Card::new("T-1", "Harbor", CardType::Location, 2).with_stats(0, 6, 1);
        harbor.move_cost = Some(1);
        let location = game.create_card(Arc::new(harbor), alice);
        let character = game.create_card(
            Arc::new(Card::new("T-2", "Ariel", CardType::Character, 2).with_stats(2, 2, 1)),
            alice,
        );
        game.move_card(location, Zone::Play).unwrap();
        game.move_card(character, Zone::Play).unwrap();
        (game, alice, character, location)
    }

    #[test]
    fn test_move_pays_cost_and_emits() {
        let (mut game, alice, character, location) = setup();
        let ink = game.create_card(Arc::new(Card::new("T-3", "Ink", CardType::Item, 1)), alice);
        game.move_card(ink, Zone::Inkwell).unwrap();
        game.take_events();

        move_character(&mut game, character, location, true).unwrap();
        assert_eq!(game.card(character).unwrap().location, Some(location));
        assert_eq!(game.available_ink(alice), 0);
        let events = game.take_events();
        assert_eq!(events[0].kind, EventKind::CardMoved);
        assert_eq!(events[0].other, Some(location));
    }

    #[test]
    fn test_move_without_ink_is_rejected_untouched() {
        let (mut game, _, character, location) = setup();
        assert!(matches!(
            move_character(&mut game, character, location, true),
            Err(LoreError::IllegalAction(_))
        ));
        assert_eq!(game.card(character).unwrap().location, None);
    }

    #[test]
    fn test_location_leaving_play_clears_characters() {
        let (mut game, _, character, location) = setup();
        move_character(&mut game, character, location, false).unwrap();
        game.move_card(location, Zone::Discard).unwrap();
        assert_eq!(game.card(character).unwrap().location, None);
    }
}
