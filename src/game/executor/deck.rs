//! Deck and zone family: draws, searches, look-and-sort, inkwell transfers

use super::{hostile, ExecResult, GameContext};
use crate::core::{
    Amount, CardFilter, CardId, EventKind, LookPick, PickDestination, RestPlacement, StatLens, TargetAst,
};
use crate::game::{ChoiceKind, ChoiceOption, ChoiceRequest, ChoiceValue, GameState};
use crate::zones::Zone;
use crate::Result;

/// Put a card that is already in its owner's deck on top of it
fn put_on_top(game: &mut GameState, id: CardId) -> Result<()> {
    let owner = game.card(id)?.owner;
    if game.card(id)?.zone != Zone::Deck {
        game.move_card(id, Zone::Deck)?;
        return Ok(());
    }
    let deck = &mut game.player_mut(owner)?.zones.deck;
    deck.remove(id);
    deck.add(id);
    Ok(())
}

/// Move a card into its owner's inkwell; emits `CARD_INKED`
pub fn ink(game: &mut GameState, id: CardId, exerted: bool) -> Result<()> {
    let owner = game.card(id)?.owner;
    game.move_card(id, Zone::Inkwell)?;
    game.card_mut(id)?.exerted = exerted;
    let event = game.event(EventKind::CardInked, owner).with_card(id);
    game.emit(event);
    Ok(())
}

fn place(ctx: &mut GameContext<'_>, id: CardId, destination: PickDestination, reveal: bool) -> Result<()> {
    let name = ctx.card_name(id);
    if reveal {
        ctx.game.logger.info(&format!("revealed {name}"));
    }
    match destination {
        PickDestination::Hand => {
            ctx.game.move_card(id, Zone::Hand)?;
            ctx.game.logger.effect(&format!("{name} put into hand"));
        }
        PickDestination::TopOfDeck => put_on_top(ctx.game, id)?,
        PickDestination::Inkwell => ink(ctx.game, id, false)?,
    }
    Ok(())
}

/// Options for `ids`, invalid where the filter does not match
fn filtered_options(ctx: &GameContext<'_>, ids: &[CardId], filter: Option<&CardFilter>) -> Vec<ChoiceOption> {
    ids.iter()
        .map(|id| {
            let option = ChoiceOption::new(ChoiceValue::Card(*id), ctx.card_name(*id));
            let matches = match (filter, ctx.game.card(*id)) {
                (Some(filter), Ok(card)) => filter.matches(ctx.game, card, ctx.source, StatLens::Derived),
                (None, Ok(_)) => true,
                (_, Err(_)) => false,
            };
            match filter {
                Some(filter) if !matches => option.invalid(format!("not a {}", filter.describe())),
                _ => option,
            }
        })
        .collect()
}

pub(super) fn draw(ctx: &mut GameContext<'_>, player: &TargetAst, amount: &Amount) -> ExecResult<()> {
    let players = ctx.resolve_players(player)?;
    let n = ctx.amount(amount);
    for player in players {
        for _ in 0..n {
            if ctx.game.draw_card(player)?.is_none() {
                let name = ctx.player_name(player);
                ctx.game.logger.info(&format!("{name} has no cards left to draw"));
                break;
            }
        }
    }
    Ok(())
}

pub(super) fn return_to_hand(ctx: &mut GameContext<'_>, target: &TargetAst, harmful: bool) -> ExecResult<()> {
    for id in ctx.resolve_cards(target, harmful)? {
        ctx.game.move_card(id, Zone::Hand)?;
        let name = ctx.card_name(id);
        ctx.game.logger.effect(&format!("{name} returned to hand"));
    }
    Ok(())
}

pub(super) fn shuffle_into_deck(ctx: &mut GameContext<'_>, target: &TargetAst) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, hostile(target))?;
    let mut owners = Vec::new();
    for id in targets {
        let owner = ctx.game.card(id)?.owner;
        ctx.game.move_card(id, Zone::Deck)?;
        if !owners.contains(&owner) {
            owners.push(owner);
        }
    }
    for owner in owners {
        ctx.game.shuffle_deck(owner)?;
    }
    Ok(())
}

pub(super) fn put_into_inkwell(ctx: &mut GameContext<'_>, target: &TargetAst, exerted: bool) -> ExecResult<()> {
    for id in ctx.resolve_cards(target, hostile(target))? {
        ink(ctx.game, id, exerted)?;
        let name = ctx.card_name(id);
        ctx.game.logger.effect(&format!("{name} put into the inkwell"));
    }
    Ok(())
}

pub(super) fn ink_from_hand(ctx: &mut GameContext<'_>, exerted: bool) -> ExecResult<()> {
    let hand = ctx.game.cards_in(ctx.controller, Zone::Hand);
    if hand.is_empty() {
        ctx.game.logger.info("no card in hand to ink");
        return Ok(());
    }
    let request = ChoiceRequest::new(
        ctx.controller,
        ChoiceKind::Pick,
        "Choose a card to put into your inkwell",
        ctx.card_options(&hand),
        1,
        1,
    );
    for id in ctx.ask_cards(request)? {
        ink(ctx.game, id, exerted)?;
    }
    Ok(())
}

pub(super) fn ink_top_of_deck(ctx: &mut GameContext<'_>, exerted: bool) -> ExecResult<()> {
    let top = ctx
        .game
        .player(ctx.controller)?
        .zones
        .deck
        .peek_top();
    match top {
        Some(id) => ink(ctx.game, id, exerted)?,
        None => ctx.game.logger.info("deck is empty; nothing to ink"),
    }
    Ok(())
}

pub(super) fn mill(ctx: &mut GameContext<'_>, player: &TargetAst, amount: &Amount) -> ExecResult<()> {
    let n = ctx.amount(amount).max(0) as usize;
    for player in ctx.resolve_players(player)? {
        let top = ctx.game.player(player)?.zones.deck.peek_top_n(n);
        if top.is_empty() {
            let name = ctx.player_name(player);
            ctx.game.logger.info(&format!("{name} has no cards to put into the discard"));
        }
        for id in top {
            ctx.game.move_card(id, Zone::Discard)?;
        }
    }
    Ok(())
}

/// Search the deck for one matching card
///
/// The deck is shuffled afterwards when asked; a card bound for the top of
/// the deck goes there after the shuffle.
pub(super) fn search_deck(
    ctx: &mut GameContext<'_>,
    filter: &CardFilter,
    destination: PickDestination,
    reveal: bool,
    shuffle: bool,
) -> ExecResult<()> {
    let controller = ctx.controller;
    let deck = ctx.game.cards_in(controller, Zone::Deck);
    let options = filtered_options(ctx, &deck, Some(filter));
    let found = if options.iter().any(|o| o.valid) {
        let request = ChoiceRequest::new(
            controller,
            ChoiceKind::Pick,
            format!("Search your deck for {}", filter.describe()),
            options,
            0,
            1,
        )
        .declinable();
        ctx.ask_cards(request)?
    } else {
        ctx.game.logger.info(&format!("no {} in deck", filter.describe()));
        Vec::new()
    };

    if destination == PickDestination::TopOfDeck {
        if shuffle {
            ctx.game.shuffle_deck(controller)?;
        }
        for id in found {
            place(ctx, id, destination, reveal)?;
        }
    } else {
        for id in found {
            place(ctx, id, destination, reveal)?;
        }
        if shuffle {
            ctx.game.shuffle_deck(controller)?;
        }
    }
    Ok(())
}

/// Look at the top cards, take up to `pick.max` of them, sort the rest
pub(super) fn look_at_top(
    ctx: &mut GameContext<'_>,
    count: i32,
    pick: Option<&LookPick>,
    rest: RestPlacement,
) -> ExecResult<()> {
    let controller = ctx.controller;
    let looked = ctx
        .game
        .player(controller)?
        .zones
        .deck
        .peek_top_n(count.max(0) as usize);
    if looked.is_empty() {
        ctx.game.logger.info("deck is empty; nothing to look at");
        return Ok(());
    }

    let picked = match pick {
        Some(pick) => {
            let options = filtered_options(ctx, &looked, pick.filter.as_ref());
            if options.iter().any(|o| o.valid) {
                let request = ChoiceRequest::new(
                    controller,
                    ChoiceKind::Pick,
                    format!("Choose up to {} card(s)", pick.max),
                    options,
                    0,
                    pick.max as usize,
                )
                .declinable();
                ctx.ask_cards(request)?
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };
    let remaining: Vec<CardId> = looked.iter().copied().filter(|id| !picked.contains(id)).collect();

    let to_bottom = match rest {
        RestPlacement::Bottom => remaining.clone(),
        RestPlacement::TopOrBottom if !remaining.is_empty() => {
            let request = ChoiceRequest::new(
                controller,
                ChoiceKind::Bottom,
                "Choose cards to put on the bottom of your deck",
                ctx.card_options(&remaining),
                0,
                remaining.len(),
            )
            .declinable();
            ctx.ask_cards(request)?
        }
        _ => Vec::new(),
    };

    if let Some(pick) = pick {
        for id in &picked {
            place(ctx, *id, pick.destination, pick.reveal)?;
        }
    }
    match rest {
        RestPlacement::Discard => {
            for id in &remaining {
                ctx.game.move_card(*id, Zone::Discard)?;
            }
        }
        RestPlacement::Top => {}
        RestPlacement::Bottom | RestPlacement::TopOrBottom => {
            for id in &to_bottom {
                ctx.game.move_to_bottom(*id)?;
            }
        }
    }
    ctx.game.logger.effect(&format!(
        "looked at {} card(s): {} taken, {} to the bottom",
        looked.len(),
        picked.len(),
        to_bottom.len()
    ));
    Ok(())
}

/// Reveal the top card; put it somewhere if it matches, elsewhere if not
pub(super) fn reveal_top(
    ctx: &mut GameContext<'_>,
    filter: &CardFilter,
    on_match: PickDestination,
    otherwise: RestPlacement,
) -> ExecResult<()> {
    let Some(top) = ctx.game.player(ctx.controller)?.zones.deck.peek_top() else {
        ctx.game.logger.info("deck is empty; nothing to reveal");
        return Ok(());
    };
    let matches = {
        let card = ctx.game.card(top)?;
        filter.matches(ctx.game, card, ctx.source, StatLens::Derived)
    };
    if matches {
        place(ctx, top, on_match, true)?;
        return Ok(());
    }
    let name = ctx.card_name(top);
    ctx.game.logger.info(&format!("revealed {name}"));
    match otherwise {
        RestPlacement::Top | RestPlacement::TopOrBottom => {}
        RestPlacement::Bottom => ctx.game.move_to_bottom(top)?,
        RestPlacement::Discard => ctx.game.move_card(top, Zone::Discard)?,
    }
    Ok(())
}

/// Put the top card of the controller's deck under each target
pub(super) fn put_card_under(ctx: &mut GameContext<'_>, target: &TargetAst) -> ExecResult<()> {
    for host in ctx.resolve_cards(target, false)? {
        let Some(top) = ctx.game.player(ctx.controller)?.zones.deck.peek_top() else {
            ctx.game.logger.info("deck is empty; no card to put under");
            return Ok(());
        };
        ctx.game.put_under(host, top)?;
        let name = ctx.card_name(host);
        ctx.game.logger.effect(&format!("put a card under {name}"));
    }
    Ok(())
}

pub(super) fn set_exerted(ctx: &mut GameContext<'_>, target: &TargetAst, exerted: bool) -> ExecResult<()> {
    let harmful = exerted && hostile(target);
    for id in ctx.resolve_cards(target, harmful)? {
        let card = ctx.game.card_mut(id)?;
        if exerted {
            card.exert();
        } else {
            card.ready();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, PlayerId};
    use crate::game::{DecisionHub, GameLogger, ResolutionFrame, ScriptedAnswer, ScriptedProvider};
    use std::sync::Arc;

    fn setup() -> (GameState, PlayerId, Vec<CardId>) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        game.logger = GameLogger::capturing();
        let alice = game.players[0].id;
        // bottom to top: cost 1..=5
        let deck = (1..=5)
            .map(|cost| {
                let card = Card::new(format!("T-{cost}"), format!("Card {cost}"), CardType::Character, cost)
                    .with_stats(1, 1, 1)
                    .with_subtype(if cost % 2 == 0 { "Hero" } else { "Villain" });
                game.create_card(Arc::new(card), alice)
            })
            .collect();
        (game, alice, deck)
    }

    #[test]
    fn test_draw_from_empty_deck_is_not_an_error() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        game.logger = GameLogger::capturing();
        let alice = game.players[0].id;
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, None);
        assert!(draw(&mut ctx, &TargetAst::You, &Amount::fixed(2)).is_ok());
        assert_eq!(
            game.logger
                .logs()
                .count_matching(crate::game::LogLevel::Info, "no cards left to draw"),
            1
        );
    }

    #[test]
    fn test_look_at_top_pick_and_bottom() {
        let (mut game, alice, deck) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, None);
        let pick = LookPick {
            filter: None,
            max: 1,
            destination: PickDestination::Hand,
            reveal: false,
        };
        assert!(look_at_top(&mut ctx, 3, Some(&pick), RestPlacement::Bottom).is_ok());
        // top three are costs 5, 4, 3; the policy takes the most expensive
        assert_eq!(game.cards_in(alice, Zone::Hand), vec![deck[4]]);
        let order = game.cards_in(alice, Zone::Deck);
        assert_eq!(order.len(), 4);
        assert!(order[..2].contains(&deck[3]) && order[..2].contains(&deck[2]));
    }

    #[test]
    fn test_search_respects_filter() {
        let (mut game, alice, deck) = setup();
        let mut hub = DecisionHub::unattended();
        hub.register(
            alice,
            Box::new(ScriptedProvider::new(vec![ScriptedAnswer::Values(vec![ChoiceValue::Card(
                deck[4],
            )])])),
        );
        let mut frame = ResolutionFrame::new();
        let heroes = CardFilter::characters().with_subtype("Hero");
        {
            let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, None);
            // card 5 is a villain: the scripted answer is rejected and resolution waits
            assert!(matches!(
                search_deck(&mut ctx, &heroes, PickDestination::Hand, true, true),
                Err(super::super::Interrupt::Suspend(_))
            ));
        }
        assert!(game.cards_in(alice, Zone::Hand).is_empty());

        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, None);
        assert!(search_deck(&mut ctx, &heroes, PickDestination::Hand, true, true).is_ok());
        assert_eq!(game.cards_in(alice, Zone::Hand), vec![deck[3]]);
    }

    #[test]
    fn test_reveal_top_miss_goes_to_bottom() {
        let (mut game, alice, deck) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, None);
        let heroes = CardFilter::characters().with_subtype("Hero");
        assert!(reveal_top(&mut ctx, &heroes, PickDestination::Hand, RestPlacement::Bottom).is_ok());
        assert!(game.cards_in(alice, Zone::Hand).is_empty());
        assert_eq!(game.cards_in(alice, Zone::Deck)[0], deck[4]);
    }

    #[test]
    fn test_put_card_under_and_ink_top() {
        let (mut game, alice, deck) = setup();
        let host = game.create_card(
            Arc::new(Card::new("T-9", "Host", CardType::Character, 3).with_stats(1, 3, 1)),
            alice,
        );
        game.move_card(host, Zone::Play).unwrap();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(host));
        assert!(put_card_under(&mut ctx, &TargetAst::ThisCard).is_ok());
        assert!(ink_top_of_deck(&mut ctx, true).is_ok());
        assert_eq!(game.card(host).unwrap().meta.cards_under, vec![deck[4]]);
        assert_eq!(game.card(deck[4]).unwrap().zone, Zone::Under);
        assert_eq!(game.cards_in(alice, Zone::Inkwell), vec![deck[3]]);
        assert!(game.card(deck[3]).unwrap().exerted);
        assert_eq!(game.available_ink(alice), 0);
    }
}
