//! Choice family: discards, free plays, returning cards from the discard

use super::{ExecResult, GameContext};
use crate::core::{Amount, CardFilter, CardId, EventKind, PlayerId, StatLens, TargetAst};
use crate::game::{ChoiceKind, ChoiceOption, ChoiceRequest, ChoiceValue};
use crate::zones::Zone;

/// Cards of `player`'s `zone` as options, invalid where `filter` rejects them
fn zone_options(
    ctx: &GameContext<'_>,
    player: PlayerId,
    zone: Zone,
    filter: Option<&CardFilter>,
) -> Vec<ChoiceOption> {
    ctx.game
        .cards_in(player, zone)
        .into_iter()
        .filter_map(|id| ctx.game.card(id).ok())
        .map(|card| {
            let option = ChoiceOption::new(ChoiceValue::Card(card.id), card.card.full_name());
            match filter {
                Some(filter) if !filter.matches(ctx.game, card, ctx.source, StatLens::Derived) => {
                    option.invalid(format!("not a {}", filter.describe()))
                }
                _ => option,
            }
        })
        .collect()
}

/// Each affected player picks and discards cards from their own hand
///
/// Every player's choice is gathered before any card moves. A player with
/// an empty hand is skipped with an informational log entry.
pub(super) fn choose_and_discard(
    ctx: &mut GameContext<'_>,
    player: &TargetAst,
    amount: &Amount,
    filter: Option<&CardFilter>,
) -> ExecResult<()> {
    let players = ctx.resolve_players(player)?;
    let n = ctx.amount(amount).max(0) as usize;
    let mut discards: Vec<(PlayerId, Vec<CardId>)> = Vec::new();

    for player in players {
        let name = ctx.player_name(player);
        if ctx.game.cards_in(player, Zone::Hand).is_empty() {
            ctx.game.logger.info(&format!("{name} has no cards to discard"));
            continue;
        }
        let options = zone_options(ctx, player, Zone::Hand, filter);
        let eligible = options.iter().filter(|o| o.valid).count();
        let k = n.min(eligible);
        if k == 0 {
            ctx.game.logger.info(&format!("{name} has no eligible card to discard"));
            continue;
        }
        let request = ChoiceRequest::new(
            player,
            ChoiceKind::Discard,
            format!("Choose {k} card(s) to discard"),
            options,
            k,
            k,
        );
        discards.push((player, ctx.ask_cards(request)?));
    }

    for (player, ids) in discards {
        for id in ids {
            ctx.game.move_card(id, Zone::Discard)?;
            let name = ctx.card_name(id);
            ctx.game.logger.effect(&format!("discarded {name}"));
            let event = ctx.game.event(EventKind::CardDiscarded, player).with_card(id);
            ctx.game.emit(event);
        }
    }
    Ok(())
}

/// Play a matching card from `from` without paying its cost
pub(super) fn play_for_free(ctx: &mut GameContext<'_>, filter: &CardFilter, from: Zone) -> ExecResult<()> {
    let controller = ctx.controller;
    let options = zone_options(ctx, controller, from, Some(filter));
    if !options.iter().any(|o| o.valid) {
        ctx.game
            .logger
            .info(&format!("no {} in {} to play for free", filter.describe(), from));
        return Ok(());
    }
    let request = ChoiceRequest::new(
        controller,
        ChoiceKind::FreePlay,
        format!("Choose {} to play for free", filter.describe()),
        options,
        0,
        1,
    )
    .declinable();
    for id in ctx.ask_cards(request)? {
        ctx.game.card_mut(id)?.meta.free_play = true;
        ctx.game.complete_play(id)?;
        let name = ctx.card_name(id);
        ctx.game.logger.action(&format!("played {name} for free"));
    }
    Ok(())
}

pub(super) fn return_from_discard(ctx: &mut GameContext<'_>, filter: &CardFilter, count: u32) -> ExecResult<()> {
    let controller = ctx.controller;
    let options = zone_options(ctx, controller, Zone::Discard, Some(filter));
    let eligible = options.iter().filter(|o| o.valid).count();
    if eligible == 0 {
        ctx.game
            .logger
            .info(&format!("no {} in the discard", filter.describe()));
        return Ok(());
    }
    let k = (count.max(1) as usize).min(eligible);
    let request = ChoiceRequest::new(
        controller,
        ChoiceKind::Pick,
        format!("Return {} from your discard", filter.describe()),
        options,
        k,
        k,
    );
    for id in ctx.ask_cards(request)? {
        ctx.game.move_card(id, Zone::Hand)?;
        let name = ctx.card_name(id);
        ctx.game.logger.effect(&format!("returned {name} to hand"));
    }
    Ok(())
}
