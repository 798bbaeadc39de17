//! Lore and opponent-interaction family
//!
//! Effects aimed at "each opponent" and at "chosen opponent" go through the
//! same per-player loop; the affected player is always the one who decides.

use super::{damage, ExecResult, GameContext};
use crate::core::{Amount, CardFilter, CardId, ForcedAction, PlayerId, Side, TargetAst};
use crate::game::targeting::{candidates, Candidate};
use crate::game::{ChoiceKind, ChoiceRequest};
use crate::zones::Zone;

pub(super) fn gain_lore(ctx: &mut GameContext<'_>, amount: &Amount) -> ExecResult<()> {
    let amount = ctx.amount(amount);
    let controller = ctx.controller;
    ctx.game.player_mut(controller)?.gain_lore(amount);
    let name = ctx.player_name(controller);
    ctx.game.logger.effect(&format!("{name} gains {amount} lore"));
    Ok(())
}

/// Lore loss never takes a player below zero
pub(super) fn lose_lore(ctx: &mut GameContext<'_>, player: &TargetAst, amount: &Amount) -> ExecResult<()> {
    let amount = ctx.amount(amount);
    for player in ctx.resolve_players(player)? {
        let lost = ctx.game.player_mut(player)?.lose_lore(amount);
        let name = ctx.player_name(player);
        ctx.game.logger.effect(&format!("{name} loses {lost} lore"));
    }
    Ok(())
}

/// Each affected player picks one of their own matching cards to lose
pub(super) fn opponent_chooses(
    ctx: &mut GameContext<'_>,
    player: &TargetAst,
    action: ForcedAction,
    filter: &CardFilter,
) -> ExecResult<()> {
    let players = ctx.resolve_players(player)?;
    let mut picks: Vec<(PlayerId, CardId)> = Vec::new();

    for player in players {
        let listed = candidates(ctx.game, filter, Side::Yours, player, ctx.source, false);
        if !listed.iter().any(|c| c.valid) {
            let name = ctx.player_name(player);
            ctx.game
                .logger
                .info(&format!("{name} has no {} to choose", filter.describe()));
            continue;
        }
        let verb = match action {
            ForcedAction::Banish => "banish",
            ForcedAction::ReturnToHand => "return to your hand",
            ForcedAction::Exert => "exert",
        };
        let request = ChoiceRequest::new(
            player,
            ChoiceKind::Sacrifice,
            format!("Choose {} to {verb}", filter.describe()),
            listed.iter().map(Candidate::to_option).collect(),
            1,
            1,
        );
        if let Some(id) = ctx.ask_cards(request)?.into_iter().next() {
            picks.push((player, id));
        }
    }

    for (_, id) in picks {
        match action {
            ForcedAction::Banish => damage::banish(ctx.game, id, ctx.source, false)?,
            ForcedAction::ReturnToHand => {
                ctx.game.move_card(id, Zone::Hand)?;
                let name = ctx.card_name(id);
                ctx.game.logger.effect(&format!("{name} returned to hand"));
            }
            ForcedAction::Exert => ctx.game.card_mut(id)?.exert(),
        }
    }
    Ok(())
}

pub(super) fn reveal_hand(ctx: &mut GameContext<'_>, player: &TargetAst) -> ExecResult<()> {
    for player in ctx.resolve_players(player)? {
        let names: Vec<String> = ctx
            .game
            .cards_in(player, Zone::Hand)
            .into_iter()
            .map(|id| ctx.card_name(id))
            .collect();
        let name = ctx.player_name(player);
        if names.is_empty() {
            ctx.game.logger.info(&format!("{name} reveals an empty hand"));
        } else {
            ctx.game
                .logger
                .info(&format!("{name} reveals: {}", names.join(", ")));
        }
    }
    Ok(())
}
