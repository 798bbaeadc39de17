//! Damage and combat family
//!
//! Damage goes through Resist first, then the card's prevention shields, and
//! only what is left lands on the damage counter. Lethal damage is not
//! checked here; the turn manager's state check banishes after each
//! resolution.

use super::{ExecResult, GameContext};
use crate::core::{Amount, CardId, DamageShield, Duration, EventKind, Keyword, TargetAst};
use crate::game::{ChoiceKind, ChoiceRequest, ChoiceValue, GameState};
use crate::parser::effects::ALL_DAMAGE;
use crate::zones::Zone;
use crate::Result;
use smallvec::SmallVec;

/// Deal damage to a card in play; returns the damage that landed
///
/// Emits `CARD_DAMAGED` when any damage lands. `by` is the card dealing it.
pub fn apply_damage(game: &mut GameState, id: CardId, amount: i32, by: Option<CardId>) -> Result<i32> {
    if amount <= 0 || game.card(id)?.zone != Zone::Play {
        return Ok(0);
    }
    let resist = game.keyword_value(id, &Keyword::Resist(0));
    let after_resist = (amount - resist).max(0);
    let (dealt, owner, name) = {
        let card = game.card_mut(id)?;
        let dealt = card.absorb_with_shields(after_resist);
        card.damage += dealt;
        (dealt, card.owner, card.card.full_name())
    };
    if dealt < amount {
        game.logger
            .debug(&format!("{name}: {} of {amount} damage prevented", amount - dealt));
    }
    if dealt > 0 {
        game.logger.effect(&format!("{name} takes {dealt} damage"));
        let mut event = game.event(EventKind::CardDamaged, owner).with_card(id).with_amount(dealt);
        if let Some(by) = by {
            event = event.with_other(by);
        }
        game.emit(event);
    }
    Ok(dealt)
}

/// Banish a card in play to its owner's discard; emits `CARD_BANISHED`
pub fn banish(game: &mut GameState, id: CardId, by: Option<CardId>, in_challenge: bool) -> Result<()> {
    let (owner, name, zone) = {
        let card = game.card(id)?;
        (card.owner, card.card.full_name(), card.zone)
    };
    if zone != Zone::Play {
        return Ok(());
    }
    game.move_card(id, Zone::Discard)?;
    game.logger.effect(&format!("{name} is banished"));
    let mut event = game.event(EventKind::CardBanished, owner).with_card(id);
    if let Some(by) = by {
        event = event.with_other(by);
    }
    if in_challenge {
        event = event.during_challenge();
    }
    game.emit(event);
    Ok(())
}

/// Challenge damage: each side deals its strength to the other at once
///
/// The attacker adds its Challenger bonus. Locations deal no damage back.
pub fn resolve_challenge_damage(game: &mut GameState, attacker: CardId, defender: CardId) -> Result<()> {
    let attacker_in_play = game.card(attacker)?.zone == Zone::Play;
    let defender_in_play = game.card(defender)?.zone == Zone::Play;
    if !attacker_in_play || !defender_in_play {
        game.logger.info("challenge fizzles: a participant left play");
        return Ok(());
    }

    let to_defender = game.strength(attacker) + game.keyword_value(attacker, &Keyword::Challenger(0));
    let to_attacker = if game.card(defender)?.is_location() {
        0
    } else {
        game.strength(defender)
    };

    apply_challenge_damage(game, defender, to_defender, attacker)?;
    apply_challenge_damage(game, attacker, to_attacker, defender)?;

    for (id, by) in [(defender, attacker), (attacker, defender)] {
        if game.card(id)?.zone == Zone::Play && game.has_lethal_damage(id) {
            banish(game, id, Some(by), true)?;
        }
    }
    Ok(())
}

fn apply_challenge_damage(game: &mut GameState, id: CardId, amount: i32, by: CardId) -> Result<()> {
    let before = game.pending_events.len();
    apply_damage(game, id, amount, Some(by))?;
    for event in game.pending_events.iter_mut().skip(before) {
        event.in_challenge = true;
    }
    Ok(())
}

pub(super) fn deal_damage(ctx: &mut GameContext<'_>, target: &TargetAst, amount: &Amount) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, true)?;
    if targets.is_empty() {
        return Ok(());
    }
    let amount = ctx.amount(amount);
    for id in targets {
        apply_damage(ctx.game, id, amount, ctx.source)?;
    }
    Ok(())
}

/// One point at a time among the chosen characters
pub(super) fn distribute_damage(ctx: &mut GameContext<'_>, amount: i32, target: &TargetAst) -> ExecResult<()> {
    if amount <= 0 {
        return Ok(());
    }
    let (filter, side) = match target {
        TargetAst::Chosen { filter, side, .. } | TargetAst::Each { filter, side } => (filter, *side),
        other => {
            let ids = ctx.resolve_cards(other, true)?;
            for id in ids {
                apply_damage(ctx.game, id, amount, ctx.source)?;
            }
            return Ok(());
        }
    };
    let listed = crate::game::targeting::candidates(ctx.game, filter, side, ctx.controller, ctx.source, true);
    if !listed.iter().any(|c| c.valid) {
        ctx.game.logger.info("distribute damage: no valid target");
        return Ok(());
    }
    let n = amount as usize;
    let request = ChoiceRequest::new(
        ctx.controller,
        ChoiceKind::Distribute,
        format!("Distribute {amount} damage"),
        listed.iter().map(|c| c.to_option()).collect(),
        n,
        n,
    );
    let picks = ctx.ask(request)?;

    let mut tally: SmallVec<[(CardId, i32); 4]> = SmallVec::new();
    for value in picks {
        if let ChoiceValue::Card(id) = value {
            match tally.iter_mut().find(|(c, _)| *c == id) {
                Some((_, points)) => *points += 1,
                None => tally.push((id, 1)),
            }
        }
    }
    for (id, points) in tally {
        apply_damage(ctx.game, id, points, ctx.source)?;
    }
    Ok(())
}

/// Move damage counters from one character to another
///
/// Moved damage is not dealt: no Resist, no shields, no event.
pub(super) fn move_damage(ctx: &mut GameContext<'_>, amount: &Amount, from: &TargetAst, to: &TargetAst) -> ExecResult<()> {
    let Some(source) = ctx.resolve_cards(from, false)?.into_iter().next() else {
        return Ok(());
    };
    let Some(dest) = ctx.resolve_cards(to, true)?.into_iter().next() else {
        return Ok(());
    };
    if source == dest {
        return Ok(());
    }
    let wanted = ctx.amount(amount);
    let moved = ctx.game.card_mut(source)?.remove_damage(wanted);
    if moved == 0 {
        ctx.game.logger.info("no damage to move");
        return Ok(());
    }
    ctx.game.card_mut(dest)?.damage += moved;
    let (from_name, to_name) = (ctx.card_name(source), ctx.card_name(dest));
    ctx.game
        .logger
        .effect(&format!("moved {moved} damage from {from_name} to {to_name}"));
    Ok(())
}

/// Remove damage, never below zero; `None` removes all of it
pub(super) fn remove_damage(ctx: &mut GameContext<'_>, target: &TargetAst, amount: Option<&Amount>) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, false)?;
    let amount = amount.map_or(i32::MAX, |a| ctx.amount(a));
    for id in targets {
        let removed = ctx.game.card_mut(id)?.remove_damage(amount);
        if removed > 0 {
            let name = ctx.card_name(id);
            ctx.game.logger.effect(&format!("removed {removed} damage from {name}"));
        }
    }
    Ok(())
}

/// Queue a prevention shield on each target
pub(super) fn prevent_damage(ctx: &mut GameContext<'_>, target: &TargetAst, amount: i32, duration: Duration) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, false)?;
    for id in targets {
        ctx.game
            .card_mut(id)?
            .meta
            .damage_shields
            .push(DamageShield { amount, duration });
        let name = ctx.card_name(id);
        if amount == ALL_DAMAGE {
            ctx.game.logger.effect(&format!("{name} takes no damage"));
        } else {
            ctx.game.logger.effect(&format!("{name} will prevent {amount} damage"));
        }
    }
    Ok(())
}

pub(super) fn banish_target(ctx: &mut GameContext<'_>, target: &TargetAst) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, true)?;
    for id in targets {
        banish(ctx.game, id, ctx.source, false)?;
    }
    Ok(())
}
