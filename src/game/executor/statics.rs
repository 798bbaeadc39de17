//! Static and continuous family
//!
//! Nothing here touches a stored stat. Every handler adds an entry to the
//! active-effects list (or a one-shot reduction on the player) and the
//! derived reads in `continuous.rs` do the rest.

use super::{hostile, ExecResult, GameContext};
use crate::core::{
    Affected, Amount, CardFilter, Condition, ContinuousKind, CostReduction, Duration, Keyword, Restriction,
    TargetAst,
};
use crate::game::{ActiveEffect, Expiry};
use crate::zones::Zone;

/// Expiry for a timed effect; "while in play" needs a source in play
fn expiry_for(ctx: &GameContext<'_>, duration: Duration) -> Expiry {
    match duration {
        Duration::WhileInPlay if !source_in_play(ctx) => Expiry::EndOfTurn,
        other => Expiry::from_duration(other, ctx.controller),
    }
}

fn source_in_play(ctx: &GameContext<'_>) -> bool {
    ctx.source
        .and_then(|s| ctx.game.card(s).ok())
        .is_some_and(|c| c.zone == Zone::Play)
}

fn add_to_cards(
    ctx: &mut GameContext<'_>,
    targets: Vec<crate::core::CardId>,
    kind: ContinuousKind,
    duration: Duration,
) {
    if targets.is_empty() {
        return;
    }
    let expiry = expiry_for(ctx, duration);
    let effect = ActiveEffect::new(
        ctx.source,
        ctx.controller,
        kind,
        Affected::Cards { ids: targets },
        expiry,
    );
    ctx.game.add_effect(effect);
}

/// "+N strength this turn" and friends; amounts are fixed when the effect resolves
pub(super) fn modify_stats(
    ctx: &mut GameContext<'_>,
    target: &TargetAst,
    [strength, willpower, lore]: [&Amount; 3],
    duration: Duration,
) -> ExecResult<()> {
    let (strength, willpower, lore) = (ctx.amount(strength), ctx.amount(willpower), ctx.amount(lore));
    let harmful = strength < 0 || willpower < 0 || lore < 0;
    let targets = ctx.resolve_cards(target, harmful)?;
    for id in &targets {
        let name = ctx.card_name(*id);
        ctx.game.logger.effect(&format!(
            "{name} gets {strength:+} strength, {willpower:+} willpower, {lore:+} lore"
        ));
    }
    add_to_cards(
        ctx,
        targets,
        ContinuousKind::StatBuff {
            strength,
            willpower,
            lore,
        },
        duration,
    );
    Ok(())
}

pub(super) fn grant_keyword(
    ctx: &mut GameContext<'_>,
    target: &TargetAst,
    keyword: &Keyword,
    duration: Duration,
) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, false)?;
    for id in &targets {
        let name = ctx.card_name(*id);
        ctx.game
            .logger
            .effect(&format!("{name} gains {}", keyword.label()));
    }
    add_to_cards(
        ctx,
        targets,
        ContinuousKind::GrantKeyword {
            keyword: keyword.clone(),
        },
        duration,
    );
    Ok(())
}

pub(super) fn restrict(
    ctx: &mut GameContext<'_>,
    target: &TargetAst,
    restriction: Restriction,
    duration: Duration,
) -> ExecResult<()> {
    let targets = ctx.resolve_cards(target, hostile(target))?;
    add_to_cards(ctx, targets, ContinuousKind::Restrict { restriction }, duration);
    Ok(())
}

/// A continuous effect created by a resolving ability
///
/// It lasts while its source stays in play, or until end of turn when the
/// source is already gone (an action card in the discard).
pub(super) fn register_continuous(
    ctx: &mut GameContext<'_>,
    modifier: &ContinuousKind,
    affected: &Affected,
    condition: Option<&Condition>,
) -> ExecResult<()> {
    let expiry = if source_in_play(ctx) {
        Expiry::WhileSourceInPlay
    } else {
        Expiry::EndOfTurn
    };
    let effect = ActiveEffect::new(ctx.source, ctx.controller, modifier.clone(), affected.clone(), expiry)
        .with_condition(condition.cloned());
    ctx.game.add_effect(effect);
    Ok(())
}

/// "The next N matching cards you play this turn cost less"
pub(super) fn cost_reduction(
    ctx: &mut GameContext<'_>,
    amount: i32,
    filter: &CardFilter,
    uses: u32,
) -> ExecResult<()> {
    let controller = ctx.controller;
    ctx.game.player_mut(controller)?.cost_reductions.push(CostReduction {
        amount,
        filter: filter.clone(),
        uses: uses.max(1),
        duration: Duration::ThisTurn,
    });
    ctx.game.logger.effect(&format!(
        "next {} {} cost {amount} less this turn",
        uses.max(1),
        filter.describe()
    ));
    Ok(())
}
