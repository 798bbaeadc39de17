//! Live evaluation of conditions, counts and amounts
//!
//! Nothing here is cached: every call reads the state as it is right now, so
//! a "for each" fired by a card entering play already counts that card.

use crate::core::{Amount, CardId, Condition, CountExpr, Owner, PlayerId, Stat, StatLens};
use crate::game::GameState;
use crate::zones::Zone;

/// Players whose zones a count looks at
fn counted_players(game: &GameState, owner: Owner, controller: PlayerId) -> Vec<PlayerId> {
    match owner {
        Owner::You => vec![controller],
        Owner::Opponents => game.opponents(controller),
        Owner::Any => game.turn_order_from(controller),
    }
}

/// Number of cards matching a count expression (before its multiplier)
pub fn count_matching(
    game: &GameState,
    count: &CountExpr,
    controller: PlayerId,
    source: Option<CardId>,
    lens: StatLens,
) -> i32 {
    let ids: Vec<CardId> = if count.source == Zone::Under {
        source
            .and_then(|s| game.card(s).ok())
            .map(|c| c.meta.cards_under.clone())
            .unwrap_or_default()
    } else {
        counted_players(game, count.owner, controller)
            .into_iter()
            .flat_map(|p| game.cards_in(p, count.source))
            .collect()
    };
    ids.into_iter()
        .filter_map(|id| game.card(id).ok())
        .filter(|card| match &count.filter {
            Some(filter) => filter.matches(game, card, source, lens),
            None => true,
        })
        .count() as i32
}

/// A stat of a card as seen through `lens`
pub fn stat_value(game: &GameState, id: CardId, stat: Stat, lens: StatLens) -> i32 {
    let Ok(card) = game.card(id) else {
        return 0;
    };
    match (stat, lens) {
        (Stat::Strength, StatLens::Derived) => game.strength(id),
        (Stat::Willpower, StatLens::Derived) => game.willpower(id),
        (Stat::Lore, StatLens::Derived) => game.lore(id),
        (Stat::Strength, StatLens::Base) => card.base_strength(),
        (Stat::Willpower, StatLens::Base) => card.base_willpower(),
        (Stat::Lore, StatLens::Base) => card.base_lore(),
        (Stat::Cost, _) => card.card.cost,
        (Stat::Damage, _) => card.damage,
    }
}

pub fn evaluate_condition(
    game: &GameState,
    condition: &Condition,
    controller: PlayerId,
    source: Option<CardId>,
    lens: StatLens,
) -> bool {
    let source_card = source.and_then(|s| game.card(s).ok());
    match condition {
        Condition::Count { count, cmp, value } => {
            cmp.holds(count_matching(game, count, controller, source, lens), *value)
        }
        Condition::InkAvailable { cmp, value } => cmp.holds(game.available_ink(controller), *value),
        Condition::SourceInZone { zone } => source_card.is_some_and(|c| c.zone == *zone),
        Condition::SourceStat { stat, cmp, value } => {
            source.is_some_and(|s| cmp.holds(stat_value(game, s, *stat, lens), *value))
        }
        Condition::SourceExerted { exerted } => source_card.is_some_and(|c| c.exerted == *exerted),
        Condition::SourceAtLocation => source_card.is_some_and(|c| c.location.is_some()),
        Condition::PutCardUnderThisTurn => source_card
            .is_some_and(|c| c.meta.card_put_under_turn == Some(game.turn.turn_number)),
        Condition::OpponentHasMoreLore => {
            let mine = game.player(controller).map(|p| p.lore).unwrap_or(0);
            game.opponents(controller)
                .into_iter()
                .filter_map(|p| game.player(p).ok())
                .any(|p| p.lore > mine)
        }
        Condition::YourTurn => game.is_active(controller),
        Condition::Not { condition } => {
            !evaluate_condition(game, condition, controller, source, lens)
        }
    }
}

/// Resolve an amount against live state
pub fn evaluate_amount(
    game: &GameState,
    amount: &Amount,
    controller: PlayerId,
    source: Option<CardId>,
) -> i32 {
    match amount {
        Amount::Fixed { value } => *value,
        Amount::Count(count) => {
            count_matching(game, count, controller, source, StatLens::Derived) * count.per
        }
        Amount::SourceStat { stat } => source
            .map(|s| stat_value(game, s, *stat, StatLens::Derived))
            .unwrap_or(0),
    }
}
