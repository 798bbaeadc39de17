//! Continuous effects and derived card values
//!
//! Buffs, keyword grants, restrictions and cost reductions are entries in
//! `GameState::active_effects`. Stored card fields always hold printed
//! values; every derived read folds the live list over them, so expiry is a
//! list operation and stacking order never matters.
//!
//! Whether an effect applies (its affected filter and its condition) is
//! decided against base stats. A buff conditioned on strength therefore never
//! has to evaluate itself.

use crate::core::{
    has_printed_keyword, AbilityKind, Affected, CardId, CardInstance, Condition, ContinuousKind,
    Duration, EffectAst, Keyword, PlayerId, Restriction, StatLens,
};
use crate::game::executor::eval::evaluate_condition;
use crate::game::GameState;
use crate::zones::Zone;
use crate::Result;
use serde::{Deserialize, Serialize};

/// When an active effect ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "player", rename_all = "snake_case")]
pub enum Expiry {
    EndOfTurn,
    /// At the start of this player's next turn
    StartOfTurn(PlayerId),
    /// As long as the source card stays in play
    WhileSourceInPlay,
}

impl Expiry {
    pub fn from_duration(duration: Duration, controller: PlayerId) -> Self {
        match duration {
            Duration::ThisTurn => Expiry::EndOfTurn,
            Duration::UntilStartOfYourNextTurn => Expiry::StartOfTurn(controller),
            Duration::WhileInPlay => Expiry::WhileSourceInPlay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: u32,
    pub source: Option<CardId>,
    pub controller: PlayerId,
    pub kind: ContinuousKind,
    pub affected: Affected,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub expiry: Expiry,
}

impl ActiveEffect {
    pub fn new(
        source: Option<CardId>,
        controller: PlayerId,
        kind: ContinuousKind,
        affected: Affected,
        expiry: Expiry,
    ) -> Self {
        ActiveEffect {
            id: 0,
            source,
            controller,
            kind,
            affected,
            condition: None,
            expiry,
        }
    }

    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }
}

impl GameState {
    /// Add an effect to the active list and return its id
    pub fn add_effect(&mut self, mut effect: ActiveEffect) -> u32 {
        effect.id = self.next_id::<ActiveEffect>().as_u32();
        self.logger.debug(&format!(
            "effect #{} registered: {:?} on {:?} ({:?})",
            effect.id, effect.kind, effect.affected, effect.expiry
        ));
        let id = effect.id;
        self.active_effects.push(effect);
        id
    }

    /// Register a card's static abilities as it enters play
    ///
    /// A card's reduction of its own cost only matters in hand and is read
    /// from the instance by `effective_cost`, so it is not registered.
    pub fn register_statics(&mut self, id: CardId) -> Result<()> {
        let (owner, statics) = {
            let card = self.card(id)?;
            let statics: Vec<(ContinuousKind, Affected, Option<Condition>)> = card
                .abilities()
                .iter()
                .filter(|a| a.kind == AbilityKind::Static)
                .flat_map(|a| a.effects.iter())
                .filter_map(|effect| match effect {
                    EffectAst::Continuous {
                        modifier,
                        affected,
                        condition,
                    } => Some((modifier.clone(), affected.clone(), condition.clone())),
                    _ => None,
                })
                .filter(|(kind, affected, _)| {
                    !(matches!(kind, ContinuousKind::CostReduction { .. })
                        && *affected == Affected::SelfCard)
                })
                .collect();
            (card.owner, statics)
        };
        for (kind, affected, condition) in statics {
            let effect = ActiveEffect::new(Some(id), owner, kind, affected, Expiry::WhileSourceInPlay)
                .with_condition(condition);
            self.add_effect(effect);
        }
        Ok(())
    }

    /// Drop the statics a card contributed while in play
    pub fn remove_effects_from(&mut self, source: CardId) {
        self.active_effects
            .retain(|e| !(e.source == Some(source) && e.expiry == Expiry::WhileSourceInPlay));
    }

    /// A card that left play is a new object: timed effects on it end
    pub(crate) fn forget_affected(&mut self, id: CardId) {
        for effect in self.active_effects.iter_mut() {
            if let Affected::Cards { ids } = &mut effect.affected {
                ids.retain(|c| *c != id);
            }
        }
        self.active_effects
            .retain(|e| !matches!(&e.affected, Affected::Cards { ids } if ids.is_empty()));
    }

    /// End "this turn" effects and shields
    pub fn expire_end_of_turn(&mut self) {
        let before = self.active_effects.len();
        self.active_effects.retain(|e| e.expiry != Expiry::EndOfTurn);
        let expired = before - self.active_effects.len();
        if expired > 0 {
            self.logger.debug(&format!("{expired} effect(s) expired at end of turn"));
        }
        for id in self.in_play() {
            if let Ok(card) = self.card_mut(id) {
                card.meta
                    .damage_shields
                    .retain(|s| s.duration != Duration::ThisTurn);
            }
        }
    }

    /// End "until the start of your next turn" effects of `player`
    pub fn expire_start_of_turn(&mut self, player: PlayerId) {
        self.active_effects
            .retain(|e| e.expiry != Expiry::StartOfTurn(player));
        for id in self.cards_in(player, Zone::Play) {
            if let Ok(card) = self.card_mut(id) {
                card.meta
                    .damage_shields
                    .retain(|s| s.duration != Duration::UntilStartOfYourNextTurn);
            }
        }
    }

    fn effect_applies(&self, effect: &ActiveEffect, card: &CardInstance) -> bool {
        let covered = match &effect.affected {
            Affected::SelfCard => effect.source == Some(card.id),
            Affected::YourCards { filter } => {
                card.zone == Zone::Play
                    && card.owner == effect.controller
                    && filter.matches(self, card, effect.source, StatLens::Base)
            }
            Affected::OpposingCards { filter } => {
                card.zone == Zone::Play
                    && card.owner != effect.controller
                    && filter.matches(self, card, effect.source, StatLens::Base)
            }
            Affected::You => false,
            Affected::Cards { ids } => ids.contains(&card.id),
        };
        covered && self.effect_condition_holds(effect)
    }

    fn effect_condition_holds(&self, effect: &ActiveEffect) -> bool {
        match &effect.condition {
            Some(condition) => {
                evaluate_condition(self, condition, effect.controller, effect.source, StatLens::Base)
            }
            None => true,
        }
    }

    /// Active effects that currently modify `id`
    pub fn effects_on(&self, id: CardId) -> Vec<&ActiveEffect> {
        let Ok(card) = self.card(id) else {
            return Vec::new();
        };
        self.active_effects
            .iter()
            .filter(|e| self.effect_applies(e, card))
            .collect()
    }

    /// Derived strength, floored at zero
    pub fn strength(&self, id: CardId) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        let bonus: i32 = self
            .effects_on(id)
            .iter()
            .map(|e| match &e.kind {
                ContinuousKind::StatBuff { strength, .. } => *strength,
                ContinuousKind::StatPerDamage { strength } => strength * card.damage,
                _ => 0,
            })
            .sum();
        (card.base_strength() + bonus).max(0)
    }

    /// Derived willpower, floored at zero
    /// Damage at or above derived willpower. Cards printed without a
    /// willpower never qualify; a willpower reduced to 0 does.
    pub fn has_lethal_damage(&self, id: CardId) -> bool {
        let Ok(card) = self.card(id) else {
            return false;
        };
        card.card.willpower.is_some() && card.damage >= self.willpower(id)
    }

    pub fn willpower(&self, id: CardId) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        let bonus: i32 = self
            .effects_on(id)
            .iter()
            .map(|e| match &e.kind {
                ContinuousKind::StatBuff { willpower, .. } => *willpower,
                _ => 0,
            })
            .sum();
        (card.base_willpower() + bonus).max(0)
    }

    /// Derived lore, floored at zero
    pub fn lore(&self, id: CardId) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        let bonus: i32 = self
            .effects_on(id)
            .iter()
            .map(|e| match &e.kind {
                ContinuousKind::StatBuff { lore, .. } => *lore,
                _ => 0,
            })
            .sum();
        (card.base_lore() + bonus).max(0)
    }

    /// Printed or granted keyword (parameter ignored)
    pub fn has_keyword(&self, id: CardId, keyword: &Keyword) -> bool {
        let Ok(card) = self.card(id) else {
            return false;
        };
        has_printed_keyword(card, keyword)
            || self.effects_on(id).iter().any(|e| {
                matches!(&e.kind, ContinuousKind::GrantKeyword { keyword: granted } if granted.same_kind(keyword))
            })
    }

    /// Sum of a numeric keyword's printed and granted values ("Resist +1" twice is +2)
    pub fn keyword_value(&self, id: CardId, keyword: &Keyword) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        let printed: i32 = card
            .abilities()
            .iter()
            .flat_map(|a| a.effects.iter())
            .map(|effect| match effect {
                EffectAst::Keyword { keyword: k } if k.same_kind(keyword) => k.value(),
                _ => 0,
            })
            .sum();
        let granted: i32 = self
            .effects_on(id)
            .iter()
            .map(|e| match &e.kind {
                ContinuousKind::GrantKeyword { keyword: k } if k.same_kind(keyword) => k.value(),
                _ => 0,
            })
            .sum();
        printed + granted
    }

    pub fn has_restriction(&self, id: CardId, restriction: Restriction) -> bool {
        self.effects_on(id).iter().any(|e| {
            matches!(&e.kind, ContinuousKind::Restrict { restriction: r } if *r == restriction)
        })
    }

    /// Cost this character counts as when singing a song
    pub fn sing_value(&self, id: CardId) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        let base = if self.has_keyword(id, &Keyword::Singer(0)) {
            self.keyword_value(id, &Keyword::Singer(0))
        } else {
            card.card.cost
        };
        let buff: i32 = self
            .effects_on(id)
            .iter()
            .map(|e| match &e.kind {
                ContinuousKind::SingBuff { amount } => *amount,
                _ => 0,
            })
            .sum();
        base + buff
    }

    /// Ink needed to play `id` from hand right now
    ///
    /// Sums the controller's registered reductions, the card's own
    /// "pay N less to play this" statics (whose conditions are checked live)
    /// and one-shot reductions waiting on the player. Never below zero.
    pub fn effective_cost(&self, id: CardId) -> i32 {
        let Ok(card) = self.card(id) else {
            return 0;
        };
        if card.meta.free_play {
            return 0;
        }
        let owner = card.owner;

        let registered: i32 = self
            .active_effects
            .iter()
            .filter(|e| e.affected == Affected::You && e.controller == owner)
            .filter_map(|e| match &e.kind {
                ContinuousKind::CostReduction { amount, filter }
                    if filter.matches(self, card, e.source, StatLens::Base)
                        && self.effect_condition_holds(e) =>
                {
                    Some(*amount)
                }
                _ => None,
            })
            .sum();

        let own: i32 = card
            .abilities()
            .iter()
            .filter(|a| a.kind == AbilityKind::Static)
            .flat_map(|a| a.effects.iter())
            .filter_map(|effect| match effect {
                EffectAst::Continuous {
                    modifier: ContinuousKind::CostReduction { amount, .. },
                    affected: Affected::SelfCard,
                    condition,
                } => {
                    let holds = condition.as_ref().map_or(true, |c| {
                        evaluate_condition(self, c, owner, Some(id), StatLens::Base)
                    });
                    holds.then_some(*amount)
                }
                _ => None,
            })
            .sum();

        let pending: i32 = self
            .player(owner)
            .map(|p| {
                p.cost_reductions
                    .iter()
                    .filter(|r| r.uses > 0 && r.filter.matches(self, card, None, StatLens::Base))
                    .map(|r| r.amount)
                    .sum()
            })
            .unwrap_or(0);

        (card.card.cost - registered - own - pending).max(0)
    }

    /// Use up one-shot reductions that applied to a card just played
    pub fn consume_cost_reductions(&mut self, id: CardId) -> Result<()> {
        let owner = self.card(id)?.owner;
        let matching: Vec<usize> = {
            let card = self.card(id)?;
            self.player(owner)?
                .cost_reductions
                .iter()
                .enumerate()
                .filter(|(_, r)| r.uses > 0 && r.filter.matches(self, card, None, StatLens::Base))
                .map(|(i, _)| i)
                .collect()
        };
        let player = self.player_mut(owner)?;
        for i in matching {
            player.cost_reductions[i].uses -= 1;
        }
        player.cost_reductions.retain(|r| r.uses > 0);
        Ok(())
    }
}
