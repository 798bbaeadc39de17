//! Effect executor
//!
//! `execute` walks an effect tree against a `GameContext`. Control nodes
//! (conditional, optional, sequence, for-each, choose-one) are handled here;
//! every leaf goes to its family handler. The match is exhaustive, so a new
//! effect kind does not compile until it has a handler.
//!
//! Resolution can stop at any choice. Each completed leaf, each decided
//! branch and each fixed count is written to the entry's `ResolutionFrame`.
//! When the ability resumes, the tree is walked again from the top and the
//! journal is replayed: finished leaves are skipped and earlier decisions are
//! reused. Handlers ask every question before they mutate anything, so a
//! leaf that suspended has not changed the game.

pub mod choice;
pub mod damage;
pub mod deck;
pub mod eval;
pub mod location;
pub mod opponent;
pub mod statics;

use crate::core::{
    AbilityDefinition, Amount, CardId, Condition, EffectAst, PlayerId, Side, StatLens, TargetAst,
};
use crate::game::targeting::Participant;
use crate::game::{
    ChoiceKind, ChoiceOption, ChoicePoll, ChoiceRequest, ChoiceValue, DecisionHub, GameEvent,
    GameState, ResolutionFrame, StepRecord,
};
use crate::LoreError;

/// Why execution stopped early
#[derive(Debug)]
pub enum Interrupt {
    /// Waiting on this request; resume with the answer
    Suspend(ChoiceRequest),
    /// The ability cannot continue
    Fatal(LoreError),
}

impl From<LoreError> for Interrupt {
    fn from(err: LoreError) -> Self {
        Interrupt::Fatal(err)
    }
}

pub type ExecResult<T> = std::result::Result<T, Interrupt>;

/// Everything a handler may touch while one ability resolves
pub struct GameContext<'a> {
    pub game: &'a mut GameState,
    pub decisions: &'a mut DecisionHub,
    /// The player the ability belongs to
    pub controller: PlayerId,
    pub source: Option<CardId>,
    /// The event that triggered the ability
    pub event: Option<GameEvent>,
    /// Targets resolved before execution (a host UI picked them up front)
    pub payload: Option<Vec<Participant>>,
    pub frame: &'a mut ResolutionFrame,
    /// Bag entry id, used in request ids
    pub entry_id: u64,
}

impl<'a> GameContext<'a> {
    pub fn new(
        game: &'a mut GameState,
        decisions: &'a mut DecisionHub,
        frame: &'a mut ResolutionFrame,
        controller: PlayerId,
        source: Option<CardId>,
    ) -> Self {
        GameContext {
            game,
            decisions,
            controller,
            source,
            event: None,
            payload: None,
            frame,
            entry_id: 0,
        }
    }

    pub fn amount(&self, amount: &Amount) -> i32 {
        eval::evaluate_amount(self.game, amount, self.controller, self.source)
    }

    pub fn condition_holds(&self, condition: &Condition) -> bool {
        eval::evaluate_condition(self.game, condition, self.controller, self.source, StatLens::Derived)
    }

    pub fn card_name(&self, id: CardId) -> String {
        self.game
            .card(id)
            .map(|c| c.card.full_name())
            .unwrap_or_else(|_| format!("card {id}"))
    }

    pub fn player_name(&self, id: PlayerId) -> String {
        self.game
            .player(id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|_| format!("player {id}"))
    }

    /// Options for a list of cards, all valid
    pub fn card_options(&self, ids: &[CardId]) -> Vec<ChoiceOption> {
        ids.iter()
            .map(|id| ChoiceOption::new(ChoiceValue::Card(*id), self.card_name(*id)))
            .collect()
    }

    /// Issue a request and return the selected values
    ///
    /// An answer stored in the frame (from an earlier pass over this step)
    /// is reused if it is still valid. Otherwise the deciding player's
    /// provider is asked, or the unattended policy when there is none.
    pub fn ask(&mut self, mut request: ChoiceRequest) -> ExecResult<Vec<ChoiceValue>> {
        let id = self.frame.next_request_id(self.entry_id);
        request.id = id.clone();

        if let Some(answer) = self.frame.answer_for(&id).cloned() {
            match request.validate(&answer) {
                Ok(values) => return Ok(values),
                Err(err) => {
                    self.game
                        .logger
                        .warn(&format!("answer to {id} is no longer valid: {err}"));
                    self.frame.forget_answer(&id);
                }
            }
        }

        match self.decisions.poll(self.game, &request) {
            ChoicePoll::Ready(response) => match request.validate(&response) {
                Ok(values) => {
                    self.frame.answer(response);
                    Ok(values)
                }
                Err(err) => {
                    self.game.logger.warn(&format!("rejected response to {id}: {err}"));
                    Err(Interrupt::Suspend(request))
                }
            },
            ChoicePoll::Pending => Err(Interrupt::Suspend(request)),
        }
    }

    /// Cards selected by a request
    pub fn ask_cards(&mut self, request: ChoiceRequest) -> ExecResult<Vec<CardId>> {
        Ok(self
            .ask(request)?
            .into_iter()
            .filter_map(|value| match value {
                ChoiceValue::Card(id) => Some(id),
                _ => None,
            })
            .collect())
    }

    /// Run a leaf once; skipped if the journal says it already ran
    fn atomic(&mut self, run: impl FnOnce(&mut Self) -> ExecResult<()>) -> ExecResult<()> {
        match self.frame.replay() {
            Some(StepRecord::Atomic) => Ok(()),
            Some(other) => Err(journal_mismatch("atomic step", other)),
            None => {
                run(self)?;
                self.frame.record(StepRecord::Atomic);
                Ok(())
            }
        }
    }

    fn branch(&mut self, decide: impl FnOnce(&mut Self) -> ExecResult<bool>) -> ExecResult<bool> {
        match self.frame.replay() {
            Some(StepRecord::Branch(taken)) => Ok(taken),
            Some(other) => Err(journal_mismatch("branch", other)),
            None => {
                let taken = decide(self)?;
                self.frame.record(StepRecord::Branch(taken));
                Ok(taken)
            }
        }
    }

    fn fixed_count(&mut self, count: impl FnOnce(&Self) -> i32) -> ExecResult<i32> {
        match self.frame.replay() {
            Some(StepRecord::Count(n)) => Ok(n),
            Some(other) => Err(journal_mismatch("count", other)),
            None => {
                let n = count(self).max(0);
                self.frame.record(StepRecord::Count(n));
                Ok(n)
            }
        }
    }

    fn pick_mode(&mut self, options: &[EffectAst]) -> ExecResult<usize> {
        match self.frame.replay() {
            Some(StepRecord::Pick(i)) => Ok(i),
            Some(other) => Err(journal_mismatch("mode pick", other)),
            None => {
                let choices = options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| ChoiceOption::new(ChoiceValue::Mode(i), option.tag()))
                    .collect();
                let request = ChoiceRequest::new(self.controller, ChoiceKind::Mode, "Choose one", choices, 1, 1);
                let picked = self
                    .ask(request)?
                    .into_iter()
                    .find_map(|value| match value {
                        ChoiceValue::Mode(i) => Some(i),
                        _ => None,
                    })
                    .unwrap_or(0);
                self.frame.record(StepRecord::Pick(picked));
                Ok(picked)
            }
        }
    }

    /// Ask the controller whether to use a "may" effect
    fn confirm(&mut self, effect: &EffectAst) -> ExecResult<bool> {
        let request = ChoiceRequest::new(
            self.controller,
            ChoiceKind::Confirm,
            format!("Use {}?", effect.tag()),
            vec![ChoiceOption::new(ChoiceValue::Accept, "Yes")],
            1,
            1,
        )
        .declinable();
        Ok(!self.ask(request)?.is_empty())
    }
}

fn journal_mismatch(expected: &str, found: StepRecord) -> Interrupt {
    Interrupt::Fatal(LoreError::JournalMismatch(format!(
        "expected {expected}, found {found:?}"
    )))
}

/// Does an effect aimed at `target` work against what it picks?
///
/// Only targets restricted to your own cards count as friendly.
pub(crate) fn hostile(target: &TargetAst) -> bool {
    !matches!(
        target,
        TargetAst::Chosen { side: Side::Yours, .. } | TargetAst::Each { side: Side::Yours, .. }
    )
}

/// Execute one effect node
pub fn execute(effect: &EffectAst, ctx: &mut GameContext<'_>) -> ExecResult<()> {
    match effect {
        EffectAst::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let holds = ctx.branch(|ctx| Ok(ctx.condition_holds(condition)))?;
            if holds {
                execute(then, ctx)
            } else if let Some(otherwise) = otherwise {
                execute(otherwise, ctx)
            } else {
                ctx.game.logger.debug("condition not met");
                Ok(())
            }
        }
        EffectAst::Optional { effect } => {
            if ctx.branch(|ctx| ctx.confirm(effect))? {
                execute(effect, ctx)
            } else {
                ctx.game.logger.info(&format!("declined {}", effect.tag()));
                Ok(())
            }
        }
        EffectAst::Sequence { effects } => {
            for effect in effects {
                execute(effect, ctx)?;
            }
            Ok(())
        }
        EffectAst::ForEach { count, effect } => {
            let times = ctx.fixed_count(|ctx| {
                eval::count_matching(ctx.game, count, ctx.controller, ctx.source, StatLens::Derived) * count.per
            })?;
            for _ in 0..times {
                execute(effect, ctx)?;
            }
            Ok(())
        }
        EffectAst::ChooseOne { options } => {
            if options.is_empty() {
                return Ok(());
            }
            let picked = ctx.pick_mode(options)?;
            match options.get(picked) {
                Some(option) => execute(option, ctx),
                None => Err(Interrupt::Fatal(LoreError::InvalidChoice(format!(
                    "mode {picked} out of range"
                )))),
            }
        }

        // Damage / combat family
        EffectAst::DealDamage { target, amount } => {
            ctx.atomic(|ctx| damage::deal_damage(ctx, target, amount))
        }
        EffectAst::DistributeDamage { amount, target } => {
            ctx.atomic(|ctx| damage::distribute_damage(ctx, *amount, target))
        }
        EffectAst::MoveDamage {
            amount,
            from,
            to,
            up_to: _,
        } => ctx.atomic(|ctx| damage::move_damage(ctx, amount, from, to)),
        EffectAst::RemoveDamage { target, amount, .. } => {
            ctx.atomic(|ctx| damage::remove_damage(ctx, target, amount.as_ref()))
        }
        EffectAst::PreventDamage {
            target,
            amount,
            duration,
        } => ctx.atomic(|ctx| damage::prevent_damage(ctx, target, *amount, *duration)),
        EffectAst::Banish { target } => ctx.atomic(|ctx| damage::banish_target(ctx, target)),

        // Resources
        EffectAst::Draw { player, amount } => ctx.atomic(|ctx| deck::draw(ctx, player, amount)),
        EffectAst::GainLore { amount } => ctx.atomic(|ctx| opponent::gain_lore(ctx, amount)),

        // Deck / zone family
        EffectAst::ReturnToHand { target } => {
            ctx.atomic(|ctx| deck::return_to_hand(ctx, target, hostile(target)))
        }
        EffectAst::ReturnFromDiscard { filter, count } => {
            ctx.atomic(|ctx| choice::return_from_discard(ctx, filter, *count))
        }
        EffectAst::ShuffleIntoDeck { target } => ctx.atomic(|ctx| deck::shuffle_into_deck(ctx, target)),
        EffectAst::PutIntoInkwell { target, exerted } => {
            ctx.atomic(|ctx| deck::put_into_inkwell(ctx, target, *exerted))
        }
        EffectAst::InkFromHand { exerted } => ctx.atomic(|ctx| deck::ink_from_hand(ctx, *exerted)),
        EffectAst::InkTopOfDeck { exerted } => ctx.atomic(|ctx| deck::ink_top_of_deck(ctx, *exerted)),
        EffectAst::Mill { player, amount } => ctx.atomic(|ctx| deck::mill(ctx, player, amount)),
        EffectAst::SearchDeck {
            filter,
            destination,
            reveal,
            shuffle,
        } => ctx.atomic(|ctx| deck::search_deck(ctx, filter, *destination, *reveal, *shuffle)),
        EffectAst::LookAtTop { count, pick, rest } => {
            ctx.atomic(|ctx| deck::look_at_top(ctx, *count, pick.as_ref(), *rest))
        }
        EffectAst::RevealTop {
            filter,
            on_match,
            otherwise,
        } => ctx.atomic(|ctx| deck::reveal_top(ctx, filter, *on_match, *otherwise)),
        EffectAst::PutCardUnder { target } => ctx.atomic(|ctx| deck::put_card_under(ctx, target)),
        EffectAst::Exert { target } => ctx.atomic(|ctx| deck::set_exerted(ctx, target, true)),
        EffectAst::Ready { target } => ctx.atomic(|ctx| deck::set_exerted(ctx, target, false)),

        // Static / continuous family
        EffectAst::ModifyStats {
            target,
            strength,
            willpower,
            lore,
            duration,
        } => ctx.atomic(|ctx| statics::modify_stats(ctx, target, [strength, willpower, lore], *duration)),
        EffectAst::GrantKeyword {
            target,
            keyword,
            duration,
        } => ctx.atomic(|ctx| statics::grant_keyword(ctx, target, keyword, *duration)),
        EffectAst::Restrict {
            target,
            restriction,
            duration,
        } => ctx.atomic(|ctx| statics::restrict(ctx, target, *restriction, *duration)),
        EffectAst::Continuous {
            modifier,
            affected,
            condition,
        } => ctx.atomic(|ctx| statics::register_continuous(ctx, modifier, affected, condition.as_ref())),
        EffectAst::CostReduction { amount, filter, uses } => {
            ctx.atomic(|ctx| statics::cost_reduction(ctx, *amount, filter, *uses))
        }
        EffectAst::Keyword { keyword } => ctx.atomic(|ctx| {
            ctx.game
                .logger
                .debug(&format!("{} is a printed keyword; nothing to resolve", keyword.label()));
            Ok(())
        }),

        // Choice family
        EffectAst::ChooseAndDiscard {
            player,
            amount,
            filter,
        } => ctx.atomic(|ctx| choice::choose_and_discard(ctx, player, amount, filter.as_ref())),
        EffectAst::PlayForFree { filter, from } => ctx.atomic(|ctx| choice::play_for_free(ctx, filter, *from)),

        // Opponent-interaction family
        EffectAst::LoseLore { player, amount } => ctx.atomic(|ctx| opponent::lose_lore(ctx, player, amount)),
        EffectAst::OpponentChooses {
            player,
            action,
            filter,
        } => ctx.atomic(|ctx| opponent::opponent_chooses(ctx, player, *action, filter)),
        EffectAst::RevealHand { player } => ctx.atomic(|ctx| opponent::reveal_hand(ctx, player)),

        // Location family
        EffectAst::MoveToLocation {
            target,
            location,
            free,
        } => ctx.atomic(|ctx| location::move_to_location(ctx, target, location, *free)),
    }
}

/// Resolve a whole ability: its intervening condition, then its effects in order
pub fn resolve_ability(ability: &AbilityDefinition, ctx: &mut GameContext<'_>) -> ExecResult<()> {
    if let Some(condition) = &ability.condition {
        if !ctx.branch(|ctx| Ok(ctx.condition_holds(condition)))? {
            ctx.game.logger.debug("ability condition not met on resolution");
            return Ok(());
        }
    }
    for effect in &ability.effects {
        execute(effect, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, CountExpr, Owner};
    use crate::game::{PendingProvider, ScriptedAnswer, ScriptedProvider};
    use crate::zones::Zone;
    use std::sync::Arc;

    fn setup() -> (GameState, PlayerId, CardId) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        game.logger = crate::game::GameLogger::capturing();
        let alice = game.players[0].id;
        let source = game.create_card(
            Arc::new(Card::new("T-1", "Source", CardType::Character, 2).with_stats(3, 3, 1)),
            alice,
        );
        game.move_card(source, Zone::Play).unwrap();
        for _ in 0..3 {
            game.create_card(Arc::new(Card::new("T-2", "Filler", CardType::Item, 1)), alice);
        }
        (game, alice, source)
    }

    fn draw(n: i32) -> EffectAst {
        EffectAst::Draw {
            player: TargetAst::You,
            amount: Amount::fixed(n),
        }
    }

    #[test]
    fn test_optional_accepted_by_policy() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        let effect = EffectAst::Optional {
            effect: Box::new(draw(1)),
        };
        assert!(execute(&effect, &mut ctx).is_ok());
        assert_eq!(game.cards_in(alice, Zone::Hand).len(), 1);
    }

    #[test]
    fn test_optional_declined() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        hub.register(alice, Box::new(ScriptedProvider::new(vec![ScriptedAnswer::Decline])));
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        let effect = EffectAst::Optional {
            effect: Box::new(draw(1)),
        };
        execute(&effect, &mut ctx).unwrap_or_else(|_| panic!("declining must not fail"));
        assert!(game.cards_in(alice, Zone::Hand).is_empty());
    }

    #[test]
    fn test_suspend_and_replay_skips_finished_steps() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        hub.register(alice, Box::new(PendingProvider));
        let mut frame = ResolutionFrame::new();
        let effect = EffectAst::Sequence {
            effects: vec![
                draw(1),
                EffectAst::Optional {
                    effect: Box::new(draw(1)),
                },
            ],
        };

        let request = {
            let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
            match execute(&effect, &mut ctx) {
                Err(Interrupt::Suspend(request)) => request,
                other => panic!("expected suspension, got {other:?}"),
            }
        };
        assert_eq!(game.cards_in(alice, Zone::Hand).len(), 1);
        assert_eq!(frame.completed_steps(), 1);

        frame.answer(crate::game::ChoiceResponse::of_values(request.id.clone(), &[ChoiceValue::Accept]));
        frame.rewind();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        assert!(execute(&effect, &mut ctx).is_ok());
        // the first draw is not repeated
        assert_eq!(game.cards_in(alice, Zone::Hand).len(), 2);
    }

    #[test]
    fn test_for_each_counts_live_state() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        let effect = EffectAst::ForEach {
            count: CountExpr::new(Zone::Play, Owner::You, None),
            effect: Box::new(EffectAst::GainLore {
                amount: Amount::fixed(2),
            }),
        };
        assert!(execute(&effect, &mut ctx).is_ok());
        assert_eq!(game.player(alice).unwrap().lore, 2);
    }

    #[test]
    fn test_conditional_otherwise() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        let effect = EffectAst::Conditional {
            condition: Condition::OpponentHasMoreLore,
            then: Box::new(draw(2)),
            otherwise: Some(Box::new(EffectAst::GainLore {
                amount: Amount::fixed(1),
            })),
        };
        assert!(execute(&effect, &mut ctx).is_ok());
        assert_eq!(game.player(alice).unwrap().lore, 1);
        assert!(game.cards_in(alice, Zone::Hand).is_empty());
    }

    #[test]
    fn test_choose_one_first_valid_mode() {
        let (mut game, alice, source) = setup();
        let mut hub = DecisionHub::unattended();
        let mut frame = ResolutionFrame::new();
        let mut ctx = GameContext::new(&mut game, &mut hub, &mut frame, alice, Some(source));
        let effect = EffectAst::ChooseOne {
            options: vec![
                draw(1),
                EffectAst::GainLore {
                    amount: Amount::fixed(3),
                },
            ],
        };
        assert!(execute(&effect, &mut ctx).is_ok());
        assert_eq!(game.cards_in(alice, Zone::Hand).len(), 1);
        assert_eq!(game.player(alice).unwrap().lore, 0);
    }
}
