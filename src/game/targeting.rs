//! Target resolution
//!
//! Candidates are listed with their eligibility instead of being filtered:
//! a card protected by Ward, on the wrong side, or failing the filter stays
//! in the option list with `valid: false` and a reason. Nothing downstream
//! re-checks protection; an invalid option simply cannot be selected.

use crate::core::{CardFilter, CardId, Keyword, PlayerId, Side, StatLens, TargetAst};
use crate::game::executor::{ExecResult, GameContext};
use crate::game::{ChoiceKind, ChoiceOption, ChoiceRequest, ChoiceValue, GameState};
use serde::{Deserialize, Serialize};

/// A resolved participant of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Participant {
    Card(CardId),
    Player(PlayerId),
}

impl Participant {
    pub fn card(&self) -> Option<CardId> {
        match self {
            Participant::Card(id) => Some(*id),
            Participant::Player(_) => None,
        }
    }

    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Participant::Player(id) => Some(*id),
            Participant::Card(_) => None,
        }
    }

    pub fn choice_value(&self) -> ChoiceValue {
        match self {
            Participant::Card(id) => ChoiceValue::Card(*id),
            Participant::Player(id) => ChoiceValue::Player(*id),
        }
    }

    fn from_value(value: ChoiceValue) -> Option<Self> {
        match value {
            ChoiceValue::Card(id) => Some(Participant::Card(id)),
            ChoiceValue::Player(id) => Some(Participant::Player(id)),
            ChoiceValue::Mode(_) | ChoiceValue::Accept => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub participant: Participant,
    pub label: String,
    pub valid: bool,
    pub reason: Option<String>,
}

impl Candidate {
    pub fn to_option(&self) -> ChoiceOption {
        let option = ChoiceOption::new(self.participant.choice_value(), self.label.clone());
        match &self.reason {
            Some(reason) if !self.valid => option.invalid(reason.clone()),
            _ => option,
        }
    }
}

/// Cards in play of the filter's card types, each marked eligible or not
///
/// `chosen` targets respect Ward: an opponent's warded card is listed but
/// invalid.
pub fn candidates(
    game: &GameState,
    filter: &CardFilter,
    side: Side,
    chooser: PlayerId,
    source: Option<CardId>,
    chosen: bool,
) -> Vec<Candidate> {
    game.in_play()
        .into_iter()
        .filter_map(|id| game.card(id).ok())
        .filter(|card| filter.card_types.is_empty() || filter.card_types.iter().any(|t| card.is_type(*t)))
        .map(|card| {
            let reason = if side == Side::Yours && card.owner != chooser {
                Some("not yours".to_string())
            } else if side == Side::Opposing && card.owner == chooser {
                Some("not an opposing card".to_string())
            } else if !filter.matches(game, card, source, StatLens::Derived) {
                Some(format!("not a {}", filter.describe()))
            } else if chosen && card.owner != chooser && game.has_keyword(card.id, &Keyword::Ward) {
                Some("ward".to_string())
            } else {
                None
            };
            Candidate {
                participant: Participant::Card(card.id),
                label: card.card.full_name(),
                valid: reason.is_none(),
                reason,
            }
        })
        .collect()
}

fn side_word(side: Side) -> &'static str {
    match side {
        Side::Any => "",
        Side::Yours => "your ",
        Side::Opposing => "opposing ",
    }
}

impl GameContext<'_> {
    /// Players still in the game, in turn order from the controller
    fn live_players(&self, players: Vec<PlayerId>) -> Vec<PlayerId> {
        players
            .into_iter()
            .filter(|p| self.game.player(*p).map(|p| !p.has_lost).unwrap_or(false))
            .collect()
    }

    /// Resolve a target to its participants, asking when it is ambiguous
    ///
    /// Zero eligible candidates is a normal outcome: it is logged and
    /// resolves to nothing.
    pub fn resolve_targets(&mut self, target: &TargetAst, harmful: bool) -> ExecResult<Vec<Participant>> {
        let controller = self.controller;
        let resolved = match target {
            TargetAst::ThisCard => self
                .source
                .filter(|s| self.game.cards.contains(*s))
                .map(Participant::Card)
                .into_iter()
                .collect(),
            TargetAst::You => vec![Participant::Player(controller)],
            TargetAst::EachOpponent => self
                .live_players(self.game.opponents(controller))
                .into_iter()
                .map(Participant::Player)
                .collect(),
            TargetAst::EachPlayer => self
                .live_players(self.game.turn_order_from(controller))
                .into_iter()
                .map(Participant::Player)
                .collect(),
            TargetAst::ChosenOpponent => {
                let opponents = self.live_players(self.game.opponents(controller));
                if opponents.len() <= 1 {
                    opponents.into_iter().map(Participant::Player).collect()
                } else {
                    let options = opponents
                        .iter()
                        .map(|p| {
                            let name = self.game.player(*p).map(|p| p.name.to_string()).unwrap_or_default();
                            ChoiceOption::new(ChoiceValue::Player(*p), name)
                        })
                        .collect();
                    let request = ChoiceRequest::new(
                        controller,
                        ChoiceKind::Target { harmful },
                        "Choose an opponent",
                        options,
                        1,
                        1,
                    );
                    self.ask(request)?
                        .into_iter()
                        .filter_map(Participant::from_value)
                        .collect()
                }
            }
            TargetAst::Challenger => self
                .event
                .as_ref()
                .zip(self.source)
                .and_then(|(event, source)| event.counterpart(source))
                .map(Participant::Card)
                .into_iter()
                .collect(),
            TargetAst::EventCard => self
                .event
                .as_ref()
                .and_then(|event| match event.card {
                    Some(card) if Some(card) != self.source => Some(card),
                    _ => event.other,
                })
                .map(Participant::Card)
                .into_iter()
                .collect(),
            TargetAst::Each { filter, side } => {
                candidates(self.game, filter, *side, controller, self.source, false)
                    .into_iter()
                    .filter(|c| c.valid)
                    .map(|c| c.participant)
                    .collect()
            }
            TargetAst::Chosen {
                filter,
                side,
                count,
                up_to,
            } => self.resolve_chosen(filter, *side, *count as usize, *up_to, harmful)?,
        };
        Ok(resolved)
    }

    fn resolve_chosen(
        &mut self,
        filter: &CardFilter,
        side: Side,
        count: usize,
        up_to: bool,
        harmful: bool,
    ) -> ExecResult<Vec<Participant>> {
        let prompt = format!("Choose {}{}", side_word(side), filter.describe());
        let listed = candidates(self.game, filter, side, self.controller, self.source, true);
        let valid: Vec<Participant> = listed.iter().filter(|c| c.valid).map(|c| c.participant).collect();
        if valid.is_empty() {
            self.game.logger.info(&format!("{prompt}: no valid target"));
            return Ok(Vec::new());
        }

        let max = count.min(valid.len());
        let min = if up_to { 0 } else { max };

        if let Some(payload) = &self.payload {
            let picked: Vec<Participant> = payload
                .iter()
                .copied()
                .filter(|p| p.card().is_some() && valid.contains(p))
                .collect();
            if !picked.is_empty() && picked.len() >= min && picked.len() <= max {
                return Ok(picked);
            }
            self.game
                .logger
                .warn(&format!("{prompt}: pre-resolved targets are not eligible, asking instead"));
        }

        if !up_to && valid.len() == max {
            return Ok(valid);
        }

        let options = listed.iter().map(Candidate::to_option).collect();
        let mut request = ChoiceRequest::new(
            self.controller,
            ChoiceKind::Target { harmful },
            prompt,
            options,
            min,
            max,
        );
        if up_to {
            request = request.declinable();
        }
        Ok(self
            .ask(request)?
            .into_iter()
            .filter_map(Participant::from_value)
            .collect())
    }

    /// Card participants of a target
    pub fn resolve_cards(&mut self, target: &TargetAst, harmful: bool) -> ExecResult<Vec<CardId>> {
        Ok(self
            .resolve_targets(target, harmful)?
            .into_iter()
            .filter_map(|p| p.card())
            .collect())
    }

    /// Player participants of a target
    pub fn resolve_players(&mut self, target: &TargetAst) -> ExecResult<Vec<PlayerId>> {
        Ok(self
            .resolve_targets(target, false)?
            .into_iter()
            .filter_map(|p| p.player())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType};
    use crate::zones::Zone;
    use std::sync::Arc;

    #[test]
    fn test_ward_marks_opposing_card_invalid() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        let warded = game.create_card(
            Arc::new(
                Card::new("T-1", "Aladdin", CardType::Character, 3)
                    .with_stats(2, 3, 1)
                    .with_keyword("Ward"),
            ),
            bob,
        );
        let plain = game.create_card(
            Arc::new(Card::new("T-2", "Jafar", CardType::Character, 3).with_stats(2, 3, 1)),
            bob,
        );
        game.move_card(warded, Zone::Play).unwrap();
        game.move_card(plain, Zone::Play).unwrap();

        let listed = candidates(&game, &CardFilter::characters(), Side::Opposing, alice, None, true);
        assert_eq!(listed.len(), 2);
        let ward = listed.iter().find(|c| c.participant == Participant::Card(warded)).unwrap();
        assert!(!ward.valid);
        assert_eq!(ward.reason.as_deref(), Some("ward"));

        // ward only stops opponents
        let own = candidates(&game, &CardFilter::characters(), Side::Yours, bob, None, true);
        assert!(own.iter().all(|c| c.valid));
        // and only "chosen" targets
        let each = candidates(&game, &CardFilter::characters(), Side::Opposing, alice, None, false);
        assert!(each.iter().all(|c| c.valid));
    }

    #[test]
    fn test_side_and_filter_reasons() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        let mine = game.create_card(
            Arc::new(Card::new("T-1", "Stitch", CardType::Character, 5).with_stats(2, 3, 1)),
            alice,
        );
        let theirs = game.create_card(
            Arc::new(Card::new("T-2", "Gantu", CardType::Character, 5).with_stats(2, 3, 1)),
            bob,
        );
        game.move_card(mine, Zone::Play).unwrap();
        game.move_card(theirs, Zone::Play).unwrap();

        let cheap = CardFilter::characters().with_cost(crate::core::StatBound::at_most(3));
        let listed = candidates(&game, &cheap, Side::Opposing, alice, None, true);
        let own = listed.iter().find(|c| c.participant == Participant::Card(mine)).unwrap();
        assert_eq!(own.reason.as_deref(), Some("not an opposing card"));
        let other = listed.iter().find(|c| c.participant == Participant::Card(theirs)).unwrap();
        assert!(other.reason.as_deref().unwrap().starts_with("not a"));
        assert!(listed.iter().all(|c| !c.to_option().valid));
    }
}
