//! Choice requests, responses and the resolution journal
//!
//! A request lists every candidate, eligible or not; ineligible ones carry
//! `valid: false` and a reason. A response names option ids. Validation
//! happens against the request that is live when the response arrives.

use crate::core::{CardId, PlayerId};
use crate::{LoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a choice is about; drives the unattended policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    /// Pick targets; `harmful` when the effect hurts what is picked
    Target { harmful: bool },
    /// Pick cards from your own hand to discard
    Discard,
    /// Pick one of your own cards to lose (banish, return, exert)
    Sacrifice,
    /// Pick one mode of a "choose one"
    Mode,
    /// Accept or decline a "may"
    Confirm,
    /// Split damage; the same option may be picked repeatedly
    Distribute,
    /// Pick a card to play for free
    FreePlay,
    /// Pick cards out of a looked-at or searched set
    Pick,
    /// Pick which looked-at cards go to the bottom
    Bottom,
}

/// What an option stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ChoiceValue {
    Card(CardId),
    Player(PlayerId),
    Mode(usize),
    Accept,
}

impl ChoiceValue {
    /// Stable option id
    pub fn option_id(&self) -> String {
        match self {
            ChoiceValue::Card(id) => format!("card:{id}"),
            ChoiceValue::Player(id) => format!("player:{id}"),
            ChoiceValue::Mode(i) => format!("mode:{i}"),
            ChoiceValue::Accept => "accept".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub value: ChoiceValue,
}

impl ChoiceOption {
    pub fn new(value: ChoiceValue, label: impl Into<String>) -> Self {
        ChoiceOption {
            id: value.option_id(),
            label: label.into(),
            valid: true,
            reason: None,
            value,
        }
    }

    pub fn invalid(mut self, reason: impl Into<String>) -> Self {
        self.valid = false;
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRequest {
    pub id: String,
    /// Who decides
    pub player: PlayerId,
    pub prompt: String,
    pub kind: ChoiceKind,
    pub options: Vec<ChoiceOption>,
    pub min: usize,
    pub max: usize,
    /// May the whole choice be declined?
    pub optional: bool,
}

impl ChoiceRequest {
    /// A request without an id; the executor assigns one when it is issued
    pub fn new(
        player: PlayerId,
        kind: ChoiceKind,
        prompt: impl Into<String>,
        options: Vec<ChoiceOption>,
        min: usize,
        max: usize,
    ) -> Self {
        ChoiceRequest {
            id: String::new(),
            player,
            prompt: prompt.into(),
            kind,
            options,
            min,
            max,
            optional: false,
        }
    }

    pub fn declinable(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn valid_options(&self) -> impl Iterator<Item = &ChoiceOption> {
        self.options.iter().filter(|o| o.valid)
    }

    pub fn valid_count(&self) -> usize {
        self.valid_options().count()
    }

    pub fn allows_repeats(&self) -> bool {
        self.kind == ChoiceKind::Distribute
    }

    /// Check a response against this request and return the picked values
    /// in selection order (repeats kept for distributions)
    pub fn validate(&self, response: &ChoiceResponse) -> Result<Vec<ChoiceValue>> {
        if response.request_id != self.id {
            return Err(LoreError::InvalidChoice(format!(
                "response for {} does not answer {}",
                response.request_id, self.id
            )));
        }
        if response.declined {
            return if self.optional {
                Ok(Vec::new())
            } else {
                Err(LoreError::InvalidChoice(format!(
                    "{} cannot be declined",
                    self.id
                )))
            };
        }
        let count = response.selected.len();
        if count < self.min || count > self.max {
            return Err(LoreError::InvalidChoice(format!(
                "selected {count} option(s), expected {}..={}",
                self.min, self.max
            )));
        }
        let mut values = Vec::with_capacity(count);
        for (i, selected) in response.selected.iter().enumerate() {
            let option = self
                .options
                .iter()
                .find(|o| &o.id == selected)
                .ok_or_else(|| LoreError::InvalidChoice(format!("unknown option {selected}")))?;
            if !option.valid {
                return Err(LoreError::InvalidChoice(format!(
                    "{} is not selectable: {}",
                    option.label,
                    option.reason.as_deref().unwrap_or("ineligible")
                )));
            }
            if !self.allows_repeats() && response.selected[..i].contains(selected) {
                return Err(LoreError::InvalidChoice(format!(
                    "{} selected twice",
                    option.label
                )));
            }
            values.push(option.value);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceResponse {
    pub request_id: String,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub declined: bool,
}

impl ChoiceResponse {
    pub fn select(request_id: impl Into<String>, selected: Vec<String>) -> Self {
        ChoiceResponse {
            request_id: request_id.into(),
            selected,
            declined: false,
        }
    }

    pub fn decline(request_id: impl Into<String>) -> Self {
        ChoiceResponse {
            request_id: request_id.into(),
            selected: Vec::new(),
            declined: true,
        }
    }

    /// Select values by their option ids
    pub fn of_values(request_id: impl Into<String>, values: &[ChoiceValue]) -> Self {
        Self::select(request_id, values.iter().map(|v| v.option_id()).collect())
    }
}

/// One completed step of an ability's resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRecord {
    /// A leaf effect ran to completion
    Atomic,
    /// A condition or "may" was decided
    Branch(bool),
    /// A mode was picked
    Pick(usize),
    /// A for-each count was fixed
    Count(i32),
}

/// Journal of an ability's progress, replayed when a suspended ability resumes
///
/// Completed steps are skipped on replay and decisions already taken are
/// reused, so nothing is applied twice and nothing is re-asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFrame {
    journal: Vec<StepRecord>,
    #[serde(skip)]
    cursor: usize,
    #[serde(skip)]
    choice_seq: u32,
    /// Answers for the step that suspended, keyed by request id
    answers: BTreeMap<String, ChoiceResponse>,
}

impl ResolutionFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewind before (re)running the ability
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.choice_seq = 0;
    }

    /// Next recorded step, if the replay has not caught up yet
    pub fn replay(&mut self) -> Option<StepRecord> {
        let step = self.journal.get(self.cursor).copied()?;
        self.cursor += 1;
        self.choice_seq = 0;
        Some(step)
    }

    pub fn record(&mut self, step: StepRecord) {
        self.journal.push(step);
        self.cursor = self.journal.len();
        self.choice_seq = 0;
        self.answers.clear();
    }

    /// Deterministic id for the next request of the current step
    pub fn next_request_id(&mut self, entry: u64) -> String {
        let id = format!("c{}-{}-{}", entry, self.cursor, self.choice_seq);
        self.choice_seq += 1;
        id
    }

    pub fn answer(&mut self, response: ChoiceResponse) {
        self.answers.insert(response.request_id.clone(), response);
    }

    /// Answer stored for `request_id`; kept until the step completes so a
    /// step that asks twice can replay its first answer
    pub fn answer_for(&self, request_id: &str) -> Option<&ChoiceResponse> {
        self.answers.get(request_id)
    }

    pub fn forget_answer(&mut self, request_id: &str) {
        self.answers.remove(request_id);
    }

    pub fn completed_steps(&self) -> usize {
        self.journal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: ChoiceKind, min: usize, max: usize) -> ChoiceRequest {
        ChoiceRequest {
            id: "c1-0-0".to_string(),
            player: PlayerId::new(0),
            prompt: "Choose a character".to_string(),
            kind,
            options: vec![
                ChoiceOption::new(ChoiceValue::Card(CardId::new(10)), "Stitch"),
                ChoiceOption::new(ChoiceValue::Card(CardId::new(11)), "Aladdin").invalid("ward"),
                ChoiceOption::new(ChoiceValue::Card(CardId::new(12)), "Jafar"),
            ],
            min,
            max,
            optional: false,
        }
    }

    #[test]
    fn test_validate_accepts_valid_selection() {
        let req = request(ChoiceKind::Target { harmful: true }, 1, 1);
        let resp = ChoiceResponse::select("c1-0-0", vec!["card:12".to_string()]);
        assert_eq!(req.validate(&resp).unwrap(), vec![ChoiceValue::Card(CardId::new(12))]);
    }

    #[test]
    fn test_validate_rejects_invalid_option() {
        let req = request(ChoiceKind::Target { harmful: true }, 1, 1);
        let resp = ChoiceResponse::select("c1-0-0", vec!["card:11".to_string()]);
        let err = req.validate(&resp).unwrap_err();
        assert!(err.to_string().contains("ward"));
    }

    #[test]
    fn test_validate_cardinality_and_decline() {
        let req = request(ChoiceKind::Target { harmful: false }, 1, 1);
        let two = ChoiceResponse::select("c1-0-0", vec!["card:10".to_string(), "card:12".to_string()]);
        assert!(req.validate(&two).is_err());
        assert!(req.validate(&ChoiceResponse::decline("c1-0-0")).is_err());

        let mut optional = req.clone();
        optional.optional = true;
        assert!(optional.validate(&ChoiceResponse::decline("c1-0-0")).unwrap().is_empty());
    }

    #[test]
    fn test_distribution_repeats() {
        let req = request(ChoiceKind::Distribute, 3, 3);
        let resp = ChoiceResponse::select(
            "c1-0-0",
            vec!["card:10".to_string(), "card:10".to_string(), "card:12".to_string()],
        );
        assert_eq!(req.validate(&resp).unwrap().len(), 3);

        let plain = request(ChoiceKind::Target { harmful: true }, 2, 2);
        let dup = ChoiceResponse::select("c1-0-0", vec!["card:10".to_string(), "card:10".to_string()]);
        assert!(plain.validate(&dup).is_err());
    }

    #[test]
    fn test_frame_replay() {
        let mut frame = ResolutionFrame::new();
        assert_eq!(frame.next_request_id(4), "c4-0-0");
        frame.record(StepRecord::Atomic);
        frame.record(StepRecord::Branch(true));
        assert_eq!(frame.next_request_id(4), "c4-2-0");

        frame.rewind();
        assert_eq!(frame.replay(), Some(StepRecord::Atomic));
        assert_eq!(frame.replay(), Some(StepRecord::Branch(true)));
        assert_eq!(frame.replay(), None);
        assert_eq!(frame.next_request_id(4), "c4-2-0");
    }
}
