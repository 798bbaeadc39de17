//! Ability parser
//!
//! Compiles printed rules text into `AbilityDefinition`s. The parser knows a
//! closed catalogue of templated phrasings; a section that matches none of
//! them (or only partly) yields no ability and is listed in
//! `ParseReport::unparsed` instead.
//!
//! Parsing is a pure function of the card template, so two copies of the same
//! card always compile to equal trees.

pub mod clauses;
pub mod effects;
pub mod normalize;
pub mod phrases;
pub mod statics;

use crate::core::{AbilityDefinition, Card, CardType, EventKind, TriggerSpec};
use serde::Serialize;

/// Result of parsing one card
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    pub abilities: Vec<AbilityDefinition>,
    /// Normalized text of every section that matched no template
    pub unparsed: Vec<String>,
}

impl ParseReport {
    pub fn is_complete(&self) -> bool {
        self.unparsed.is_empty()
    }
}

/// Compile every rules-text section of a card
pub fn parse_card(card: &Card) -> Vec<AbilityDefinition> {
    parse_card_report(card).abilities
}

/// Raw sections of a card with the ability name they were printed under
fn sections(card: &Card) -> Vec<(Option<&str>, &str)> {
    let mut out: Vec<(Option<&str>, &str)> = Vec::new();
    for ability in &card.abilities {
        let name = Some(ability.name.as_str()).filter(|n| !n.is_empty());
        out.push((name, ability.text.as_str()));
    }
    for text in &card.full_text {
        out.extend(text.lines().map(|line| (None, line)));
    }
    for keyword in &card.keywords {
        out.push((None, keyword.as_str()));
    }
    out
}

pub fn parse_card_report(card: &Card) -> ParseReport {
    let mut report = ParseReport::default();
    let mut seen: Vec<String> = Vec::new();

    for (name, raw) in sections(card) {
        let Some(text) = normalize::normalize_section(raw, Some(card)) else {
            continue;
        };
        if seen.contains(&text) {
            continue;
        }
        match parse_section(&text, card.card_type) {
            Some(abilities) => report.abilities.extend(
                abilities
                    .into_iter()
                    .map(|ability| ability.with_name(name.map(str::to_string))),
            ),
            None => report.unparsed.push(text.clone()),
        }
        seen.push(text);
    }
    report
}

/// Parse free text as if printed on a character named `name`, falling back
/// to an action body ("Deal 2 damage to chosen character.")
pub fn parse_text(name: &str, text: &str) -> Option<Vec<AbilityDefinition>> {
    [CardType::Character, CardType::Action]
        .into_iter()
        .find_map(|card_type| {
            let card = Card::new("inline", name, card_type, 0).with_text(text);
            let report = parse_card_report(&card);
            (report.is_complete() && !report.abilities.is_empty()).then_some(report.abilities)
        })
}

/// One normalized section. Shapes are tried most specific first: keyword
/// line, activated cost, trigger prefix, action body, static sentence.
pub fn parse_section(text: &str, card_type: CardType) -> Option<Vec<AbilityDefinition>> {
    let tokens = normalize::tokenize(text);
    let words = normalize::words(&tokens);
    if words.is_empty() {
        return None;
    }

    if let Some(abilities) = statics::parse_keyword_line(&words, text) {
        return Some(abilities);
    }

    if let Some(sep) = words.iter().position(|w| matches!(*w, "-" | ":")) {
        if let Some(cost) = clauses::parse_cost(&words[..sep]) {
            let effects = effects::parse_effects(&words[sep + 1..])?;
            return Some(vec![AbilityDefinition::activated(cost, effects, text)]);
        }
    }

    if let Some((triggers, used)) = clauses::parse_trigger_prefix(&words) {
        let effects = effects::parse_effects(&words[used..])?;
        return Some(
            triggers
                .into_iter()
                .map(|trigger| AbilityDefinition::triggered(trigger, effects.clone(), text))
                .collect(),
        );
    }

    if card_type.is_action() {
        // an action's body resolves when it is played
        let effects = effects::parse_effects(&words)?;
        return Some(vec![AbilityDefinition::triggered(
            TriggerSpec::this_card(EventKind::CardPlayed),
            effects,
            text,
        )]);
    }

    statics::parse_static(&words, text).map(|ability| vec![ability])
}
