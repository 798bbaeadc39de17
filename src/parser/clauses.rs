//! Trigger prefixes, condition clauses and activation costs

use super::phrases::{parse_bound, parse_count, parse_filter, parse_number, parse_stat};
use crate::core::{
    ActivationCost, Comparison, Condition, CountExpr, EventKind, Owner, Stat,
    TriggerSpec, TriggerSubject,
};
use crate::zones::Zone;

fn subject_event(words: &[&str]) -> Option<(EventKind, bool, usize)> {
    // (event, in_challenge, words used) for the verb phrase after a subject
    match words {
        ["quests", ..] | ["quest", ..] => Some((EventKind::CardQuested, false, 1)),
        ["challenges", "another", "character", ..] => Some((EventKind::CardChallenges, false, 3)),
        ["challenges", ..] => Some((EventKind::CardChallenges, false, 1)),
        ["is", "challenged", ..] | ["are", "challenged", ..] => Some((EventKind::CardChallenged, false, 2)),
        ["is", "banished", "in", "a", "challenge", ..] | ["are", "banished", "in", "a", "challenge", ..] => {
            Some((EventKind::CardBanished, true, 5))
        }
        ["is", "banished", ..] | ["are", "banished", ..] => Some((EventKind::CardBanished, false, 2)),
        ["is", "dealt", "damage", ..] | ["are", "dealt", "damage", ..] | ["takes", "damage", ..] => {
            Some((EventKind::CardDamaged, false, if words[0] == "takes" { 2 } else { 3 }))
        }
        ["moves", "to", "a", "location", ..] => Some((EventKind::CardMoved, false, 4)),
        ["is", "discarded", ..] => Some((EventKind::CardDiscarded, false, 2)),
        _ => None,
    }
}

/// Parse one trigger condition ("you play this character", "this character quests")
fn parse_one_trigger(words: &[&str]) -> Option<(TriggerSpec, usize)> {
    let mut spec = TriggerSpec::this_card(EventKind::CardPlayed);
    let used = match words {
        ["you", "play", "this", _, ..] => 4,
        ["this", _, "banishes", "another", "character", "in", "a", "challenge", ..] => {
            spec.event = EventKind::CardBanished;
            spec.subject = TriggerSubject::Counterpart;
            spec.in_challenge = true;
            8
        }
        ["you", "move", "this", "character", "to", "a", "location", ..] => {
            spec.event = EventKind::CardMoved;
            7
        }
        ["this", _, rest @ ..] | ["he", rest @ ..] | ["she", rest @ ..] | ["they", rest @ ..] | ["it", rest @ ..] => {
            let (event, in_challenge, used) = subject_event(rest)?;
            spec.event = event;
            spec.in_challenge = in_challenge;
            words.len() - rest.len() + used
        }
        ["you", "play", rest @ ..] | ["an", "opponent", "plays", rest @ ..] => {
            let skip = words.len() - rest.len();
            let rest = match rest {
                ["a", tail @ ..] | ["an", tail @ ..] => tail,
                _ => rest,
            };
            let (filter, _, used) = parse_filter(rest)?;
            spec.subject = if words[0] == "you" {
                TriggerSubject::YourCards { filter }
            } else {
                TriggerSubject::OpponentCards { filter }
            };
            skip + (words.len() - skip - rest.len()) + used
        }
        ["one", "of", "your", rest @ ..] => {
            let (filter, _, used) = parse_filter(rest)?;
            let after = &rest[used..];
            let (event, in_challenge, verb) = subject_event(after)?;
            spec.event = event;
            spec.in_challenge = in_challenge;
            spec.subject = TriggerSubject::YourCards { filter };
            words.len() - after.len() + verb
        }
        ["an", "opposing", rest @ ..] => {
            let (filter, _, used) = parse_filter(rest)?;
            let after = &rest[used..];
            let (event, in_challenge, verb) = subject_event(after)?;
            spec.event = event;
            spec.in_challenge = in_challenge;
            spec.subject = TriggerSubject::OpponentCards { filter };
            words.len() - after.len() + verb
        }
        ["you", "put", "a", "card", "into", "your", "inkwell", ..] => {
            spec.event = EventKind::CardInked;
            spec.subject = TriggerSubject::You;
            7
        }
        ["you", "use", "an", "ability", "of", "this", "character", ..] => {
            spec.event = EventKind::AbilityActivated;
            7
        }
        _ => return None,
    };
    Some((spec, used))
}

/// Trigger prefix up to the comma. Returns the triggers and words consumed
/// (including the comma).
pub fn parse_trigger_prefix(words: &[&str]) -> Option<(Vec<TriggerSpec>, usize)> {
    let (your_turn_only, body, skip) = match words {
        ["during", "your", "turn", ",", rest @ ..] => (true, rest, 4),
        _ => (false, words, 0),
    };
    let comma = body.iter().position(|w| *w == ",")?;
    let clause = &body[..comma];

    let mut specs = match clause {
        ["at", "the", "start", "of", "your", "turn"] => {
            let mut spec = TriggerSpec::this_card(EventKind::StartOfTurn);
            spec.subject = TriggerSubject::You;
            vec![spec]
        }
        ["at", "the", "end", "of", "your", "turn"] => {
            let mut spec = TriggerSpec::this_card(EventKind::EndOfTurn);
            spec.subject = TriggerSubject::You;
            vec![spec]
        }
        ["when", rest @ ..] | ["whenever", rest @ ..] => {
            let (first, used) = parse_one_trigger(rest)?;
            let tail = &rest[used..];
            match tail {
                [] => vec![first],
                ["during", "your", "turn"] => {
                    let mut first = first;
                    first.your_turn_only = true;
                    vec![first]
                }
                // "when you play this character and whenever he quests"
                ["and", "whenever", more @ ..] | ["and", "when", more @ ..] => {
                    let (second, used) = parse_one_trigger(more)?;
                    if used != more.len() {
                        return None;
                    }
                    vec![first, second]
                }
                _ => return None,
            }
        }
        _ => return None,
    };
    if your_turn_only {
        for spec in specs.iter_mut() {
            spec.your_turn_only = true;
        }
    }
    Some((specs, skip + comma + 1))
}

fn count_condition(count: CountExpr, cmp: Comparison, value: i32) -> Condition {
    Condition::Count { count, cmp, value }
}

/// "N or more <counted noun>" / "no <counted noun>" / "a <counted noun>"
fn parse_quantity_count(words: &[&str]) -> Option<Condition> {
    let (cmp, value, rest) = match words {
        ["no", rest @ ..] => (Comparison::Exactly, 0, rest),
        ["a", rest @ ..] | ["an", rest @ ..] => (Comparison::AtLeast, 1, rest),
        ["another", ..] => (Comparison::AtLeast, 1, words),
        _ => {
            let (bound, used) = parse_bound(words)?;
            (bound.cmp, bound.value, &words[used..])
        }
    };
    let (count, used) = parse_count(rest)?;
    if used != rest.len() {
        return None;
    }
    Some(count_condition(count, cmp, value))
}

/// Whole-clause condition; every word must be consumed
pub fn parse_condition(words: &[&str]) -> Option<Condition> {
    let condition = match words {
        ["its", "your", "turn"] | ["it", "is", "your", "turn"] => Condition::YourTurn,
        ["an", "opponent", "has", "more", "lore", "than", "you"] => Condition::OpponentHasMoreLore,
        ["this", _, "has", "no", "damage"] | ["he", "has", "no", "damage"] | ["she", "has", "no", "damage"] => {
            Condition::SourceStat {
                stat: Stat::Damage,
                cmp: Comparison::Exactly,
                value: 0,
            }
        }
        ["this", _, "has", "damage"] | ["this", _, "is", "damaged"] => Condition::SourceStat {
            stat: Stat::Damage,
            cmp: Comparison::AtLeast,
            value: 1,
        },
        ["this", _, "is", "exerted"] => Condition::SourceExerted { exerted: true },
        ["this", _, "is", "at", "a", "location"] => Condition::SourceAtLocation,
        ["this", _, "is", "in", "play"] => Condition::SourceInZone { zone: Zone::Play },
        ["this", _, "has", rest @ ..] => {
            // "has 5 strength or more"
            let (value, used) = parse_number(rest)?;
            let stat = parse_stat(rest.get(used)?)?;
            let cmp = match &rest[used + 1..] {
                ["or", "more"] => Comparison::AtLeast,
                ["or", "less"] => Comparison::AtMost,
                [] => Comparison::Exactly,
                _ => return None,
            };
            Condition::SourceStat { stat, cmp, value }
        }
        ["youve", "put", "a", "card", "under", "this", _, "this", "turn"]
        | ["you", "put", "a", "card", "under", "this", _, "this", "turn"]
        | ["a", "card", "was", "put", "under", "this", _, "this", "turn"] => Condition::PutCardUnderThisTurn,
        ["you", "have", "no", "cards", "in", "your", "hand"] => count_condition(
            CountExpr::new(Zone::Hand, Owner::You, None),
            Comparison::Exactly,
            0,
        ),
        ["you", "have", rest @ ..] => {
            // "you have 2 or more other characters in play"
            match rest {
                [n, "or", "more", "ready", "ink"] | [n, "or", "more", "ink", "available"] => {
                    Condition::InkAvailable {
                        cmp: Comparison::AtLeast,
                        value: super::phrases::parse_number_word(n)?,
                    }
                }
                _ => match parse_quantity_count(rest)? {
                    Condition::Count { mut count, cmp, value } => {
                        if count.owner == Owner::Any {
                            count.owner = Owner::You;
                        }
                        Condition::Count { count, cmp, value }
                    }
                    other => other,
                },
            }
        }
        ["there", "are", rest @ ..] | ["there", "is", rest @ ..] => parse_quantity_count(rest)?,
        ["you", "dont", "have", rest @ ..] => Condition::Not {
            condition: Box::new(parse_quantity_count(rest)?),
        },
        ["no", "opponent", "has", "more", "lore", "than", "you"] => Condition::Not {
            condition: Box::new(Condition::OpponentHasMoreLore),
        },
        _ => return None,
    };
    Some(condition)
}

/// "if X," / "while X," / "during your turn," prefix of a sentence.
/// Returns the condition and words consumed (including the comma).
pub fn parse_condition_prefix(words: &[&str]) -> Option<(Condition, usize)> {
    match words {
        ["during", "your", "turn", ",", ..] => Some((Condition::YourTurn, 4)),
        ["if", rest @ ..] | ["while", rest @ ..] => {
            let comma = rest.iter().position(|w| *w == ",")?;
            let condition = parse_condition(&rest[..comma])?;
            Some((condition, comma + 2))
        }
        _ => None,
    }
}

/// Activation cost before the "-" / ":" separator; every word must be consumed
pub fn parse_cost(words: &[&str]) -> Option<ActivationCost> {
    let mut cost = ActivationCost::default();
    for part in words.split(|w| *w == ",") {
        match part {
            ["exert"] => cost.exert = true,
            [n, "ink"] => cost.ink += u32::try_from(super::phrases::parse_number_word(n)?).ok()?,
            ["banish", "this", _] => cost.banish_self = true,
            _ => return None,
        }
    }
    if cost == ActivationCost::default() {
        None
    } else {
        Some(cost)
    }
}

/// Subject filter for statics like "your pirate characters get ..."
pub fn parse_static_subject(words: &[&str]) -> Option<(crate::core::Affected, usize)> {
    use crate::core::Affected;
    match words {
        ["this", _, ..] => Some((Affected::SelfCard, 2)),
        [w, ..] if super::phrases::is_self_pronoun(w) => Some((Affected::SelfCard, 1)),
        ["your", rest @ ..] => {
            let (filter, _, used) = parse_filter(rest)?;
            Some((Affected::YourCards { filter }, 1 + used))
        }
        ["opposing", rest @ ..] => {
            let (filter, _, used) = parse_filter(rest)?;
            Some((Affected::OpposingCards { filter }, 1 + used))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    fn w(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_play_trigger() {
        let words = w("when you play this character , draw a card");
        let (specs, used) = parse_trigger_prefix(&words).unwrap();
        assert_eq!(used, 6);
        assert_eq!(specs, vec![TriggerSpec::this_card(EventKind::CardPlayed)]);
    }

    #[test]
    fn test_double_trigger() {
        let words = w("when you play this character and whenever he quests , gain 1 lore");
        let (specs, _) = parse_trigger_prefix(&words).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].event, EventKind::CardQuested);
    }

    #[test]
    fn test_banished_in_challenge() {
        let words = w("when this character is banished in a challenge , draw a card");
        let (specs, _) = parse_trigger_prefix(&words).unwrap();
        assert_eq!(specs[0].event, EventKind::CardBanished);
        assert!(specs[0].in_challenge);
    }

    #[test]
    fn test_your_other_characters_trigger() {
        let words = w("whenever one of your other characters is banished , gain 1 lore");
        let (specs, _) = parse_trigger_prefix(&words).unwrap();
        match &specs[0].subject {
            TriggerSubject::YourCards { filter } => {
                assert!(filter.exclude_self);
                assert_eq!(filter.card_types, vec![CardType::Character]);
            }
            other => panic!("unexpected subject {other:?}"),
        }
    }

    #[test]
    fn test_you_play_filter_trigger() {
        let words = w("whenever you play a floodborn character , draw a card");
        let (specs, _) = parse_trigger_prefix(&words).unwrap();
        assert!(matches!(&specs[0].subject, TriggerSubject::YourCards { filter } if filter.subtype.is_some()));
    }

    #[test]
    fn test_start_of_turn() {
        let words = w("at the start of your turn , gain 1 lore");
        let (specs, used) = parse_trigger_prefix(&words).unwrap();
        assert_eq!(specs[0].event, EventKind::StartOfTurn);
        assert_eq!(used, 7);
    }

    #[test]
    fn test_count_condition() {
        let condition = parse_condition(&w("you have 2 or more other characters in play")).unwrap();
        match condition {
            Condition::Count { count, cmp, value } => {
                assert_eq!(cmp, Comparison::AtLeast);
                assert_eq!(value, 2);
                assert_eq!(count.source, Zone::Play);
                assert!(count.filter.unwrap().exclude_self);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_named_condition() {
        let condition = parse_condition(&w("you have a character named gaston in play")).unwrap();
        match condition {
            Condition::Count { count, value: 1, .. } => {
                assert_eq!(count.filter.unwrap().name.as_deref(), Some("gaston"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_misc_conditions() {
        assert_eq!(parse_condition(&w("its your turn")), Some(Condition::YourTurn));
        assert_eq!(
            parse_condition(&w("an opponent has more lore than you")),
            Some(Condition::OpponentHasMoreLore)
        );
        assert!(matches!(
            parse_condition(&w("this character has no damage")),
            Some(Condition::SourceStat { stat: Stat::Damage, .. })
        ));
        assert_eq!(parse_condition(&w("the moon is full")), None);
    }

    #[test]
    fn test_costs() {
        let cost = parse_cost(&w("exert , 2 ink")).unwrap();
        assert!(cost.exert);
        assert_eq!(cost.ink, 2);
        assert!(parse_cost(&w("banish this item")).unwrap().banish_self);
        assert_eq!(parse_cost(&w("sing loudly")), None);
    }
}
