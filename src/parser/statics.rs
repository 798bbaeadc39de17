//! Keyword lines and static ability templates

use super::clauses::{parse_condition_prefix, parse_static_subject};
use super::phrases::{parse_filter, parse_keyword_word, parse_number_word, parse_stat};
use crate::core::{
    AbilityDefinition, Affected, Amount, CardFilter, ContinuousKind, Duration, EffectAst, EventKind,
    Keyword, Restriction, Side, Stat, TargetAst, TriggerSpec,
};

/// "support" expands into a quest trigger that lends this character's strength
fn support_trigger(text: &str) -> AbilityDefinition {
    let lend = EffectAst::ModifyStats {
        target: TargetAst::Chosen {
            filter: CardFilter::characters().other(),
            side: Side::Any,
            count: 1,
            up_to: false,
        },
        strength: Amount::SourceStat { stat: Stat::Strength },
        willpower: Amount::zero(),
        lore: Amount::zero(),
        duration: Duration::ThisTurn,
    };
    AbilityDefinition::triggered(
        TriggerSpec::this_card(EventKind::CardQuested),
        vec![EffectAst::Optional { effect: Box::new(lend) }],
        text,
    )
    .with_name(Some("Support".to_string()))
}

fn parse_one_keyword(words: &[&str]) -> Option<Keyword> {
    match words {
        ["shift", n] | ["shift", n, "ink"] => {
            parse_number_word(n)?;
            Some(Keyword::Other("Shift".to_string()))
        }
        _ => {
            let (keyword, used) = parse_keyword_word(words)?;
            (used == words.len()).then_some(keyword)
        }
    }
}

/// A section made only of keywords ("evasive", "resist +1 , ward")
pub fn parse_keyword_line(words: &[&str], text: &str) -> Option<Vec<AbilityDefinition>> {
    let mut abilities = Vec::new();
    for part in words.split(|w| matches!(*w, "," | ".")).filter(|p| !p.is_empty()) {
        let keyword = parse_one_keyword(part)?;
        if keyword == Keyword::Support {
            abilities.push(support_trigger(text));
        }
        abilities.push(
            AbilityDefinition::static_ability(vec![EffectAst::Keyword { keyword }], text),
        );
    }
    if abilities.is_empty() {
        None
    } else {
        Some(abilities)
    }
}

fn restriction(words: &[&str]) -> Option<Restriction> {
    match words {
        ["quest"] => Some(Restriction::CantQuest),
        ["challenge"] => Some(Restriction::CantChallenge),
        ["be", "challenged"] => Some(Restriction::CantBeChallenged),
        ["ready"] => Some(Restriction::CantReady),
        _ => None,
    }
}

fn stat_buff(words: &[&str]) -> Option<ContinuousKind> {
    // "+1 strength for each damage on him"
    if let [n, "strength", "for", "each", "damage", "on", _] = words {
        return Some(ContinuousKind::StatPerDamage {
            strength: parse_number_word(n)?,
        });
    }
    let (mut strength, mut willpower, mut lore) = (0, 0, 0);
    let mut any = false;
    for part in words.split(|w| matches!(*w, "and" | ",")).filter(|p| !p.is_empty()) {
        let [n, stat] = part else {
            return None;
        };
        let value = parse_number_word(n)?;
        match parse_stat(stat)? {
            Stat::Strength => strength = value,
            Stat::Willpower => willpower = value,
            Stat::Lore => lore = value,
            _ => return None,
        }
        any = true;
    }
    any.then_some(ContinuousKind::StatBuff {
        strength,
        willpower,
        lore,
    })
}

/// The modifier half of a static sentence, after its subject
fn parse_modifier(affected: &Affected, words: &[&str]) -> Option<ContinuousKind> {
    match words {
        ["gets" | "get", changes @ ..] => stat_buff(changes),
        ["gains" | "gain" | "has" | "have", keyword @ ..] => {
            let (keyword, used) = parse_keyword_word(keyword)?;
            (used == words.len() - 1).then_some(ContinuousKind::GrantKeyword { keyword })
        }
        ["cant", action @ ..] => Some(ContinuousKind::Restrict {
            restriction: restriction(action)?,
        }),
        ["counts", "as", "having", n, "cost", "to", "sing", "songs"] => Some(ContinuousKind::SingBuff {
            amount: parse_number_word(n)?,
        }),
        ["costs", n, "less", "to", "play"] | ["costs", n, "ink", "less", "to", "play"]
            if *affected == Affected::SelfCard =>
        {
            Some(ContinuousKind::CostReduction {
                amount: parse_number_word(n)?,
                filter: CardFilter::default(),
            })
        }
        _ => None,
    }
}

/// "you pay N ink less to play <filter>"
fn parse_cost_reduction(words: &[&str]) -> Option<(ContinuousKind, Affected)> {
    let (n, rest) = match words {
        ["you", "pay", n, "ink", "less", "to", "play", rest @ ..]
        | ["you", "pay", n, "less", "to", "play", rest @ ..] => (n, rest),
        _ => return None,
    };
    let amount = parse_number_word(n)?;
    match rest {
        ["this", _] => Some((
            ContinuousKind::CostReduction {
                amount,
                filter: CardFilter::default(),
            },
            Affected::SelfCard,
        )),
        _ => {
            let (filter, _, used) = parse_filter(rest)?;
            if used != rest.len() {
                return None;
            }
            Some((ContinuousKind::CostReduction { amount, filter }, Affected::You))
        }
    }
}

/// Static sentence with an optional "while"/"if"/"during your turn" prefix
pub fn parse_static(words: &[&str], text: &str) -> Option<AbilityDefinition> {
    let words = match words {
        [head @ .., "."] => head,
        _ => words,
    };
    let (condition, body) = match parse_condition_prefix(words) {
        Some((condition, used)) => (Some(condition), &words[used..]),
        None => (None, words),
    };
    if body.contains(&".") {
        return None;
    }

    let (modifier, affected) = match parse_cost_reduction(body) {
        Some(found) => found,
        None => {
            let (affected, used) = parse_static_subject(body)?;
            let modifier = parse_modifier(&affected, &body[used..])?;
            (modifier, affected)
        }
    };
    Some(AbilityDefinition::static_ability(
        vec![EffectAst::Continuous {
            modifier,
            affected,
            condition,
        }],
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AbilityKind, Condition};

    fn w(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_keyword_lines() {
        let abilities = parse_keyword_line(&w("evasive"), "evasive").unwrap();
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].effects, vec![EffectAst::Keyword { keyword: Keyword::Evasive }]);

        let abilities = parse_keyword_line(&w("resist +2 , ward"), "resist +2, ward").unwrap();
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].effects, vec![EffectAst::Keyword { keyword: Keyword::Resist(2) }]);

        assert!(parse_keyword_line(&w("draw a card"), "draw a card").is_none());
    }

    #[test]
    fn test_support_expands() {
        let abilities = parse_keyword_line(&w("support"), "support").unwrap();
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].kind, AbilityKind::Triggered);
        assert_eq!(abilities[0].trigger.as_ref().unwrap().event, EventKind::CardQuested);
        assert_eq!(abilities[1].kind, AbilityKind::Static);
    }

    #[test]
    fn test_conditional_self_buff() {
        let ability = parse_static(&w("while this character has no damage , he gets +2 strength"), "").unwrap();
        match &ability.effects[0] {
            EffectAst::Continuous {
                modifier: ContinuousKind::StatBuff { strength: 2, .. },
                affected: Affected::SelfCard,
                condition: Some(Condition::SourceStat { .. }),
            } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_team_buff() {
        let ability = parse_static(&w("your pirate characters get +1 strength"), "").unwrap();
        match &ability.effects[0] {
            EffectAst::Continuous {
                affected: Affected::YourCards { filter },
                ..
            } => assert!(filter.subtype.is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_self_cost_reduction() {
        let ability = parse_static(
            &w("if you have a character named gaston in play , you pay 1 ink less to play this character ."),
            "",
        )
        .unwrap();
        match &ability.effects[0] {
            EffectAst::Continuous {
                modifier: ContinuousKind::CostReduction { amount: 1, .. },
                affected: Affected::SelfCard,
                condition: Some(Condition::Count { .. }),
            } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_sing_buff_and_restriction() {
        let ability = parse_static(&w("this character counts as having +2 cost to sing songs"), "").unwrap();
        assert!(matches!(
            ability.effects[0],
            EffectAst::Continuous {
                modifier: ContinuousKind::SingBuff { amount: 2 },
                ..
            }
        ));
        let ability = parse_static(&w("this character cant challenge"), "").unwrap();
        assert!(matches!(
            ability.effects[0],
            EffectAst::Continuous {
                modifier: ContinuousKind::Restrict {
                    restriction: Restriction::CantChallenge
                },
                ..
            }
        ));
    }
}
