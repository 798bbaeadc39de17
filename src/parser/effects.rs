//! Effect sentence templates
//!
//! `parse_effects` takes the body of an ability (after any trigger prefix or
//! activation cost) and returns the effect list, or `None` if any sentence
//! fails to match. Multi-sentence shapes ("you may X. if you do, Y",
//! "if X, A. otherwise, B", look-at-top follow-ups) are merged into the
//! preceding effect.

use super::clauses::parse_condition_prefix;
use super::phrases::{
    is_self_pronoun, parse_count, parse_filter, parse_keyword_word, parse_number_word, parse_stat,
    parse_target, split_duration,
};
use crate::core::{
    Amount, CardFilter, CardType, CountExpr, Duration, EffectAst, ForcedAction, LookPick,
    PickDestination, Restriction, RestPlacement, Side, Stat, TargetAst,
};
use crate::zones::Zone;

/// Shield amount for "takes no damage"
pub const ALL_DAMAGE: i32 = i32::MAX;

/// Parse an ability body into effects
pub fn parse_effects(words: &[&str]) -> Option<Vec<EffectAst>> {
    if let ["choose", "one", sep, rest @ ..] = words {
        if matches!(*sep, ":" | "-") {
            return parse_choose_one(rest).map(|effect| vec![effect]);
        }
    }

    let mut effects: Vec<EffectAst> = Vec::new();
    for sentence in words.split(|w| *w == ".").filter(|s| !s.is_empty()) {
        if let Some(last) = effects.last_mut() {
            if merge_followup(last, sentence) {
                continue;
            }
        }
        effects.push(parse_sentence(sentence)?);
    }
    if effects.is_empty() {
        None
    } else {
        Some(effects)
    }
}

fn parse_choose_one(words: &[&str]) -> Option<EffectAst> {
    let mut options = Vec::new();
    for bullet in words.split(|w| *w == "-").filter(|s| !s.is_empty()) {
        let mut effects = parse_effects(bullet)?;
        let option = if effects.len() == 1 {
            effects.pop()?
        } else {
            EffectAst::Sequence { effects }
        };
        options.push(option);
    }
    if options.len() < 2 {
        return None;
    }
    Some(EffectAst::ChooseOne { options })
}

fn sequence(first: EffectAst, rest: EffectAst) -> EffectAst {
    match rest {
        EffectAst::Sequence { mut effects } => {
            effects.insert(0, first);
            EffectAst::Sequence { effects }
        }
        other => EffectAst::Sequence {
            effects: vec![first, other],
        },
    }
}

/// Fold a follow-up sentence into the previous effect. Returns false when the
/// sentence stands on its own.
fn merge_followup(last: &mut EffectAst, sentence: &[&str]) -> bool {
    match (last, sentence) {
        (EffectAst::Optional { effect }, ["if", "you", "do", ",", rest @ ..]) => {
            let Some(then) = parse_sentence(rest) else {
                return false;
            };
            let first = std::mem::replace(effect.as_mut(), EffectAst::Sequence { effects: Vec::new() });
            **effect = sequence(first, then);
            true
        }
        (EffectAst::Conditional { otherwise, .. }, ["otherwise", ",", rest @ ..]) if otherwise.is_none() => {
            match parse_sentence(rest) {
                Some(effect) => {
                    *otherwise = Some(Box::new(effect));
                    true
                }
                None => false,
            }
        }
        (EffectAst::LookAtTop { pick, rest, .. }, _) => match parse_look_followup(sentence) {
            Some((new_pick, new_rest)) => {
                if new_pick.is_some() {
                    *pick = new_pick;
                }
                if let Some(placement) = new_rest {
                    *rest = placement;
                }
                true
            }
            None => false,
        },
        (
            EffectAst::SearchDeck {
                destination,
                reveal,
                shuffle,
                ..
            },
            _,
        ) => {
            let (mut dest, mut rev, mut shuf) = (*destination, *reveal, *shuffle);
            let merged = sentence
                .split(|w| *w == "and")
                .all(|part| search_part(part, &mut dest, &mut rev, &mut shuf));
            if merged {
                *destination = dest;
                *reveal = rev;
                *shuffle = shuf;
            }
            merged
        }
        (
            EffectAst::RevealTop {
                filter,
                on_match,
                otherwise,
            },
            _,
        ) => match sentence {
            ["if", "its", "a" | "an", rest @ ..] => {
                let Some((found, _, used)) = parse_filter(rest) else {
                    return false;
                };
                let action = match &rest[used..] {
                    [",", action @ ..] => action,
                    _ => return false,
                };
                let action = match action {
                    ["you", "may", tail @ ..] => tail,
                    _ => action,
                };
                let destination = match action {
                    ["put", "it", "into", "your", "hand"] => PickDestination::Hand,
                    ["put", "it", "into", "your", "inkwell", ..] => PickDestination::Inkwell,
                    _ => return false,
                };
                *filter = found;
                *on_match = destination;
                true
            }
            ["otherwise", ",", rest @ ..] => match parse_rest_placement(rest) {
                Some(placement) => {
                    *otherwise = placement;
                    true
                }
                None => false,
            },
            _ => false,
        },
        _ => false,
    }
}

/// One sentence: condition prefix, "you may", "for each" and then/and chains
pub fn parse_sentence(words: &[&str]) -> Option<EffectAst> {
    if words.is_empty() {
        return None;
    }
    if let Some((condition, used)) = parse_condition_prefix(words) {
        let then = parse_sentence(&words[used..])?;
        return Some(EffectAst::Conditional {
            condition,
            then: Box::new(then),
            otherwise: None,
        });
    }
    match words {
        ["you", "may", rest @ ..] => {
            return Some(EffectAst::Optional {
                effect: Box::new(parse_sentence(rest)?),
            })
        }
        ["then", rest @ ..] => return parse_sentence(rest),
        ["for", "each", rest @ ..] => {
            let comma = rest.iter().position(|w| *w == ",")?;
            let (count, used) = parse_count(&rest[..comma])?;
            if used != comma {
                return None;
            }
            let effect = parse_sentence(&rest[comma + 1..])?;
            return Some(EffectAst::ForEach {
                count,
                effect: Box::new(effect),
            });
        }
        _ => {}
    }

    if let Some(effect) = parse_clause(words) {
        return Some(effect);
    }

    for (i, word) in words.iter().enumerate().skip(1) {
        if !matches!(*word, "," | "and" | "then") {
            continue;
        }
        let mut right = &words[i + 1..];
        if let ["then", tail @ ..] | ["and", tail @ ..] = right {
            right = tail;
        }
        if right.is_empty() {
            continue;
        }
        if let Some(left) = parse_clause(&words[..i]) {
            if let Some(rest) = parse_sentence(right) {
                return Some(sequence(left, rest));
            }
        }
    }
    None
}

fn is_you_verb(word: &str) -> bool {
    matches!(
        word,
        "gain" | "draw" | "deal" | "banish" | "return" | "ready" | "exert" | "play" | "put" | "look"
            | "search" | "reveal" | "shuffle" | "remove" | "move" | "pay" | "choose" | "discard"
    )
}

/// Target at the start of a clause, including pronouns for the source
fn target_prefix(words: &[&str]) -> Option<(TargetAst, usize)> {
    match words {
        [pronoun, ..] if is_self_pronoun(pronoun) => Some((TargetAst::ThisCard, 1)),
        _ => parse_target(words),
    }
}

/// Target that must consume every word
fn full_target(words: &[&str]) -> Option<TargetAst> {
    let (target, used) = target_prefix(words)?;
    if used == words.len() {
        Some(target)
    } else {
        None
    }
}

/// Split "... for each <count>" off the end of a clause
fn split_for_each<'a, 'w>(words: &'a [&'w str]) -> Option<(&'a [&'w str], Option<CountExpr>)> {
    let Some(at) = words.windows(2).position(|pair| pair == ["for", "each"]) else {
        return Some((words, None));
    };
    let tail = &words[at + 2..];
    let (count, used) = parse_count(tail)?;
    if used != tail.len() {
        return None;
    }
    Some((&words[..at], Some(count)))
}

fn scaled(value: i32, count: Option<CountExpr>) -> Amount {
    match count {
        Some(count) => Amount::Count(count.times(value)),
        None => Amount::fixed(value),
    }
}

/// "equal to this character's strength" / "equal to the number of ..."
fn parse_equal_to(words: &[&str]) -> Option<(Amount, usize)> {
    let (amount, used) = match words {
        ["this", _, stat, ..] => (Amount::SourceStat { stat: parse_stat(stat)? }, 3),
        ["his" | "her" | "its" | "their", stat, ..] => (Amount::SourceStat { stat: parse_stat(stat)? }, 2),
        ["the", "number", "of", rest @ ..] => {
            let (count, used) = parse_count(rest)?;
            (Amount::Count(count), 3 + used)
        }
        _ => return None,
    };
    Some((amount, used))
}

fn parse_full_equal_to(words: &[&str]) -> Option<Amount> {
    match words {
        ["equal", "to", rest @ ..] => {
            let (amount, used) = parse_equal_to(rest)?;
            (used == rest.len()).then_some(amount)
        }
        _ => None,
    }
}

fn is_card_word(word: &str) -> bool {
    matches!(word, "card" | "cards")
}

/// A single template clause; every word must be consumed
fn parse_clause(words: &[&str]) -> Option<EffectAst> {
    let words = match words {
        ["you", verb, ..] if is_you_verb(verb) => &words[1..],
        _ => words,
    };
    match words {
        ["draw", rest @ ..] => parse_draw(rest, TargetAst::You),
        ["gain", rest @ ..] => Some(EffectAst::GainLore {
            amount: parse_lore_amount(rest)?,
        }),
        ["deal", rest @ ..] => parse_deal(rest),
        ["banish", rest @ ..] => Some(EffectAst::Banish {
            target: full_target(rest)?,
        }),
        ["return", rest @ ..] => parse_return(rest),
        ["remove", rest @ ..] => parse_remove(rest),
        ["move", rest @ ..] => parse_move(rest),
        ["exert", rest @ ..] => Some(EffectAst::Exert {
            target: full_target(rest)?,
        }),
        ["ready", rest @ ..] => Some(EffectAst::Ready {
            target: full_target(rest)?,
        }),
        ["choose", "and", "discard", rest @ ..] | ["discard", rest @ ..] => parse_discard(rest, TargetAst::You),
        ["look", "at", "the", "top", n, noun, "of", "your", "deck"] if is_card_word(noun) => {
            Some(EffectAst::LookAtTop {
                count: parse_number_word(n)?,
                pick: None,
                rest: RestPlacement::Top,
            })
        }
        ["search", "your", "deck", "for", rest @ ..] => parse_search(rest),
        ["reveal", "the", "top", "card", "of", "your", "deck"] => Some(EffectAst::RevealTop {
            filter: CardFilter::default(),
            on_match: PickDestination::TopOfDeck,
            otherwise: RestPlacement::Top,
        }),
        ["put", rest @ ..] => parse_put(rest),
        ["shuffle", rest @ ..] => parse_shuffle(rest),
        ["play", rest @ ..] => parse_play_free(rest),
        ["pay", n, "ink", "less", "for", "the", "next", rest @ ..] => {
            let amount = parse_number_word(n)?;
            let filter = match rest {
                [head @ .., "you", "play", "this", "turn"] => full_filter(head)?,
                _ => return None,
            };
            Some(EffectAst::CostReduction {
                amount,
                filter,
                uses: 1,
            })
        }
        ["the", "next", rest @ ..] => match rest {
            [head @ .., "you", "play", "this", "turn", "costs", n, "less"] => Some(EffectAst::CostReduction {
                amount: parse_number_word(n)?,
                filter: full_filter(head)?,
                uses: 1,
            }),
            _ => None,
        },
        ["prevent", "the", "next", n, "damage", "that", "would", "be", "dealt", "to", rest @ ..] => {
            let (head, duration) = split_duration(rest);
            Some(EffectAst::PreventDamage {
                target: full_target(head)?,
                amount: parse_number_word(n)?,
                duration,
            })
        }
        _ => parse_subject_clause(words),
    }
}

/// Filter that must consume every word, with an optional leading article
fn full_filter(words: &[&str]) -> Option<CardFilter> {
    let words = match words {
        ["a" | "an", rest @ ..] => rest,
        _ => words,
    };
    let (filter, _, used) = parse_filter(words)?;
    (used == words.len()).then_some(filter)
}

fn parse_draw(words: &[&str], player: TargetAst) -> Option<EffectAst> {
    let amount = match words {
        [n, noun, rest @ ..] if is_card_word(noun) => {
            let value = parse_number_word(n)?;
            match rest {
                [] => Amount::fixed(value),
                ["for", "each", tail @ ..] => {
                    let (count, used) = parse_count(tail)?;
                    if used != tail.len() {
                        return None;
                    }
                    Amount::Count(count.times(value))
                }
                _ => return None,
            }
        }
        ["cards", rest @ ..] => parse_full_equal_to(rest)?,
        _ => return None,
    };
    Some(EffectAst::Draw { player, amount })
}

fn parse_lore_amount(words: &[&str]) -> Option<Amount> {
    match words {
        ["lore", rest @ ..] => parse_full_equal_to(rest),
        [n, "lore", rest @ ..] => {
            let value = parse_number_word(n)?;
            let (tail, count) = split_for_each(rest)?;
            if !tail.is_empty() {
                return None;
            }
            Some(scaled(value, count))
        }
        _ => None,
    }
}

fn parse_deal(words: &[&str]) -> Option<EffectAst> {
    match words {
        [n, "damage", "divided", "as", "you", "choose", "among", rest @ ..] => {
            let amount = parse_number_word(n)?;
            let target = match rest {
                ["any", "number", "of", "chosen", tail @ ..] | ["up", "to", _, "chosen", tail @ ..] => {
                    let (filter, side, used) = parse_filter(tail)?;
                    if used != tail.len() {
                        return None;
                    }
                    TargetAst::Chosen {
                        filter,
                        side,
                        count: u32::try_from(amount).ok()?,
                        up_to: true,
                    }
                }
                _ => full_target(rest)?,
            };
            Some(EffectAst::DistributeDamage { amount, target })
        }
        [n, "damage", "to", rest @ ..] => {
            let value = parse_number_word(n)?;
            let (head, count) = split_for_each(rest)?;
            Some(EffectAst::DealDamage {
                target: full_target(head)?,
                amount: scaled(value, count),
            })
        }
        ["damage", "to", rest @ ..] => {
            // "deal damage to chosen character equal to this character's strength"
            let at = rest.windows(2).position(|pair| pair == ["equal", "to"])?;
            Some(EffectAst::DealDamage {
                target: full_target(&rest[..at])?,
                amount: parse_full_equal_to(&rest[at..])?,
            })
        }
        ["damage", "equal", "to", rest @ ..] => {
            let (amount, used) = parse_equal_to(rest)?;
            match &rest[used..] {
                ["to", tail @ ..] => Some(EffectAst::DealDamage {
                    target: full_target(tail)?,
                    amount,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

const HAND_TAILS: &[&[&str]] = &[
    &["to", "their", "players", "hand"],
    &["to", "their", "owners", "hand"],
    &["to", "their", "owners", "hands"],
    &["to", "their", "players", "hands"],
    &["to", "its", "players", "hand"],
    &["to", "its", "owners", "hand"],
    &["to", "their", "hand"],
    &["to", "their", "hands"],
    &["to", "your", "hand"],
];

fn strip_tail<'a, 'w>(words: &'a [&'w str], tails: &[&[&'w str]]) -> Option<&'a [&'w str]> {
    tails
        .iter()
        .find_map(|tail| words.strip_suffix(*tail))
}

fn parse_return(words: &[&str]) -> Option<EffectAst> {
    let head = strip_tail(words, HAND_TAILS)?;
    match head {
        [quantity @ .., "from", "your", "discard"] => {
            let (count, filter_words) = match quantity {
                ["a" | "an", rest @ ..] => (1, rest),
                ["up", "to", n, rest @ ..] => (u32::try_from(parse_number_word(n)?).ok()?, rest),
                [n, rest @ ..] if parse_number_word(n).is_some() => {
                    (u32::try_from(parse_number_word(n)?).ok()?, rest)
                }
                _ => return None,
            };
            let (filter, _, used) = parse_filter(filter_words)?;
            if used != filter_words.len() {
                return None;
            }
            Some(EffectAst::ReturnFromDiscard { filter, count })
        }
        _ => Some(EffectAst::ReturnToHand {
            target: full_target(head)?,
        }),
    }
}

fn parse_remove(words: &[&str]) -> Option<EffectAst> {
    let (amount, up_to, rest) = match words {
        ["up", "to", n, "damage", "from", rest @ ..] => (Some(Amount::fixed(parse_number_word(n)?)), true, rest),
        ["all", "damage", "from", rest @ ..] => (None, false, rest),
        [n, "damage", "from", rest @ ..] => (Some(Amount::fixed(parse_number_word(n)?)), false, rest),
        _ => return None,
    };
    Some(EffectAst::RemoveDamage {
        target: full_target(rest)?,
        amount,
        up_to,
    })
}

fn parse_move(words: &[&str]) -> Option<EffectAst> {
    let damage = match words {
        ["up", "to", n, "damage", "from", rest @ ..] => Some((n, true, rest)),
        [n, "damage", "from", rest @ ..] => Some((n, false, rest)),
        _ => None,
    };
    if let Some((n, up_to, rest)) = damage {
        let (from, used) = target_prefix(rest)?;
        let to = match &rest[used..] {
            ["to", tail @ ..] => full_target(tail)?,
            _ => return None,
        };
        return Some(EffectAst::MoveDamage {
            amount: Amount::fixed(parse_number_word(n)?),
            from,
            to,
            up_to,
        });
    }

    let (target, used) = target_prefix(words)?;
    let rest = match &words[used..] {
        ["to", tail @ ..] => tail,
        _ => return None,
    };
    let (rest, free) = match rest.strip_suffix(&["for", "free"][..]) {
        Some(head) => (head, true),
        None => (rest, false),
    };
    let location = match rest {
        ["a", "location"] | ["a", "location", "of", "yours"] | ["one", "of", "your", "locations"] => {
            TargetAst::Chosen {
                filter: CardFilter::of_type(CardType::Location),
                side: Side::Yours,
                count: 1,
                up_to: false,
            }
        }
        _ => full_target(rest)?,
    };
    Some(EffectAst::MoveToLocation {
        target,
        location,
        free,
    })
}

fn parse_discard(words: &[&str], player: TargetAst) -> Option<EffectAst> {
    let (n, rest) = match words {
        [n, rest @ ..] => (parse_number_word(n)?, rest),
        _ => return None,
    };
    let filter = match rest {
        [noun] if is_card_word(noun) => None,
        _ => {
            let (filter, _, used) = parse_filter(rest)?;
            if used != rest.len() {
                return None;
            }
            Some(filter)
        }
    };
    Some(EffectAst::ChooseAndDiscard {
        player,
        amount: Amount::fixed(n),
        filter,
    })
}

fn search_part(
    part: &[&str],
    destination: &mut PickDestination,
    reveal: &mut bool,
    shuffle: &mut bool,
) -> bool {
    match part {
        [] => {}
        ["reveal", "that", "card", ..] | ["reveal", "it", ..] => *reveal = true,
        ["shuffle", "your", "deck"] => *shuffle = true,
        ["put", "that", "card", dest @ ..] | ["put", "it", dest @ ..] => {
            *destination = match dest {
                ["into", "your", "hand"] => PickDestination::Hand,
                ["into", "your", "inkwell", ..] => PickDestination::Inkwell,
                ["on", "top", "of", "it"] | ["on", "top", "of", "your", "deck"] | ["on", "the", "top", "of", "your", "deck"] => {
                    PickDestination::TopOfDeck
                }
                _ => return false,
            }
        }
        _ => return false,
    }
    true
}

fn parse_search(words: &[&str]) -> Option<EffectAst> {
    let rest = match words {
        ["a" | "an", rest @ ..] => rest,
        _ => return None,
    };
    let (filter, _, used) = parse_filter(rest)?;
    let mut destination = PickDestination::Hand;
    let mut reveal = false;
    let mut shuffle = true;
    let tail = &rest[used..];
    let ok = tail
        .split(|w| *w == "and")
        .all(|part| search_part(part, &mut destination, &mut reveal, &mut shuffle));
    if !ok {
        return None;
    }
    Some(EffectAst::SearchDeck {
        filter,
        destination,
        reveal,
        shuffle,
    })
}

/// "facedown and exerted" style tail after an inkwell destination
fn inkwell_tail(words: &[&str]) -> Option<bool> {
    if words
        .iter()
        .all(|w| matches!(*w, "facedown" | "face" | "down" | "and" | "exerted"))
    {
        Some(words.contains(&"exerted"))
    } else {
        None
    }
}

fn parse_put(words: &[&str]) -> Option<EffectAst> {
    match words {
        ["the", "top", "card", "of", "your", "deck", "into", "your", "inkwell", tail @ ..] => {
            Some(EffectAst::InkTopOfDeck {
                exerted: inkwell_tail(tail)?,
            })
        }
        ["the", "top", n, noun, "of", "your", "deck", "into", "your", "discard"] if is_card_word(noun) => {
            Some(EffectAst::Mill {
                player: TargetAst::You,
                amount: Amount::fixed(parse_number_word(n)?),
            })
        }
        ["the", "top", "card", "of", "your", "deck", "facedown", "under", rest @ ..]
        | ["the", "top", "card", "of", "your", "deck", "under", rest @ ..] => Some(EffectAst::PutCardUnder {
            target: full_target(rest)?,
        }),
        ["a", "card", "from", "your", "hand", "into", "your", "inkwell", tail @ ..] => {
            Some(EffectAst::InkFromHand {
                exerted: inkwell_tail(tail)?,
            })
        }
        _ => {
            let at = words.iter().position(|w| *w == "into")?;
            let target = full_target(&words[..at])?;
            let tail = match &words[at + 1..] {
                ["their" | "your" | "its", "players" | "owners", "inkwell", tail @ ..]
                | ["their" | "your" | "its", "inkwell", tail @ ..] => tail,
                _ => return None,
            };
            Some(EffectAst::PutIntoInkwell {
                target,
                exerted: inkwell_tail(tail)?,
            })
        }
    }
}

fn parse_shuffle(words: &[&str]) -> Option<EffectAst> {
    let head = strip_tail(
        words,
        &[
            &["into", "their", "players", "deck"],
            &["into", "their", "owners", "deck"],
            &["into", "its", "owners", "deck"],
            &["into", "its", "players", "deck"],
            &["into", "their", "deck"],
            &["into", "your", "deck"],
        ],
    )?;
    Some(EffectAst::ShuffleIntoDeck {
        target: full_target(head)?,
    })
}

fn parse_play_free(words: &[&str]) -> Option<EffectAst> {
    let head = words.strip_suffix(&["for", "free"][..])?;
    let (head, from) = match head.strip_suffix(&["from", "your", "discard"][..]) {
        Some(head) => (head, Zone::Discard),
        None => (head, Zone::Hand),
    };
    Some(EffectAst::PlayForFree {
        filter: full_filter(head)?,
        from,
    })
}

/// Clauses led by a player or card subject
fn parse_subject_clause(words: &[&str]) -> Option<EffectAst> {
    let (subject, used) = target_prefix(words)?;
    let rest = &words[used..];
    if subject.is_player_target() {
        return parse_player_clause(subject, rest);
    }

    let (rest, duration) = split_duration(rest);
    match rest {
        ["gets" | "get", changes @ ..] => parse_stat_changes(subject, changes, duration),
        ["gains" | "gain", keyword @ ..] => {
            let (keyword, kw_used) = parse_keyword_word(keyword)?;
            if kw_used != rest.len() - 1 {
                return None;
            }
            Some(EffectAst::GrantKeyword {
                target: subject,
                keyword,
                duration,
            })
        }
        ["cant", "quest", "or", "challenge"] => Some(EffectAst::Sequence {
            effects: vec![
                EffectAst::Restrict {
                    target: subject.clone(),
                    restriction: Restriction::CantQuest,
                    duration,
                },
                EffectAst::Restrict {
                    target: subject,
                    restriction: Restriction::CantChallenge,
                    duration,
                },
            ],
        }),
        ["cant", action @ ..] => {
            let (restriction, duration) = match action {
                ["quest"] => (Restriction::CantQuest, duration),
                ["challenge"] => (Restriction::CantChallenge, duration),
                ["be", "challenged"] => (Restriction::CantBeChallenged, duration),
                ["ready"] => (Restriction::CantReady, duration),
                ["ready", "at", "the", "start", "of", "their", "next", "turn"] => {
                    (Restriction::CantReady, Duration::UntilStartOfYourNextTurn)
                }
                _ => return None,
            };
            Some(EffectAst::Restrict {
                target: subject,
                restriction,
                duration,
            })
        }
        ["takes", "no", "damage"] | ["takes", "no", "damage", "from", "challenges"] => {
            Some(EffectAst::PreventDamage {
                target: subject,
                amount: ALL_DAMAGE,
                duration,
            })
        }
        _ => None,
    }
}

/// "+2 strength and +1 willpower" / "+1 lore for each ..."
fn parse_stat_changes(target: TargetAst, words: &[&str], duration: Duration) -> Option<EffectAst> {
    let (words, count) = split_for_each(words)?;
    let mut strength = Amount::zero();
    let mut willpower = Amount::zero();
    let mut lore = Amount::zero();
    let mut any = false;

    for part in words.split(|w| matches!(*w, "and" | ",")).filter(|p| !p.is_empty()) {
        let [n, stat] = part else {
            return None;
        };
        let amount = scaled(parse_number_word(n)?, count.clone());
        match parse_stat(stat)? {
            Stat::Strength => strength = amount,
            Stat::Willpower => willpower = amount,
            Stat::Lore => lore = amount,
            _ => return None,
        }
        any = true;
    }
    if !any {
        return None;
    }
    Some(EffectAst::ModifyStats {
        target,
        strength,
        willpower,
        lore,
        duration,
    })
}

fn forced_action(verb: &str) -> Option<ForcedAction> {
    match verb {
        "banishes" | "banish" => Some(ForcedAction::Banish),
        "returns" | "return" => Some(ForcedAction::ReturnToHand),
        "exerts" | "exert" => Some(ForcedAction::Exert),
        _ => None,
    }
}

fn parse_player_clause(player: TargetAst, words: &[&str]) -> Option<EffectAst> {
    match words {
        ["loses" | "lose", rest @ ..] => Some(EffectAst::LoseLore {
            player,
            amount: parse_lore_amount(rest)?,
        }),
        ["draws" | "draw", rest @ ..] => parse_draw(rest, player),
        ["chooses", "and", "discards", rest @ ..] | ["discards", rest @ ..] => parse_discard(rest, player),
        ["reveals", "their", "hand"] | ["reveal", "their", "hand"] => Some(EffectAst::RevealHand { player }),
        ["chooses", "and", verb, "one", "of", "their", rest @ ..] => {
            let action = forced_action(verb)?;
            let rest = match action {
                ForcedAction::ReturnToHand => strip_tail(rest, HAND_TAILS)?,
                _ => rest,
            };
            Some(EffectAst::OpponentChooses {
                player,
                action,
                filter: full_filter(rest)?,
            })
        }
        ["chooses", "one", "of", "their", rest @ ..] => {
            let (filter, _, used) = parse_filter(rest)?;
            let (verb, tail) = match &rest[used..] {
                ["and", verb, "it" | "them" | "that", tail @ ..] => (*verb, tail),
                _ => return None,
            };
            let action = forced_action(verb)?;
            let tail_ok = match (action, tail) {
                (_, []) | (_, ["character"]) => true,
                (ForcedAction::ReturnToHand, tail) => HAND_TAILS.iter().any(|t| tail == *t)
                    || matches!(tail, ["character", rest @ ..] if HAND_TAILS.iter().any(|t| rest == *t)),
                _ => false,
            };
            if !tail_ok {
                return None;
            }
            Some(EffectAst::OpponentChooses { player, action, filter })
        }
        ["puts", "the", "top", n, noun, "of", "their", "deck", "into", "their", "discard"] if is_card_word(noun) => {
            Some(EffectAst::Mill {
                player,
                amount: Amount::fixed(parse_number_word(n)?),
            })
        }
        _ => None,
    }
}

/// Parse "put one into your hand and the rest on the bottom" style follow-ups
fn parse_look_followup(words: &[&str]) -> Option<(Option<LookPick>, Option<RestPlacement>)> {
    let simple = |destination: PickDestination, rest: &[&str]| {
        let placement = rest_tail(rest)?;
        Some((
            Some(LookPick {
                filter: None,
                max: 1,
                destination,
                reveal: false,
            }),
            placement,
        ))
    };
    match words {
        ["put", "one", "into", "your", "hand", rest @ ..] => simple(PickDestination::Hand, rest),
        ["put", "one", "into", "your", "inkwell", rest @ ..] => simple(PickDestination::Inkwell, rest),
        ["put", "one", "on", "the", "top", "of", "your", "deck", rest @ ..] => {
            simple(PickDestination::TopOfDeck, rest)
        }
        ["you", "may", "reveal", rest @ ..] => reveal_pick(rest, true),
        ["you", "may", "put", rest @ ..] => reveal_pick(rest, false),
        _ => Some((None, Some(parse_rest_placement(words)?))),
    }
}

fn rest_tail(words: &[&str]) -> Option<Option<RestPlacement>> {
    match words {
        [] => Some(None),
        ["and", rest @ ..] => Some(Some(parse_rest_placement(rest)?)),
        _ => None,
    }
}

fn reveal_pick(words: &[&str], reveal: bool) -> Option<(Option<LookPick>, Option<RestPlacement>)> {
    let (max, rest) = match words {
        ["a" | "an" | "one", rest @ ..] => (1, rest),
        ["up", "to", n, rest @ ..] => (u32::try_from(parse_number_word(n)?).ok()?, rest),
        _ => return None,
    };
    let (filter, _, used) = parse_filter(rest)?;
    let rest = &rest[used..];
    let dest = match rest {
        ["and", "put", "it" | "them", dest @ ..] => dest,
        ["into", ..] | ["on", ..] => rest,
        _ => return None,
    };
    let (destination, tail) = match dest {
        ["into", "your", "hand", tail @ ..] => (PickDestination::Hand, tail),
        ["into", "your", "inkwell", tail @ ..] => (PickDestination::Inkwell, tail),
        ["on", "the", "top", "of", "your", "deck", tail @ ..] => (PickDestination::TopOfDeck, tail),
        _ => return None,
    };
    let placement = rest_tail(tail)?;
    let filter = if filter.is_any() { None } else { Some(filter) };
    Some((
        Some(LookPick {
            filter,
            max,
            destination,
            reveal,
        }),
        placement,
    ))
}

/// Where the remaining looked-at cards go
fn parse_rest_placement(words: &[&str]) -> Option<RestPlacement> {
    let words = match words {
        ["put", rest @ ..] => rest,
        _ => words,
    };
    let dest = match words {
        ["the", "rest", dest @ ..]
        | ["the", "other", dest @ ..]
        | ["the", "others", dest @ ..]
        | ["them", "back", dest @ ..]
        | ["each", "of", "them", dest @ ..]
        | ["them", dest @ ..]
        | ["it", dest @ ..] => dest,
        _ => return None,
    };
    let dest = dest.strip_suffix(&["in", "any", "order"][..]).unwrap_or(dest);
    match dest {
        ["on", "the", "bottom", "of", "your", "deck"] | ["on", "the", "bottom"] => Some(RestPlacement::Bottom),
        ["on", "the", "top", "of", "your", "deck"] | ["on", "top", "of", "your", "deck"] => Some(RestPlacement::Top),
        ["on", "the", "top", "or", "bottom", "of", "your", "deck"]
        | ["on", "the", "top", "or", "the", "bottom", "of", "your", "deck"] => Some(RestPlacement::TopOrBottom),
        ["into", "your", "discard"] => Some(RestPlacement::Discard),
        _ => None,
    }
}
