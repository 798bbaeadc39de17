//! Noun phrases: numbers, card filters, targets, counts and durations
//!
//! Phrase parsers take a word slice and return the parsed value together
//! with the number of words consumed.

use crate::core::{
    CardFilter, CardType, Comparison, CountExpr, Duration, Keyword, Owner, Side, Stat, StatBound,
    Subtype, TargetAst,
};
use crate::zones::Zone;

pub fn parse_number_word(word: &str) -> Option<i32> {
    if let Ok(value) = word.trim_start_matches('+').parse::<i32>() {
        return Some(value);
    }
    let value = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(value)
}

pub fn parse_number(words: &[&str]) -> Option<(i32, usize)> {
    let value = parse_number_word(words.first()?)?;
    Some((value, 1))
}

pub fn parse_stat(word: &str) -> Option<Stat> {
    match word {
        "strength" => Some(Stat::Strength),
        "willpower" => Some(Stat::Willpower),
        "lore" => Some(Stat::Lore),
        "cost" => Some(Stat::Cost),
        "damage" => Some(Stat::Damage),
        _ => None,
    }
}

/// "or less" / "or more" after a number
fn parse_bound_tail(words: &[&str]) -> Option<(Comparison, usize)> {
    match words {
        ["or", "less", ..] | ["or", "lower", ..] => Some((Comparison::AtMost, 2)),
        ["or", "more", ..] | ["or", "greater", ..] | ["or", "higher", ..] => Some((Comparison::AtLeast, 2)),
        _ => Some((Comparison::Exactly, 0)),
    }
}

/// "N or more" / "N or less" / "N"
pub fn parse_bound(words: &[&str]) -> Option<(StatBound, usize)> {
    let (value, used) = parse_number(words)?;
    let (cmp, tail) = parse_bound_tail(&words[used..])?;
    Some((StatBound { cmp, value }, used + tail))
}

pub fn parse_card_type(word: &str) -> Option<CardType> {
    match word {
        "character" | "characters" => Some(CardType::Character),
        "item" | "items" => Some(CardType::Item),
        "location" | "locations" => Some(CardType::Location),
        "action" | "actions" => Some(CardType::Action),
        "song" | "songs" => Some(CardType::Song),
        _ => None,
    }
}

fn is_card_noun(word: &str) -> bool {
    matches!(word, "card" | "cards")
}

pub fn parse_keyword_word(words: &[&str]) -> Option<(Keyword, usize)> {
    let word = *words.first()?;
    let numeric = |make: fn(i32) -> Keyword| {
        let (value, used) = parse_number(&words[1..])?;
        Some((make(value), 1 + used))
    };
    match word {
        "bodyguard" => Some((Keyword::Bodyguard, 1)),
        "evasive" => Some((Keyword::Evasive, 1)),
        "reckless" => Some((Keyword::Reckless, 1)),
        "rush" => Some((Keyword::Rush, 1)),
        "support" => Some((Keyword::Support, 1)),
        "ward" => Some((Keyword::Ward, 1)),
        "vanish" => Some((Keyword::Vanish, 1)),
        "resist" => numeric(Keyword::Resist),
        "challenger" => numeric(Keyword::Challenger),
        "singer" => numeric(Keyword::Singer),
        _ => None,
    }
}

/// Words that end a "named X" phrase
fn ends_name(word: &str) -> bool {
    matches!(
        word,
        "in" | "to" | "and" | "," | "." | "from" | "for" | "with" | "gets" | "get" | "at" | "is" | "are" | "-"
    )
}

/// Card-describing phrase such as "other damaged pirate characters with cost 3 or less"
///
/// Returns the filter, which side of the table it names, and words consumed.
pub fn parse_filter(words: &[&str]) -> Option<(CardFilter, Side, usize)> {
    let mut filter = CardFilter::default();
    let mut side = Side::Any;
    let mut i = 0;

    // modifiers
    while let Some(word) = words.get(i) {
        match *word {
            "opposing" => side = Side::Opposing,
            "your" => side = Side::Yours,
            "other" | "another" => filter.exclude_self = true,
            "damaged" => filter.damaged = Some(true),
            "undamaged" => filter.damaged = Some(false),
            "exerted" => filter.exerted = Some(true),
            "ready" => filter.exerted = Some(false),
            _ => break,
        }
        i += 1;
    }

    // up to two subtype words before the noun
    let mut subtype_words: Vec<&str> = Vec::new();
    let noun_at = (i..words.len().min(i + 3)).find(|&j| {
        parse_card_type(words[j]).is_some() || is_card_noun(words[j])
    })?;
    for word in &words[i..noun_at] {
        if parse_number_word(word).is_some() || matches!(*word, "the" | "of" | "chosen") {
            return None;
        }
        subtype_words.push(*word);
    }
    if !subtype_words.is_empty() {
        filter.subtype = Some(Subtype::new(subtype_words.join(" ")));
    }
    i = noun_at;
    if let Some(card_type) = parse_card_type(words[i]) {
        filter.card_types.push(card_type);
        i += 1;
        if words.get(i).is_some_and(|w| is_card_noun(w)) {
            i += 1;
        }
    } else {
        i += 1;
    }

    // suffixes
    loop {
        match &words[i..] {
            ["of", "yours", ..] => {
                side = Side::Yours;
                i += 2;
            }
            ["with", "cost", rest @ ..] => {
                let (bound, used) = parse_bound(rest)?;
                filter.cost = Some(bound);
                i += 2 + used;
            }
            ["with", "no", "damage", ..] => {
                filter.damaged = Some(false);
                i += 3;
            }
            ["with", rest @ ..] if parse_number(rest).is_some() => {
                let (value, used) = parse_number(rest)?;
                let stat = rest.get(used).and_then(|w| parse_stat(w))?;
                let (cmp, tail) = parse_bound_tail(&rest[used + 1..])?;
                let bound = StatBound { cmp, value };
                match stat {
                    Stat::Strength => filter.strength = Some(bound),
                    Stat::Willpower => filter.willpower = Some(bound),
                    Stat::Cost => filter.cost = Some(bound),
                    _ => return None,
                }
                i += 1 + used + 1 + tail;
            }
            ["with", rest @ ..] if parse_keyword_word(rest).is_some() => {
                let (keyword, used) = parse_keyword_word(rest)?;
                filter.keyword = Some(keyword);
                i += 1 + used;
            }
            ["named", rest @ ..] => {
                let len = rest.iter().take_while(|w| !ends_name(w)).count();
                if len == 0 {
                    return None;
                }
                filter.name = Some(rest[..len].join(" "));
                i += 1 + len;
            }
            _ => break,
        }
    }

    Some((filter, side, i))
}

/// Zone phrase after a counted noun ("you have in play", "in your hand")
fn parse_count_scope(words: &[&str], side: Side) -> Option<(Zone, Owner, usize)> {
    let side_owner = match side {
        Side::Yours => Owner::You,
        Side::Opposing => Owner::Opponents,
        Side::Any => Owner::Any,
    };
    let found = match words {
        ["you", "have", "in", "play", ..] => (Zone::Play, Owner::You, 4),
        ["your", "opponents", "have", "in", "play", ..] => (Zone::Play, Owner::Opponents, 5),
        ["in", "play", ..] => (Zone::Play, side_owner, 2),
        ["in", "your", "hand", ..] => (Zone::Hand, Owner::You, 3),
        ["in", "your", "discard", ..] => (Zone::Discard, Owner::You, 3),
        ["in", "your", "inkwell", ..] => (Zone::Inkwell, Owner::You, 3),
        ["in", "your", "opponents", "hands", ..] => (Zone::Hand, Owner::Opponents, 4),
        ["in", "your", "opponents", "discards", ..] => (Zone::Discard, Owner::Opponents, 4),
        ["you", "have", "in", "your", "discard", ..] => (Zone::Discard, Owner::You, 5),
        _ => (Zone::Play, side_owner, 0),
    };
    Some(found)
}

/// Counted noun phrase ("other character you have in play", "card in your hand")
pub fn parse_count(words: &[&str]) -> Option<(CountExpr, usize)> {
    let (filter, side, used) = parse_filter(words)?;
    let (zone, owner, scope) = parse_count_scope(&words[used..], side)?;
    let filter = if filter.is_any() { None } else { Some(filter) };
    Some((CountExpr::new(zone, owner, filter), used + scope))
}

/// How participants are picked ("chosen opposing character", "each opponent")
pub fn parse_target(words: &[&str]) -> Option<(TargetAst, usize)> {
    let chosen = |rest: &[&str], count: u32, up_to: bool, skip: usize, other: bool| {
        let (mut filter, side, used) = parse_filter(rest)?;
        filter.exclude_self |= other;
        Some((
            TargetAst::Chosen {
                filter,
                side,
                count,
                up_to,
            },
            skip + used,
        ))
    };
    let each = |rest: &[&str], skip: usize, forced: Option<Side>| {
        let (filter, side, used) = parse_filter(rest)?;
        Some((
            TargetAst::Each {
                filter,
                side: forced.unwrap_or(side),
            },
            skip + used,
        ))
    };

    match words {
        ["this", noun, ..] if parse_card_type(noun).is_some() || is_card_noun(noun) => {
            Some((TargetAst::ThisCard, 2))
        }
        ["the", "challenging", "character", ..] => Some((TargetAst::Challenger, 3)),
        ["that", "character", ..] | ["that", "card", ..] => Some((TargetAst::EventCard, 2)),
        ["each", "opponent", ..] | ["all", "opponents", ..] => Some((TargetAst::EachOpponent, 2)),
        ["chosen", "opponent", ..] => Some((TargetAst::ChosenOpponent, 2)),
        ["each", "player", ..] | ["all", "players", ..] => Some((TargetAst::EachPlayer, 2)),
        ["you", ..] => Some((TargetAst::You, 1)),
        ["another", "chosen", rest @ ..] => chosen(rest, 1, false, 2, true),
        ["chosen", rest @ ..] => chosen(rest, 1, false, 1, false),
        ["up", "to", n, "chosen", rest @ ..] => {
            let count = parse_number_word(n)?;
            chosen(rest, u32::try_from(count).ok()?, true, 4, false)
        }
        ["up", "to", n, "other", "chosen", rest @ ..] => {
            let count = parse_number_word(n)?;
            chosen(rest, u32::try_from(count).ok()?, true, 5, true)
        }
        [n, "chosen", rest @ ..] if parse_number_word(n).is_some() => {
            let count = parse_number_word(n)?;
            chosen(rest, u32::try_from(count).ok()?, false, 2, false)
        }
        ["each", "of", "your", rest @ ..] | ["all", "of", "your", rest @ ..] => {
            each(rest, 3, Some(Side::Yours))
        }
        ["each", rest @ ..] | ["all", rest @ ..] => each(rest, 1, None),
        ["your", ..] => each(words, 0, Some(Side::Yours)),
        ["opposing", ..] => each(words, 0, Some(Side::Opposing)),
        _ => None,
    }
}

/// Trailing duration phrase
pub fn parse_duration(words: &[&str]) -> Option<(Duration, usize)> {
    match words {
        ["this", "turn", ..] => Some((Duration::ThisTurn, 2)),
        ["for", "the", "rest", "of", "this", "turn", ..] => Some((Duration::ThisTurn, 6)),
        ["until", "the", "start", "of", "your", "next", "turn", ..] => {
            Some((Duration::UntilStartOfYourNextTurn, 7))
        }
        ["during", "their", "next", "turn", ..] | ["during", "the", "next", "turn", ..] => {
            Some((Duration::UntilStartOfYourNextTurn, 4))
        }
        _ => None,
    }
}

/// Split a trailing duration off a clause
pub fn split_duration<'a, 'w>(words: &'a [&'w str]) -> (&'a [&'w str], Duration) {
    for start in (0..words.len()).rev() {
        if let Some((duration, used)) = parse_duration(&words[start..]) {
            if start + used == words.len() {
                return (&words[..start], duration);
            }
        }
    }
    (words, Duration::WhileInPlay)
}

/// Does this word start a pronoun reference to the source card?
pub fn is_self_pronoun(word: &str) -> bool {
    matches!(word, "he" | "she" | "it" | "they" | "him" | "her" | "them")
}
