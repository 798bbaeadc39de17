//! Rules-text normalization and tokenization

use crate::core::Card;

/// A lexical token of normalized rules text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Comma,
    Period,
    Colon,
    /// A free-standing dash (activated-ability separator or mode bullet)
    Dash,
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w.as_str()),
            _ => None,
        }
    }

    /// Word text, or the punctuation mark itself
    pub fn text(&self) -> &str {
        match self {
            Token::Word(w) => w.as_str(),
            Token::Comma => ",",
            Token::Period => ".",
            Token::Colon => ":",
            Token::Dash => "-",
        }
    }
}

/// Font glyphs and brace codes for stats and symbols
const SYMBOLS: &[(&str, &str)] = &[
    ("{s}", " strength "),
    ("{w}", " willpower "),
    ("{l}", " lore "),
    ("{i}", " ink "),
    ("{e}", " exert "),
    ("¤", " strength "),
    ("¥", " willpower "),
    ("◊", " lore "),
    ("⬡", " ink "),
    ("⟳", " exert "),
];

fn replace_symbols(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while !rest.is_empty() {
        for (symbol, word) in SYMBOLS {
            if rest.len() >= symbol.len()
                && rest.is_char_boundary(symbol.len())
                && rest[..symbol.len()].eq_ignore_ascii_case(symbol)
            {
                out.push_str(word);
                rest = &rest[symbol.len()..];
                continue 'outer;
            }
        }
        let ch = rest.chars().next().unwrap_or(' ');
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Drop reminder text in parentheses (nesting-aware)
pub fn strip_parenthetical(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

fn is_caps_word(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Strip a leading ALL-CAPS ability name ("ROYAL WARNING When you play ...")
pub fn strip_ability_name(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let caps = words.iter().take_while(|w| is_caps_word(w)).count();
    // A lone caps word could be an acronym; a caps run must leave text behind
    if caps == 0 || caps == words.len() || (caps == 1 && words[0].len() < 3) {
        return text.trim().to_string();
    }
    words[caps..].join(" ")
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str, skip_after: Option<&str>) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let lower = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    // Lowercasing can change byte lengths for some scripts; fall back to no-op
    if lower.len() != haystack.len() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(&needle) {
        if idx < last {
            continue;
        }
        let end = idx + needle.len();
        let boundary_before = idx == 0 || !lower[..idx].ends_with(|c: char| c.is_alphanumeric());
        let boundary_after = end == lower.len() || !lower[end..].starts_with(|c: char| c.is_alphanumeric());
        let skipped = skip_after.is_some_and(|prefix| lower[..idx].trim_end().ends_with(prefix));
        if boundary_before && boundary_after && !skipped {
            out.push_str(&haystack[last..idx]);
            out.push_str(replacement);
            last = end;
        }
    }
    out.push_str(&haystack[last..]);
    out
}

/// Normalize one rules-text section to lowercase ascii with names and
/// symbols replaced. Returns `None` when nothing is left (pure reminder text).
pub fn normalize_section(text: &str, card: Option<&Card>) -> Option<String> {
    let text = replace_symbols(text);
    let text = strip_parenthetical(&text);
    let text = strip_ability_name(&text);
    let text = match card {
        Some(card) => {
            let self_ref = format!("this {}", card.card_type.label());
            let replaced = replace_ignore_case(&text, &card.full_name(), &self_ref, Some("named"));
            replace_ignore_case(&replaced, card.name.base_name(), &self_ref, Some("named"))
        }
        None => text,
    };
    let folded = deunicode::deunicode(&text).replace("--", "-").to_lowercase();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Split normalized text into tokens
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let chars: Vec<char> = text.chars().collect();

    let flush = |buffer: &mut String, tokens: &mut Vec<Token>| {
        if !buffer.is_empty() {
            tokens.push(Token::Word(std::mem::take(buffer)));
        }
    };

    for (idx, &ch) in chars.iter().enumerate() {
        let next = chars.get(idx + 1).copied().unwrap_or('\0');
        let signed_number = (ch == '+' || ch == '-') && next.is_ascii_digit() && buffer.is_empty();

        if ch.is_ascii_alphanumeric() || signed_number {
            buffer.push(ch.to_ascii_lowercase());
            continue;
        }
        if ch == '\'' {
            // possessives and contractions fold into the word
            continue;
        }

        flush(&mut buffer, &mut tokens);
        match ch {
            ',' | ';' => tokens.push(Token::Comma),
            '.' | '!' => tokens.push(Token::Period),
            ':' => tokens.push(Token::Colon),
            '-' => tokens.push(Token::Dash),
            _ => {}
        }
    }
    flush(&mut buffer, &mut tokens);
    tokens
}

pub fn words(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(Token::text).collect()
}

fn split_on(tokens: &[Token], is_sep: impl Fn(&Token) -> bool) -> Vec<Vec<Token>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if is_sep(token) {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.clone());
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

pub fn split_on_period(tokens: &[Token]) -> Vec<Vec<Token>> {
    split_on(tokens, |t| matches!(t, Token::Period))
}

pub fn split_on_comma(tokens: &[Token]) -> Vec<Vec<Token>> {
    split_on(tokens, |t| matches!(t, Token::Comma))
}
