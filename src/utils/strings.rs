//! Word splitting and case conversion.

use regex::Regex;
use std::sync::LazyLock;

static ASCII_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x00-\x2f\x3a-\x40\x5b-\x60\x7b-\x7f]+").unwrap());

// Signals that a string needs the case-aware splitter: mixed case, letters next
// to digits, or any punctuation.
static HAS_UNICODE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z][A-Z]|[A-Z]{2,}[a-z]|[0-9][a-zA-Z]|[a-zA-Z][0-9]|[^a-zA-Z0-9 ]").unwrap()
});

/// Split `text` into words.
///
/// Plain space-separated ASCII is split on non-alphanumeric runs. Anything
/// else goes through a case-aware scan, so `fooBar`, `XMLHttp` and `__FOO_BAR__`
/// split the way identifiers are read.
pub fn words(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    if HAS_UNICODE_WORD.is_match(text) {
        case_words(text)
    } else {
        ASCII_WORDS.find_iter(text).map(|m| m.as_str()).collect()
    }
}

fn is_upper(c: char) -> bool {
    c.is_uppercase()
}

fn is_lower(c: char) -> bool {
    c.is_lowercase()
}

fn is_break(c: char) -> bool {
    !c.is_alphanumeric()
}

fn case_words(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |idx: usize| chars.get(idx).map_or(text.len(), |(pos, _)| *pos);

    let mut found = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        match word_end(&chars, idx) {
            Some(end) => {
                found.push(&text[byte_at(idx)..byte_at(end)]);
                idx = end;
            }
            None => idx += 1,
        }
    }
    found
}

/// End index (exclusive) of the word starting at `start`, trying in order:
/// a capitalised or lowercase word ending at a boundary, an uppercase run
/// ending at a boundary or before a capitalised word, either of those without
/// the boundary, then a digit run.
fn word_end(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let at = |idx: usize| chars.get(idx).map(|(_, c)| *c);
    let run = |from: usize, pred: fn(char) -> bool| {
        let mut end = from;
        while at(end).is_some_and(pred) {
            end += 1;
        }
        end
    };

    let lower_from = if at(start).is_some_and(is_upper) {
        start + 1
    } else {
        start
    };
    let lower_end = run(lower_from, is_lower);
    let has_lower = lower_end > lower_from;

    if has_lower {
        match at(lower_end) {
            None => return Some(lower_end),
            Some(c) if is_break(c) || is_upper(c) => return Some(lower_end),
            _ => {}
        }
    }

    let upper_end = run(start, is_upper);
    for end in (start + 1..=upper_end).rev() {
        let boundary = match at(end) {
            None => true,
            Some(c) if is_break(c) => true,
            Some(c) => is_upper(c) && at(end + 1).is_some_and(is_lower),
        };
        if boundary {
            return Some(end);
        }
    }

    if has_lower {
        return Some(lower_end);
    }
    if upper_end > start {
        return Some(upper_end);
    }

    let digit_end = run(start, |c| c.is_ascii_digit());
    (digit_end > start).then_some(digit_end)
}

pub fn lower_case(text: &str) -> String {
    text.to_lowercase()
}

/// Uppercase the first character, keep the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn case_with(text: &str, separator: &str) -> String {
    words(text)
        .into_iter()
        .map(lower_case)
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn kebab_case(text: &str) -> String {
    case_with(text, "-")
}

pub fn snake_case(text: &str) -> String {
    case_with(text, "_")
}

pub fn camel_case(text: &str) -> String {
    words(text)
        .into_iter()
        .enumerate()
        .map(|(idx, word)| {
            let word = lower_case(word);
            if idx == 0 {
                word
            } else {
                capitalize(&word)
            }
        })
        .collect()
}

pub fn trim(text: &str) -> &str {
    text.trim()
}
