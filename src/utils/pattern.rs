//! Wildcard patterns compiled to regular expressions.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::error::{Error, Result};

static REGEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/(.+)/([im]+)?$").unwrap());

/// Convert a wildcard pattern into an anchored regex.
///
/// `*` matches any run of characters (including none) and `+` at least one;
/// everything else is literal, so `he*lo` becomes `^he.*?lo$`. A pattern written
/// as `/body/flags` is used as a regex directly, with its own `i`/`m` flags
/// taking the place of `flags`.
pub fn wildcard_to_regex(pattern: &str, flags: Option<&str>) -> Result<Regex> {
    let (source, flags) = match REGEX_LITERAL.captures(pattern) {
        Some(caps) => {
            let body = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let own_flags = caps.get(2).map(|m| m.as_str());
            (body, own_flags.or(flags))
        }
        None => (wildcard_source(pattern), flags),
    };

    let mut builder = RegexBuilder::new(&source);
    for flag in flags.unwrap_or("").chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // Global and unicode matching are always on.
            'g' | 'u' => {}
            other => {
                return Err(Error::validation_invalid_pattern(
                    pattern,
                    format!("unsupported flag '{}'", other),
                ))
            }
        }
    }

    builder
        .build()
        .map_err(|e| Error::validation_invalid_pattern(pattern, e.to_string()))
}

fn wildcard_source(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 2);
    source.push('^');
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*?"),
            '+' => source.push_str(".+?"),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        let regex = wildcard_to_regex("he*lo", None).unwrap();
        assert!(regex.is_match("helo"));
        assert!(regex.is_match("hello"));
        assert!(regex.is_match("helllllllo"));
        assert!(!regex.is_match("helllllllo2"));
        assert!(!regex.is_match("2helllllllo"));
    }

    #[test]
    fn plus_needs_at_least_one() {
        let regex = wildcard_to_regex("he+lo", None).unwrap();
        assert!(!regex.is_match("helo"));
        assert!(regex.is_match("hello"));
        assert!(regex.is_match("helllllllo"));
        assert!(!regex.is_match("helllllllo2"));
        assert!(!regex.is_match("2helllllllo"));
    }

    #[test]
    fn regex_literal_with_flag() {
        let regex = wildcard_to_regex("/^hel.o(me)?$/i", None).unwrap();
        assert!(!regex.is_match("helo"));
        assert!(regex.is_match("hello"));
        assert!(regex.is_match("helpo"));
        assert!(regex.is_match("HELPO"));
        assert!(regex.is_match("helpome"));
        assert!(regex.is_match("helxo"));
        assert!(!regex.is_match("hel"));
        assert!(!regex.is_match("2hel"));
    }

    #[test]
    fn regex_literal_without_flag_is_case_sensitive() {
        let regex = wildcard_to_regex("/^hel.o(me)?$/", None).unwrap();
        assert!(regex.is_match("hello"));
        assert!(!regex.is_match("HELPO"));
        assert!(regex.is_match("helpome"));
    }

    #[test]
    fn caller_flags_apply_to_wildcards() {
        let regex = wildcard_to_regex("he*", Some("i")).unwrap();
        assert!(regex.is_match("HEY"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let regex = wildcard_to_regex("a.b(c)?", None).unwrap();
        assert!(regex.is_match("a.b(c)?"));
        assert!(!regex.is_match("axb(c)"));
    }

    #[test]
    fn invalid_regex_literal_is_reported() {
        let err = wildcard_to_regex("/(unclosed/", None).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_pattern");
        assert_eq!(err.details["pattern"], "/(unclosed/");
    }

    #[test]
    fn unknown_flag_is_reported() {
        let err = wildcard_to_regex("a*", Some("y")).unwrap_err();
        assert!(err.details["error"].as_str().unwrap().contains("'y'"));
    }
}
