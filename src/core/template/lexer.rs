//! Tokenizer for the code inside template fragments.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    OptionalDot,
    Comma,
    Semi,
    Colon,
    Question,
    Nullish,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    And,
    Or,
}

impl Punct {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Dot => ".",
            Punct::OptionalDot => "?.",
            Punct::Comma => ",",
            Punct::Semi => ";",
            Punct::Colon => ":",
            Punct::Question => "?",
            Punct::Nullish => "??",
            Punct::Bang => "!",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::Assign => "=",
            Punct::LooseEq => "==",
            Punct::LooseNe => "!=",
            Punct::StrictEq => "===",
            Punct::StrictNe => "!==",
            Punct::And => "&&",
            Punct::Or => "||",
        }
    }
}

// Longest operators first so `===` wins over `==` and `=`.
const PUNCTS: &[(&str, Punct)] = &[
    ("===", Punct::StrictEq),
    ("!==", Punct::StrictNe),
    ("==", Punct::LooseEq),
    ("!=", Punct::LooseNe),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::And),
    ("||", Punct::Or),
    ("??", Punct::Nullish),
    ("?.", Punct::OptionalDot),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (".", Punct::Dot),
    (",", Punct::Comma),
    (";", Punct::Semi),
    (":", Punct::Colon),
    ("?", Punct::Question),
    ("!", Punct::Bang),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("=", Punct::Assign),
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Punct(Punct),
    /// Literal text or a guarded expression, by emission index.
    Emit(usize),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Text following `offset` in `code`, shortened for error details.
pub(crate) fn near(code: &str, offset: usize) -> Option<String> {
    let rest = code.get(offset..)?;
    let snippet: String = rest.chars().take(16).collect();
    if snippet.is_empty() {
        None
    } else {
        Some(snippet)
    }
}

/// Tokenize fragment code. `base` is the fragment's offset in the template source,
/// so token offsets point into the original template.
pub(crate) fn tokenize(code: &str, base: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = code.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if is_ident_start(c) {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                offset: base + pos,
            });
            continue;
        }

        let rest = &code[pos..];
        let starts_fraction = c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit());
        if c.is_ascii_digit() || starts_fraction {
            let len = number_len(rest);
            let literal = &rest[..len];
            let value: f64 = literal.parse().map_err(|_| {
                Error::template_syntax(base + pos, "invalid number literal", near(code, pos))
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: base + pos,
            });
            for _ in literal.chars() {
                chars.next();
            }
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, '0')) => value.push('\0'),
                        Some((_, other)) => value.push(other),
                        None => break,
                    },
                    ch if ch == c => {
                        closed = true;
                        break;
                    }
                    ch => value.push(ch),
                }
            }
            if !closed {
                return Err(Error::template_syntax(
                    base + pos,
                    "unterminated string literal",
                    near(code, pos),
                ));
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                offset: base + pos,
            });
            continue;
        }

        match PUNCTS.iter().find(|(text, _)| rest.starts_with(text)) {
            Some((text, punct)) => {
                tokens.push(Token {
                    kind: TokenKind::Punct(*punct),
                    offset: base + pos,
                });
                for _ in text.chars() {
                    chars.next();
                }
            }
            None => {
                return Err(Error::template_syntax(
                    base + pos,
                    format!("unexpected character '{}'", c),
                    near(code, pos),
                ));
            }
        }
    }

    Ok(tokens)
}

fn number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut len = 0;
    while len < bytes.len() && bytes[len].is_ascii_digit() {
        len += 1;
    }
    if len < bytes.len() && bytes[len] == b'.' {
        len += 1;
        while len < bytes.len() && bytes[len].is_ascii_digit() {
            len += 1;
        }
    }
    if len < bytes.len() && (bytes[len] == b'e' || bytes[len] == b'E') {
        let mut exp = len + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            len = exp;
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code, 0)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_typeof_comparison() {
        assert_eq!(
            kinds("typeof boy!=='undefined'"),
            vec![
                TokenKind::Ident("typeof".to_string()),
                TokenKind::Ident("boy".to_string()),
                TokenKind::Punct(Punct::StrictNe),
                TokenKind::Str("undefined".to_string()),
            ]
        );
    }

    #[test]
    fn offsets_are_relative_to_template() {
        let tokens = tokenize(" a . b", 10).unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![11, 13, 15]);
    }

    #[test]
    fn numbers_with_fraction_and_exponent() {
        assert_eq!(
            kinds("1.5 .25 2e3"),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Number(0.25),
                TokenKind::Number(2000.0),
            ]
        );
    }

    #[test]
    fn member_access_after_number_is_not_fraction() {
        assert_eq!(
            kinds("a.b"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct(Punct::Dot),
                TokenKind::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"\n""#),
            vec![TokenKind::Str("say \"hi\"\n".to_string())]
        );
    }

    #[test]
    fn unterminated_string_is_syntax_error() {
        let err = tokenize("'open", 4).unwrap_err();
        assert_eq!(err.code.as_str(), "template.syntax");
        assert_eq!(err.details["offset"], 4);
    }

    #[test]
    fn unknown_character_is_syntax_error() {
        let err = tokenize("a # b", 0).unwrap_err();
        assert!(err.message.contains("unexpected character '#'"));
    }
}
