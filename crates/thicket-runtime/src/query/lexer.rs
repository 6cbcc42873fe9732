//! Query tokenizer.
//!
//! Tokens are spans into the query text; whitespace and `;` comments are
//! skipped by the lexer itself.

use logos::Logos;
use std::ops::Range;

use super::error::QueryError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub(crate) enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(":")]
    Colon,

    #[token("!")]
    Negation,

    /// Anchor
    #[token(".")]
    Dot,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    /// `@name`
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_.\-]*")]
    Capture,

    /// `#eq?`, `#match?`, ...
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_\-]*[?!]?")]
    Predicate,

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    String,

    /// Node kinds, field names and the `_` wildcard.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_\-]*")]
    Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

pub(crate) fn lex(source: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span: lexer.span(),
            }),
            Err(()) => {
                let span = lexer.span();
                return Err(QueryError::syntax(
                    span.start,
                    format!("unexpected `{}`", &source[span]),
                ));
            }
        }
    }
    Ok(tokens)
}

/// Contents of a string token, escapes resolved.
pub(crate) fn unescape(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
