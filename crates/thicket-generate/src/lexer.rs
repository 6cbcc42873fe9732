//! Token and separator automata.
//!
//! All tokens compile into one anchored multi-pattern DFA where pattern `i`
//! is token `i`. `MatchKind::All` keeps every pattern's matches visible so the
//! runtime can choose among candidates by parser state. Patterns are matched
//! on bytes (no Unicode classes), which keeps the automaton small and lets
//! it run over arbitrary input.

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::nfa::thompson;
use regex_automata::util::start;
use regex_automata::util::syntax;
use regex_automata::{Anchored, MatchKind};
use thicket_table::TokenKind;

use crate::GenerateError;
use crate::prepare::PreparedGrammar;

#[derive(Clone, Debug)]
pub(crate) struct Lexical {
    pub lexer_dfa: Vec<u8>,
    pub separator_dfa: Option<Vec<u8>>,
    /// `(keyword text, token index)`, sorted by text.
    pub keywords: Vec<(String, usize)>,
}

pub(crate) fn build(prepared: &PreparedGrammar) -> Result<Lexical, GenerateError> {
    for token in &prepared.tokens {
        check_pattern(&token.regex, &token.name)?;
    }
    for separator in &prepared.separators {
        check_pattern(separator, "extras")?;
    }

    let patterns: Vec<&str> = prepared.tokens.iter().map(|t| t.regex.as_str()).collect();
    let lexer = compile(&patterns)?;
    let lexer_dfa = serialize(&lexer)?;

    let separator_dfa = if prepared.separators.is_empty() {
        None
    } else {
        let patterns: Vec<&str> = prepared.separators.iter().map(String::as_str).collect();
        Some(serialize(&compile(&patterns)?)?)
    };

    let mut keywords = Vec::new();
    if let Some(word) = prepared.word {
        let word_dfa = compile(&[prepared.tokens[word].regex.as_str()])?;
        for (index, token) in prepared.tokens.iter().enumerate() {
            if index != word
                && token.kind == TokenKind::String
                && !token.immediate
                && full_match(&word_dfa, token.source.as_bytes())
            {
                keywords.push((token.source.clone(), index));
            }
        }
        keywords.sort();
        keywords.dedup_by(|a, b| a.0 == b.0);
    }

    tracing::trace!(
        tokens = prepared.tokens.len(),
        separators = prepared.separators.len(),
        keywords = keywords.len(),
        "built lexer automata"
    );

    Ok(Lexical {
        lexer_dfa,
        separator_dfa,
        keywords,
    })
}

/// Reject invalid regexes and tokens that can match nothing at all.
fn check_pattern(pattern: &str, name: &str) -> Result<(), GenerateError> {
    let hir = regex_syntax::ParserBuilder::new()
        .unicode(false)
        .utf8(false)
        .build()
        .parse(pattern)
        .map_err(|e| GenerateError::InvalidRegex {
            pattern: pattern.to_owned(),
            message: e.to_string(),
        })?;
    if hir.properties().minimum_len() == Some(0) {
        return Err(GenerateError::EmptyToken(name.to_owned()));
    }
    Ok(())
}

pub(crate) fn compile(patterns: &[&str]) -> Result<dense::DFA<Vec<u32>>, GenerateError> {
    dense::Builder::new()
        .configure(
            dense::Config::new()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .syntax(syntax::Config::new().unicode(false).utf8(false))
        .thompson(thompson::Config::new().utf8(false))
        .build_many(patterns)
        .map_err(|e| GenerateError::Automaton(e.to_string()))
}

fn serialize(dfa: &dense::DFA<Vec<u32>>) -> Result<Vec<u8>, GenerateError> {
    let sparse = dfa
        .to_sparse()
        .map_err(|e| GenerateError::Automaton(e.to_string()))?;
    Ok(sparse.to_bytes_little_endian())
}

/// Whether the whole of `text` matches some pattern of `dfa`.
pub(crate) fn full_match<A: Automaton>(dfa: &A, text: &[u8]) -> bool {
    let Ok(mut state) = dfa.start_state(&start::Config::new().anchored(Anchored::Yes)) else {
        return false;
    };
    for &byte in text {
        state = dfa.next_state(state, byte);
        if dfa.is_dead_state(state) {
            return false;
        }
    }
    dfa.is_match_state(dfa.next_eoi_state(state))
}
