//! Context-aware lexing.
//!
//! The parser asks for one token at a time, passing its current state. The
//! state's lex mode decides which tokens are candidates, so the same bytes
//! can lex differently in different contexts.

mod scanner;

#[cfg(test)]
mod lexer_tests;

pub use scanner::{ExternalMatch, ExternalScanner, ScanCursor, ValidExternals};

use regex_automata::Anchored;
use regex_automata::dfa::Automaton;
use regex_automata::util::start;
use thicket_table::{END_SYMBOL, ERROR_SYMBOL, LexModeId, StateId, SymbolId, TokenKind};

use crate::language::Language;
use crate::length::Length;
use crate::source::{Bytes, Source, measure};

/// One token, positioned relative to where lexing started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub symbol: SymbolId,
    /// Separator bytes skipped before the token.
    pub padding: Length,
    pub size: Length,
    /// Bytes examined past the end of the token.
    pub lookahead_bytes: u32,
    pub lex_mode: LexModeId,
    /// No token matched; `size` covers one character.
    pub unrecognized: bool,
}

pub(crate) struct Lexer<'a, S: Source + ?Sized> {
    language: &'a Language,
    source: &'a S,
}

impl<'a, S: Source + ?Sized> Lexer<'a, S> {
    pub fn new(language: &'a Language, source: &'a S) -> Self {
        Self { language, source }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Next token at `position` for a parser in `state`.
    pub fn lex(&self, position: Length, state: StateId) -> Lexeme {
        let table = self.language.table();
        let lex_mode = table.lex_mode(state);
        let mode = table.lex_mode_info(lex_mode);

        if !mode.externals.is_empty()
            && let Some(lexeme) = self.lex_external(position, &mode.externals, lex_mode)
        {
            return lexeme;
        }

        let start = self.skip_separators(position.bytes as usize);
        let padding = measure(self.source, position.bytes as usize..start);

        if start >= self.source.len() {
            return Lexeme {
                symbol: END_SYMBOL,
                padding,
                size: Length::ZERO,
                lookahead_bytes: 1,
                lex_mode,
                unrecognized: false,
            };
        }

        let mut ends: Vec<Option<usize>> = vec![None; table.tokens.len()];
        let furthest = run(self.language.lexer_dfa(), self.source, start, |pattern, end| {
            ends[pattern] = Some(end);
        });

        let valid = |symbol: SymbolId| mode.terminals.binary_search(&symbol).is_ok();
        let immediate_ok = padding.is_zero();

        let candidates = self.candidates(mode.terminals.iter().copied(), immediate_ok);
        let winner = self.select(&candidates, &ends, start).or_else(|| {
            let everything = self.candidates(table.tokens.iter().map(|t| t.symbol), immediate_ok);
            self.select(&everything, &ends, start)
        });

        let Some((index, end)) = winner else {
            let end = (start + char_width(self.source.byte_at(start))).min(self.source.len());
            return Lexeme {
                symbol: ERROR_SYMBOL,
                padding,
                size: measure(self.source, start..end),
                lookahead_bytes: furthest.saturating_sub(end).max(1) as u32,
                lex_mode,
                unrecognized: true,
            };
        };

        let mut symbol = table.tokens[index].symbol;
        if let Some(keywords) = &table.keywords
            && symbol == keywords.word
            && let Some(keyword) = keywords.lookup(&self.source.slice(start..end))
            && (valid(keyword) || !valid(keywords.word))
        {
            symbol = keyword;
        }

        Lexeme {
            symbol,
            padding,
            size: measure(self.source, start..end),
            lookahead_bytes: furthest.saturating_sub(end).max(1) as u32,
            lex_mode,
            unrecognized: false,
        }
    }

    /// Token indices that may be returned. Keywords are represented by the
    /// word token.
    fn candidates(&self, symbols: impl Iterator<Item = SymbolId>, immediate_ok: bool) -> Vec<usize> {
        let table = self.language.table();
        let keywords = table.keywords.as_ref();
        let mut candidates = Vec::new();
        let mut wants_word = false;
        for symbol in symbols {
            if keywords.is_some_and(|k| k.is_keyword(symbol)) {
                wants_word = true;
                continue;
            }
            if let Some(index) = self.language.token_index(symbol)
                && (immediate_ok || !table.tokens[index].immediate)
            {
                candidates.push(index);
            }
        }
        if wants_word
            && let Some(word) = keywords.and_then(|k| self.language.token_index(k.word))
            && !candidates.contains(&word)
        {
            candidates.push(word);
        }
        candidates
    }

    /// Precedence, then length, then literal over pattern, then declaration order.
    fn select(&self, candidates: &[usize], ends: &[Option<usize>], start: usize) -> Option<(usize, usize)> {
        let tokens = &self.language.table().tokens;
        candidates
            .iter()
            .filter_map(|&index| ends[index].filter(|&end| end > start).map(|end| (index, end)))
            .max_by_key(|&(index, end)| {
                let token = &tokens[index];
                (
                    token.precedence,
                    end,
                    token.kind == TokenKind::String,
                    std::cmp::Reverse(index),
                )
            })
    }

    fn skip_separators(&self, mut offset: usize) -> usize {
        let Some(dfa) = self.language.separator_dfa() else {
            return offset;
        };
        loop {
            let mut longest = offset;
            run(dfa, self.source, offset, |_, end| longest = longest.max(end));
            if longest == offset {
                return offset;
            }
            offset = longest;
        }
    }

    fn lex_external(&self, position: Length, valid: &[u16], lex_mode: LexModeId) -> Option<Lexeme> {
        let scanner = self.language.scanner()?;
        let source: &dyn Source = &self.source;
        let mut cursor = ScanCursor::new(source, position.bytes as usize, position.extent);
        let found = scanner.scan(&mut cursor, &ValidExternals::new(valid))?;
        if !valid.contains(&found.token) {
            tracing::trace!(token = found.token, "external scanner returned an invalid token");
            return None;
        }
        let symbol = *self.language.table().externals.get(found.token as usize)?;
        let (start, end, furthest) = cursor.finish();
        Some(Lexeme {
            symbol,
            padding: measure(self.source, position.bytes as usize..start),
            size: measure(self.source, start..end),
            lookahead_bytes: furthest.saturating_sub(end).max(1) as u32,
            lex_mode,
            unrecognized: false,
        })
    }
}

/// Run an anchored DFA from `start`, reporting `(pattern, end)` for every
/// match. Returns one past the furthest byte examined.
fn run<A: Automaton, S: Source + ?Sized>(
    dfa: &A,
    source: &S,
    start: usize,
    mut on_match: impl FnMut(usize, usize),
) -> usize {
    let Ok(mut state) = dfa.start_state(&start::Config::new().anchored(Anchored::Yes)) else {
        return start;
    };
    let mut offset = start;
    let mut report = |state, end: usize| {
        for i in 0..dfa.match_len(state) {
            on_match(dfa.match_pattern(state, i).as_usize(), end);
        }
    };
    for byte in Bytes::new(source, start) {
        state = dfa.next_state(state, byte);
        offset += 1;
        if dfa.is_match_state(state) {
            // matches are reported one byte late
            report(state, offset - 1);
        }
        if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
            return offset;
        }
    }
    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        report(state, offset);
    }
    offset + 1
}

/// Byte length of the UTF-8 sequence starting with `lead`.
fn char_width(lead: Option<u8>) -> usize {
    match lead {
        Some(b) if b >= 0xF0 => 4,
        Some(b) if b >= 0xE0 => 3,
        Some(b) if b >= 0xC0 => 2,
        _ => 1,
    }
}
