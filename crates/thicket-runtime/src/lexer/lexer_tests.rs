use thicket_table::{END_SYMBOL, ERROR_SYMBOL, ParseAction, StateId, SymbolId};

use super::{ExternalMatch, ExternalScanner, Lexer, ScanCursor, ValidExternals};
use crate::length::{Length, Point};
use crate::source::ChunkedSource;
use crate::test_utils::{heredoc_grammar, load, module_language};
use crate::Language;

fn symbol(language: &Language, name: &str, named: bool) -> SymbolId {
    language.symbol_for_name(name, named).unwrap()
}

/// State reached by shifting `path` from the start state.
fn state_after(language: &Language, path: &[SymbolId]) -> StateId {
    let table = language.table();
    path.iter().fold(table.start_state, |state, &symbol| {
        match table.actions(state, symbol) {
            [ParseAction::Shift { state }] => *state,
            other => panic!("expected a single shift, found {other:?}"),
        }
    })
}

#[test]
fn keyword_at_start() {
    let language = module_language();
    let text = "module M { }";
    let lexeme = Lexer::new(&language, text).lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.symbol, symbol(&language, "module", false));
    assert_eq!(lexeme.padding, Length::ZERO);
    assert_eq!(lexeme.size.bytes, 6);
    assert!(!lexeme.unrecognized);
}

#[test]
fn keyword_text_lexes_as_identifier_where_only_identifiers_fit() {
    let language = module_language();
    let module = symbol(&language, "module", false);
    let text = "module module { }";
    let state = state_after(&language, &[module]);
    let lexeme = Lexer::new(&language, text).lex(Length::of(b"module"), state);
    assert_eq!(lexeme.symbol, symbol(&language, "identifier", true));
    assert_eq!(lexeme.padding.bytes, 1);
    assert_eq!(lexeme.size.bytes, 6);
}

#[test]
fn padding_tracks_rows_and_columns() {
    let language = module_language();
    let text = "\n\n  module";
    let lexeme = Lexer::new(&language, text).lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.padding, Length::new(4, Point::new(2, 2)));
    assert_eq!(lexeme.size, Length::new(6, Point::new(0, 6)));
}

#[test]
fn comments_are_lexed_in_every_state() {
    let language = module_language();
    let comment = symbol(&language, "comment", true);
    let text = "// note\nmodule";
    let lexeme = Lexer::new(&language, text).lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.symbol, comment);
    assert_eq!(lexeme.size.bytes, 7);
}

#[test]
fn end_of_input() {
    let language = module_language();
    let text = "  \n";
    let lexeme = Lexer::new(&language, text).lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.symbol, END_SYMBOL);
    assert_eq!(lexeme.padding.bytes, 3);
    assert_eq!(lexeme.size, Length::ZERO);
}

#[test]
fn unrecognized_character_covers_one_char() {
    let language = module_language();
    let text = " é module";
    let lexeme = Lexer::new(&language, text).lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.symbol, ERROR_SYMBOL);
    assert!(lexeme.unrecognized);
    assert_eq!(lexeme.padding.bytes, 1);
    assert_eq!(lexeme.size.bytes, 2);
    assert_eq!(lexeme.size.extent, Point::new(0, 2));
}

#[test]
fn token_valid_elsewhere_is_still_returned() {
    let language = module_language();
    // `{` is never valid at the start, but recovery needs to see it
    let lexeme = Lexer::new(&language, "{").lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.symbol, symbol(&language, "{", false));
    assert!(!lexeme.unrecognized);
}

#[test]
fn chunk_boundaries_are_invisible() {
    let language = module_language();
    let chunked: ChunkedSource = ["mo", "du", "le  ", "M"].into_iter().collect();
    let lexer = Lexer::new(&language, &chunked);
    let first = lexer.lex(Length::ZERO, language.table().start_state);
    assert_eq!(first.symbol, symbol(&language, "module", false));
    assert_eq!(first.size.bytes, 6);

    let state = state_after(&language, &[first.symbol]);
    let second = lexer.lex(first.size, state);
    assert_eq!(second.symbol, symbol(&language, "identifier", true));
    assert_eq!(second.padding.bytes, 2);
    assert_eq!(second.size.bytes, 1);
}

#[test]
fn lookahead_counts_bytes_examined_past_the_token() {
    let language = module_language();
    let lexeme = Lexer::new(&language, "module{").lex(Length::ZERO, language.table().start_state);
    assert_eq!(lexeme.size.bytes, 6);
    assert!(lexeme.lookahead_bytes >= 1);
}

/// Recognizes `<<...>>` as the grammar's single external token.
struct Heredoc;

impl ExternalScanner for Heredoc {
    fn scan(&self, cursor: &mut ScanCursor<'_>, valid: &ValidExternals<'_>) -> Option<ExternalMatch> {
        if !valid.contains(0) {
            return None;
        }
        while matches!(cursor.lookahead(), Some(b' ' | b'\t' | b'\n')) {
            cursor.skip();
        }
        for _ in 0..2 {
            if cursor.lookahead() != Some(b'<') {
                return None;
            }
            cursor.advance();
        }
        let mut closing = 0;
        while closing < 2 {
            match cursor.lookahead()? {
                b'>' => closing += 1,
                _ => closing = 0,
            }
            cursor.advance();
        }
        cursor.mark_end();
        Some(ExternalMatch { token: 0 })
    }
}

#[test]
fn external_scanner_runs_where_its_token_is_valid() {
    let language = load(&heredoc_grammar()).with_scanner(Heredoc);
    let path = [
        symbol(&language, "let", false),
        symbol(&language, "identifier", true),
        symbol(&language, "=", false),
    ];
    let state = state_after(&language, &path);
    let text = "let x =  <<a > b>>;";
    let lexeme = Lexer::new(&language, text).lex(Length::of(b"let x ="), state);
    assert_eq!(lexeme.symbol, symbol(&language, "raw", true));
    assert_eq!(lexeme.padding.bytes, 2);
    assert_eq!(lexeme.size.bytes, 9);
}

#[test]
fn external_scanner_falls_back_to_the_regular_lexer() {
    let language = load(&heredoc_grammar()).with_scanner(Heredoc);
    let path = [
        symbol(&language, "let", false),
        symbol(&language, "identifier", true),
        symbol(&language, "=", false),
    ];
    let state = state_after(&language, &path);
    let text = "let x = y;";
    let lexeme = Lexer::new(&language, text).lex(Length::of(b"let x ="), state);
    assert_eq!(lexeme.symbol, symbol(&language, "identifier", true));
    assert_eq!(lexeme.padding.bytes, 1);
}
