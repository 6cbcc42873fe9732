use thicket_core::dsl::*;
use thicket_core::{choice, seq};
use thicket_table::deserialize_dfa;

use crate::GenerateError;
use crate::lexer::{build, compile, full_match};
use crate::prepare::prepare;
use crate::test_utils::module_grammar;

#[test]
fn keywords_are_literals_matching_the_word() {
    let lexical = build(&prepare(&module_grammar()).unwrap()).unwrap();
    assert_eq!(lexical.keywords, vec![("module".to_owned(), 1)]);
    assert!(lexical.separator_dfa.is_some());
    assert!(deserialize_dfa(&lexical.lexer_dfa).is_ok());
}

#[test]
fn no_word_no_keywords() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", seq!["if", sym("id")])
        .rule("id", pattern("[a-z]+"))
        .build();
    let lexical = build(&prepare(&grammar).unwrap()).unwrap();
    assert!(lexical.keywords.is_empty());
    assert!(lexical.separator_dfa.is_none());
}

#[test]
fn keywords_are_sorted_and_skip_punctuation() {
    let grammar = GrammarBuilder::new("g")
        .rule(
            "root",
            choice![seq!["while", sym("id")], seq!["do", sym("id"), ";"]],
        )
        .rule("id", pattern("[a-z]+"))
        .word("id")
        .build();
    let lexical = build(&prepare(&grammar).unwrap()).unwrap();
    let words: Vec<&str> = lexical.keywords.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(words, ["do", "while"]);
}

#[test]
fn full_match_requires_whole_input() {
    let dfa = compile(&["[a-z]+", "[0-9]+"]).unwrap();
    assert!(full_match(&dfa, b"abc"));
    assert!(full_match(&dfa, b"42"));
    assert!(!full_match(&dfa, b"abc1"));
    assert!(!full_match(&dfa, b""));
}

#[test]
fn empty_token_is_rejected() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", seq!["a", sym("maybe")])
        .rule("maybe", pattern("b*"))
        .build();
    let err = build(&prepare(&grammar).unwrap()).unwrap_err();
    assert_eq!(err, GenerateError::EmptyToken("maybe".into()));
}

#[test]
fn invalid_regex_is_reported() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", seq!["a", pattern("[b")])
        .build();
    let err = build(&prepare(&grammar).unwrap()).unwrap_err();
    let GenerateError::InvalidRegex { pattern, .. } = err else {
        panic!("expected invalid regex, got {err:?}");
    };
    assert_eq!(pattern, "(?:[b)");
}
