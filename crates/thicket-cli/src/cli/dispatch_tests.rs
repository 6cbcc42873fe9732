//! Tests for CLI dispatch: argument parsing and params extraction.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{
    check_command, dump_command, edit_command, generate_command, query_command, tree_command,
};
use crate::commands::lang_resolver::LanguageChoice;
use crate::commands::source::SourceInput;

#[test]
fn cli_definition_is_consistent() {
    build_cli().debug_assert();
}

#[test]
fn tree_takes_positional_source_and_language() {
    let m = tree_command()
        .try_get_matches_from(["tree", "suite.ttcn3", "-l", "ttcn3", "--raw", "--spans"])
        .unwrap();
    let params = TreeParams::from_matches(&m);
    assert_eq!(params.input.path, Some(PathBuf::from("suite.ttcn3")));
    assert_eq!(params.input.text, None);
    assert_eq!(params.language, LanguageChoice::bundled("ttcn3"));
    assert!(params.raw);
    assert!(params.spans);
    assert_eq!(params.max_versions, None);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn tree_takes_inline_source_and_table() {
    let m = tree_command()
        .try_get_matches_from(["tree", "-s", "module M {}", "-t", "lang.tbl", "--max-versions", "2"])
        .unwrap();
    let params = TreeParams::from_matches(&m);
    assert_eq!(params.input, SourceInput::inline("module M {}"));
    assert_eq!(params.language.table, Some(PathBuf::from("lang.tbl")));
    assert_eq!(params.language.lang, None);
    assert_eq!(params.max_versions, Some(2));
}

#[test]
fn source_path_and_inline_source_conflict() {
    let result = tree_command().try_get_matches_from(["tree", "a.ttcn3", "-s", "x"]);
    assert!(result.is_err());
}

#[test]
fn lang_and_table_conflict() {
    let result = check_command().try_get_matches_from(["check", "a.ttcn3", "-l", "ttcn3", "-t", "x.tbl"]);
    assert!(result.is_err());
}

#[test]
fn check_color_choice() {
    let m = check_command()
        .try_get_matches_from(["check", "-", "-l", "ttcn3", "--color", "never"])
        .unwrap();
    let params = CheckParams::from_matches(&m);
    assert_eq!(params.input.path, Some(PathBuf::from("-")));
    assert_eq!(params.color, ColorChoice::Never);

    let result = check_command().try_get_matches_from(["check", "a.ttcn3", "--color", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn query_needs_patterns() {
    assert!(query_command().try_get_matches_from(["query", "a.ttcn3"]).is_err());

    let m = query_command()
        .try_get_matches_from(["query", "-q", "(name) @n", "a.ttcn3", "--json"])
        .unwrap();
    let params = QueryParams::from_matches(&m);
    assert_eq!(params.query_text.as_deref(), Some("(name) @n"));
    assert_eq!(params.query_file, None);
    assert!(params.json);

    let m = query_command()
        .try_get_matches_from(["query", "--query-file", "q.scm", "a.ttcn3"])
        .unwrap();
    let params = QueryParams::from_matches(&m);
    assert_eq!(params.query_file, Some(PathBuf::from("q.scm")));
}

#[test]
fn edit_needs_a_span() {
    assert!(edit_command().try_get_matches_from(["edit", "a.ttcn3"]).is_err());

    let m = edit_command()
        .try_get_matches_from(["edit", "a.ttcn3", "--at", "3:5", "--insert", "xy", "--tree"])
        .unwrap();
    let params = EditParams::from_matches(&m);
    assert_eq!(params.at, "3:5");
    assert_eq!(params.insert, "xy");
    assert!(params.show_tree);
    assert!(!params.json);

    let m = edit_command()
        .try_get_matches_from(["edit", "a.ttcn3", "--at", "3:5"])
        .unwrap();
    assert_eq!(EditParams::from_matches(&m).insert, "");
}

#[test]
fn generate_takes_a_grammar_or_a_bundled_language() {
    let m = generate_command()
        .try_get_matches_from(["generate", "grammar.json", "-o", "out.tbl", "--strict"])
        .unwrap();
    let params = GenerateParams::from_matches(&m);
    assert_eq!(params.grammar_path, Some(PathBuf::from("grammar.json")));
    assert_eq!(params.output, PathBuf::from("out.tbl"));
    assert!(params.strict);

    let m = generate_command()
        .try_get_matches_from(["generate", "-l", "ttcn3", "-o", "out.tbl", "--max-alternatives", "64"])
        .unwrap();
    let params = GenerateParams::from_matches(&m);
    assert_eq!(params.lang.as_deref(), Some("ttcn3"));
    assert_eq!(params.max_alternatives, Some(64));

    assert!(generate_command().try_get_matches_from(["generate", "-o", "out.tbl"]).is_err());
    assert!(generate_command().try_get_matches_from(["generate", "grammar.json"]).is_err());
    assert!(
        generate_command()
            .try_get_matches_from(["generate", "grammar.json", "-l", "ttcn3", "-o", "x"])
            .is_err()
    );
}

#[test]
fn dump_takes_lang_or_table() {
    let m = dump_command().try_get_matches_from(["dump", "-t", "x.tbl"]).unwrap();
    let params = DumpParams::from_matches(&m);
    assert_eq!(params.language.table, Some(PathBuf::from("x.tbl")));
}

#[test]
fn verbosity_is_global() {
    let m = build_cli()
        .try_get_matches_from(["thicket", "tree", "a.ttcn3", "-vv"])
        .unwrap();
    assert_eq!(m.get_count("verbose"), 2);
    assert_eq!(crate::logging::default_directive(m.get_count("verbose")), "thicket=trace");
    assert_eq!(crate::logging::default_directive(0), "thicket=warn");
}
