use std::io::Write as _;
use std::path::PathBuf;

use indoc::indoc;
use thicket_core::Colors;
use thicket_generate::GenerateOptions;
use thicket_runtime::{Language, Query};

use super::CliError;
use super::diagnostics::{self, Diagnostic, Printer};
use super::edit::{self, parse_span, render_ranges};
use super::generate::{self, GenerateArgs};
use super::lang_resolver::LanguageChoice;
use super::query;
use super::source::SourceInput;
use super::test_utils::{
    ambiguous_grammar, module_grammar, module_language, nested_grammar, parse, table_bytes,
};
use super::tree::TreeFormat;

fn render_tree(text: &str, raw: bool, spans: bool) -> String {
    let tree = parse(&module_language(), text);
    TreeFormat {
        raw,
        spans,
        colors: Colors::OFF,
    }
    .render(&tree, text.as_bytes())
}

#[test]
fn tree_shows_named_nodes_with_fields() {
    insta::assert_snapshot!(render_tree("module M { a }", false, false), @r#"
    (module_definition
      name: (identifier "M")
      body: (block
        (identifier "a")))
    "#);
}

#[test]
fn raw_tree_includes_keywords_and_punctuation() {
    insta::assert_snapshot!(render_tree("module M { a }", true, false), @r#"
    (module_definition
      ("module")
      name: (identifier "M")
      body: (block
        ("{")
        (identifier "a")
        ("}")))
    "#);
}

#[test]
fn tree_spans() {
    insta::assert_snapshot!(render_tree("module M {\n  a\n}", false, true), @r#"
    (module_definition [0:0-2:1]
      name: (identifier "M" [0:7-0:8])
      body: (block [0:9-2:1]
        (identifier "a" [1:2-1:3])))
    "#);
}

#[test]
fn missing_nodes_are_always_shown() {
    insta::assert_snapshot!(render_tree("module M {", false, false), @r#"
    (module_definition
      name: (identifier "M")
      body: (block
        (MISSING "}")))
    "#);
}

#[test]
fn deeply_nested_trees_print_and_report_errors() {
    let language = Language::load(&table_bytes(&nested_grammar())).unwrap();
    let depth = 3_000;
    let text = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&language, &text);
    let rendered = TreeFormat::default().render(&tree, text.as_bytes());
    assert_eq!(rendered.lines().count(), depth);
    assert!(rendered.trim_end().ends_with(&")".repeat(depth)));
    assert!(diagnostics::syntax_errors(&tree, &text).is_empty());

    let text = &text[..text.len() - 1];
    let tree = parse(&language, text);
    assert!(!diagnostics::syntax_errors(&tree, text).is_empty());
}

#[test]
fn clean_source_has_no_syntax_errors() {
    let text = "module M { a b }";
    let tree = parse(&module_language(), text);
    assert!(diagnostics::syntax_errors(&tree, text).is_empty());
}

#[test]
fn skipped_and_missing_tokens_are_syntax_errors() {
    let language = module_language();
    let text = "module M x { }";
    let errors = diagnostics::syntax_errors(&parse(&language, text), text);
    assert_eq!(
        errors,
        [Diagnostic {
            range: 9..10,
            message: "unexpected `x`".to_owned(),
        }]
    );

    let text = "module M {";
    let errors = diagnostics::syntax_errors(&parse(&language, text), text);
    assert_eq!(
        errors,
        [Diagnostic {
            range: 10..10,
            message: "missing `}`".to_owned(),
        }]
    );
}

#[test]
fn syntax_errors_render_as_snippets() {
    let text = "module M x { }";
    let tree = parse(&module_language(), text);
    let errors = diagnostics::syntax_errors(&tree, text);
    let rendered = Printer::new(text).path("<inline>").render(&errors);
    insta::assert_snapshot!(rendered, @r"
    error: unexpected `x`
     --> <inline>:1:10
      |
    1 | module M x { }
      |          ^
    ");
}

#[test]
fn query_errors_point_into_the_query() {
    let language = module_language();
    let text = "(identifer) @x";
    let err = Query::new(&language, text).unwrap_err();
    let rendered = Printer::new(text).render(&[diagnostics::query_error(&err)]);
    insta::assert_snapshot!(rendered, @r"
    error: unknown node kind `identifer`
      |
    1 | (identifer) @x
      |  ^
    ");
}

#[test]
fn query_matches_are_listed_with_captures() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let query = Query::new(
        &language,
        indoc! {r#"
            (module_definition name: (identifier) @name)
            (block (identifier) @first)
        "#},
    )
    .unwrap();
    let matches = query::collect_matches(&query, &tree, text.as_bytes());
    insta::assert_snapshot!(query::render(&matches, Colors::OFF), @r#"
    pattern 0
      @name [0:7-0:8] "M"
    pattern 1
      @first [0:11-0:12] "a"
    "#);

    let json = serde_json::to_value(&matches).unwrap();
    assert_eq!(json[1]["captures"][0]["kind"], "identifier");
    assert_eq!(json[1]["captures"][0]["start_byte"], 11);
    assert_eq!(json[1]["captures"][0]["end"], serde_json::json!([0, 12]));
}

#[test]
fn edit_spans() {
    assert_eq!(parse_span("12").unwrap(), 12..12);
    assert_eq!(parse_span("3:7").unwrap(), 3..7);
    assert_eq!(parse_span(" 3 : 7 ").unwrap(), 3..7);
    insta::assert_snapshot!(parse_span("7:3").unwrap_err(), @"invalid edit span `7:3`: expected START or START:OLD_END");
    assert!(matches!(parse_span("x:1"), Err(CliError::InvalidSpan(_))));
    assert!(matches!(parse_span(""), Err(CliError::InvalidSpan(_))));
}

#[test]
fn edit_reparses_and_reports_changed_ranges() {
    let language = module_language();
    let old = "module M { }";
    let outcome = edit::apply(&language, old.as_bytes(), 11..11, b"a ").unwrap();

    assert_eq!(outcome.text, b"module M { a }");
    assert_eq!(
        outcome.tree.root_node().to_sexp(),
        parse(&language, "module M { a }").root_node().to_sexp()
    );
    assert!(!outcome.changed.is_empty());
    for range in &outcome.changed {
        assert!(range.start_byte >= 9, "{range}");
    }
}

#[test]
fn noop_edit_changes_nothing() {
    let language = module_language();
    let outcome = edit::apply(&language, b"module M { a }", 4..4, b"").unwrap();
    assert!(outcome.changed.is_empty());
    insta::assert_snapshot!(render_ranges(&outcome.changed), @"no changes");
}

#[test]
fn edit_outside_the_source_is_rejected() {
    let language = module_language();
    let err = edit::apply(&language, b"module M { }", 5..100, b"").err().unwrap();
    insta::assert_snapshot!(err, @"edit span 5..100 lies outside the 12-byte source");
}

#[test]
fn table_files_are_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&table_bytes(&module_grammar())).unwrap();

    let choice = LanguageChoice {
        lang: None,
        table: Some(file.path().to_owned()),
    };
    let language = choice.resolve(None).unwrap();
    assert_eq!(language.name(), "toy");
}

#[test]
fn corrupted_table_files_are_rejected() {
    let mut bytes = table_bytes(&module_grammar());
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();

    let choice = LanguageChoice {
        lang: None,
        table: Some(file.path().to_owned()),
    };
    assert!(matches!(choice.resolve(None), Err(CliError::Load(_))));
}

#[test]
fn generate_writes_a_loadable_table() {
    let dir = tempfile::tempdir().unwrap();
    let grammar_path = dir.path().join("grammar.json");
    std::fs::write(&grammar_path, module_grammar().to_json().unwrap()).unwrap();
    let output = dir.path().join("toy.tbl");

    generate::run(GenerateArgs {
        grammar_path: Some(grammar_path),
        lang: None,
        output: output.clone(),
        max_alternatives: None,
        strict: true,
    })
    .unwrap();

    let language = Language::load(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(language.name(), "toy");
    let tree = parse(&language, "module M { a }");
    assert!(!tree.root_node().has_error());
}

#[test]
fn generate_reports_missing_grammar_files() {
    let err = generate::run(GenerateArgs {
        grammar_path: Some(PathBuf::from("/nonexistent/grammar.json")),
        lang: None,
        output: PathBuf::from("/nonexistent/out.tbl"),
        max_alternatives: None,
        strict: false,
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
}

#[test]
fn strict_generation_rejects_undeclared_conflicts() {
    let grammar = ambiguous_grammar();
    let generated = generate::compile(&grammar, GenerateOptions::default(), false).unwrap();
    assert!(generated.report.undeclared_conflicts().count() > 0);

    let err = generate::compile(&grammar, GenerateOptions::default(), true).unwrap_err();
    assert!(matches!(
        err,
        CliError::UndeclaredConflicts { ref grammar, count } if grammar == "ambiguous" && count > 0
    ));
}

#[test]
fn generation_summary() {
    let grammar = module_grammar();
    let generated = generate::compile(&grammar, GenerateOptions::default(), true).unwrap();
    let summary = generate::summary(&grammar, &generated);
    assert!(summary.starts_with("generated `toy`: "), "{summary}");
    assert!(summary.ends_with(", 0 conflicts"), "{summary}");
}

#[test]
fn inline_and_file_sources() {
    let inline = SourceInput::inline("module M { }");
    assert_eq!(&*inline.load().unwrap(), b"module M { }");
    assert_eq!(inline.display_name(), "<inline>");
    assert_eq!(inline.file_path(), None);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"module F { }").unwrap();
    let from_file = SourceInput {
        path: Some(file.path().to_owned()),
        text: None,
    };
    assert_eq!(from_file.load().unwrap().to_str_lossy(), "module F { }");
    assert_eq!(from_file.file_path(), Some(file.path()));

    let stdin = SourceInput {
        path: Some(PathBuf::from("-")),
        text: None,
    };
    assert_eq!(stdin.display_name(), "<stdin>");
    assert_eq!(stdin.file_path(), None);

    assert!(matches!(
        SourceInput::default().load(),
        Err(CliError::SourceRequired)
    ));
}

#[test]
#[cfg(feature = "lang-ttcn3")]
fn bundled_languages_are_listed() {
    insta::assert_snapshot!(super::langs::render(), @r"
    Bundled languages (1):
      ttcn3      .ttcn3 .ttcn .ttcnpp
    ");
}

#[test]
#[cfg(feature = "lang-ttcn3")]
fn bundled_grammar_is_generated() {
    let grammar = LanguageChoice::bundled("ttcn3")
        .resolve_bundled(None)
        .map(|lang| (lang.grammar)())
        .unwrap();
    let generated = generate::compile(&grammar, GenerateOptions::default(), false).unwrap();
    assert!(generated.report.state_count > 0);
}
