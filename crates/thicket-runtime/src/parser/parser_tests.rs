use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indoc::indoc;

use crate::test_utils::{
    arithmetic_language, heredoc_grammar, load, module_language, parse, reconstruct, sexp,
};
use crate::{
    ChunkedSource, FuelLimits, InputEdit, LanguageError, ParseError, Parser, Range, Tree,
};

fn reparse(tree: &Tree, text: &str, edit: InputEdit, new_text: &str) -> (Tree, Vec<Range>) {
    let edited = tree.edit(&edit).unwrap();
    let mut parser = Parser::new(tree.language()).unwrap();
    let (new_tree, ranges) = parser.reparse(&edited, new_text).unwrap();
    assert_eq!(reconstruct(&new_tree, new_text), new_text, "after editing {text:?}");
    (new_tree, ranges)
}

#[test]
fn module_definition() {
    let language = module_language();
    let tree = parse(&language, "module M { }");
    let root = tree.root_node();
    assert_eq!(root.kind(), "module_definition");
    assert!(!root.has_error());

    let name = root.child_by_field_name("name").unwrap();
    assert_eq!(name.kind(), "identifier");
    assert_eq!(name.byte_range(), 7..8);
    let body = root.child_by_field_name("body").unwrap();
    assert_eq!(body.kind(), "block");
    assert_eq!(body.byte_range(), 9..12);
}

#[test]
fn inserted_word_changes_only_the_edited_region() {
    let language = module_language();
    let text = "module M { }";
    let tree = parse(&language, text);
    let (new_tree, ranges) = reparse(
        &tree,
        text,
        InputEdit::insert(text.as_bytes(), 9, b"x "),
        "module M x { }",
    );

    // the block keeps its kind and its shifted range, so only the inserted
    // text is reported
    let spans: Vec<_> = ranges.iter().map(Range::bytes).collect();
    assert_eq!(spans, vec![9..11]);
    insta::assert_snapshot!(ranges[0], @"9..11 (0:9 - 0:11)");

    let root = new_tree.root_node();
    assert!(root.has_error());
    assert_eq!(root.child_by_field_name("name").unwrap().byte_range(), 7..8);
    assert_eq!(root.child_by_field_name("body").unwrap().byte_range(), 11..14);
    let error = root.descendant_for_byte_range(9, 10).unwrap();
    assert!(error.is_error() || error.parent().is_some_and(|p| p.is_error()));
}

#[test]
fn reparse_matches_a_fresh_parse() {
    let language = module_language();
    let text = "module M { a b c }";
    let tree = parse(&language, text);

    let cases: [(std::ops::Range<usize>, &str); 5] = [
        (13..14, "bb"),
        (9..10, ""),
        (17..18, ""),
        (0..6, "mod"),
        (11..11, "// note\n"),
    ];
    for (range, replacement) in cases {
        let mut new_text = text.to_owned();
        new_text.replace_range(range.clone(), replacement);
        let edit = InputEdit::replace(text.as_bytes(), range, replacement.as_bytes());
        let (incremental, _) = reparse(&tree, text, edit, &new_text);
        assert_eq!(
            incremental.root_node().to_sexp(),
            sexp(&language, &new_text),
            "{new_text:?}"
        );
    }
}

#[test]
fn unchanged_text_reparses_to_no_changes() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let (new_tree, ranges) = reparse(&tree, text, InputEdit::insert(text.as_bytes(), 4, b""), text);
    assert!(ranges.is_empty());
    assert_eq!(new_tree.root_node().to_sexp(), tree.root_node().to_sexp());
}

#[test]
fn renamed_identifier_is_the_only_change() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let (_, ranges) = reparse(
        &tree,
        text,
        InputEdit::replace(text.as_bytes(), 13..14, b"c"),
        "module M { a c }",
    );
    for range in &ranges {
        assert!(range.start_byte >= 13 && range.end_byte <= 14, "{range}");
    }
}

#[test]
fn missing_closing_brace_is_inserted() {
    let language = module_language();
    let tree = parse(&language, "module M {");
    insta::assert_snapshot!(tree.root_node().to_sexp(), @r#"(module_definition name: (identifier) body: (block (MISSING "}")))"#);
    let body = tree.root_node().child_by_field_name("body").unwrap();
    let missing = body.child(1).unwrap();
    assert!(missing.is_missing());
    assert_eq!(missing.byte_range(), 10..10);
}

#[test]
fn missing_identifier_is_inserted() {
    let language = module_language();
    let tree = parse(&language, "module { }");
    insta::assert_snapshot!(tree.root_node().to_sexp(), @"(module_definition name: (MISSING identifier) body: (block))");
    assert!(tree.root_node().has_error());
}

#[test]
fn unexpected_word_is_skipped() {
    let language = module_language();
    let text = "module M x { }";
    let tree = parse(&language, text);
    let root = tree.root_node();
    assert!(root.has_error());
    let error = root
        .children()
        .find(|n| n.is_error())
        .expect("error node among the children");
    assert_eq!(error.utf8_text(text), "x");
    assert_eq!(root.child_by_field_name("body").unwrap().byte_range(), 11..14);
}

#[test]
fn garbage_terminates() {
    let language = module_language();
    let inputs = [
        "",
        "}",
        "}}}{{ module ??? %% é",
        "module module module",
        "{{{{{{{{{{{{{{{{{{{{",
        "module M { a b c } trailing words here }",
        "\u{0}\u{1}\u{2}",
    ];
    for text in inputs {
        let tree = parse(&language, text);
        assert_eq!(tree.len(), text.len(), "{text:?}");
        assert_eq!(reconstruct(&tree, text), text, "{text:?}");
        assert!(tree.root_node().has_error(), "{text:?}");
    }
}

#[test]
fn empty_input_still_has_a_root() {
    let language = module_language();
    let tree = parse(&language, "");
    assert!(tree.is_empty());
    assert!(tree.root_node().has_error());
    assert_eq!(tree.root_node().byte_range(), 0..0);
}

#[test]
fn precedence_and_associativity() {
    let language = arithmetic_language(true);
    insta::assert_snapshot!(
        sexp(&language, "1 * 2 + 3"),
        @"(program (expression left: (expression left: (expression (number)) right: (expression (number))) right: (expression (number))))"
    );
    insta::assert_snapshot!(
        sexp(&language, "1 + 2 + 3"),
        @"(program (expression left: (expression left: (expression (number)) right: (expression (number))) right: (expression (number))))"
    );
    insta::assert_snapshot!(
        sexp(&language, "(1 + 2) * 3"),
        @"(program (expression left: (expression (expression left: (expression (number)) right: (expression (number)))) right: (expression (number))))"
    );
}

#[test]
fn ambiguous_grammar_still_yields_one_tree() {
    let language = arithmetic_language(false);
    for text in ["1 + 2 * 3", "1 + 2 + 3 + 4", "(1 * 2) + 3 * 4"] {
        let tree = parse(&language, text);
        let root = tree.root_node();
        assert!(!root.has_error(), "{text:?}: {}", root.to_sexp());
        assert_eq!(root.named_child_count(), 1);
        assert_eq!(root.named_child(0).unwrap().byte_range(), 0..text.len());
    }
}

#[test]
fn ambiguity_resolves_the_same_way_every_time() {
    let language = arithmetic_language(false);
    let text = "1 + 2 * 3";
    let first = sexp(&language, text);
    // shifting is listed before reducing, and the earliest action wins ties
    insta::assert_snapshot!(
        first,
        @"(program (expression left: (expression (number)) right: (expression left: (expression (number)) right: (expression (number)))))"
    );

    let mut parser = Parser::new(&language).unwrap();
    for _ in 0..5 {
        let tree = parser.parse(text, None).unwrap();
        assert_eq!(tree.root_node().to_sexp(), first);
    }
    assert_eq!(sexp(&arithmetic_language(false), text), first);
}

#[test]
fn ambiguity_with_one_version() {
    let language = arithmetic_language(false);
    let mut parser = Parser::new(&language)
        .unwrap()
        .with_limits(FuelLimits::new().max_versions(1));
    let text = "1 + 2 * 3 + 4";
    let tree = parser.parse(text, None).unwrap();
    assert_eq!(tree.len(), text.len());
    assert_eq!(reconstruct(&tree, text), text);
}

#[test]
fn arithmetic_recovery() {
    let language = arithmetic_language(true);
    for text in ["1 +", "+ 1", "1 2", "((1)", "1 + * 2", ")("] {
        let tree = parse(&language, text);
        assert!(tree.root_node().has_error(), "{text:?}");
        assert_eq!(reconstruct(&tree, text), text);
    }
}

#[test]
fn deep_nesting() {
    let language = arithmetic_language(true);
    let text = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    let tree = parse(&language, &text);
    assert!(!tree.root_node().has_error());

    let long = vec!["1"; 2_000].join(" + ");
    let tree = parse(&language, &long);
    assert!(!tree.root_node().has_error());
    assert_eq!(tree.len(), long.len());
}

#[test]
fn deep_nesting_survives_editing_and_printing() {
    let language = arithmetic_language(true);
    let depth = 5_000;
    let text = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&language, &text);
    assert!(!tree.root_node().has_error());

    let edit = InputEdit::replace(text.as_bytes(), depth..depth + 1, b"2");
    let edited = tree.edit(&edit).unwrap();
    assert_eq!(edited.root_node().to_sexp(), tree.root_node().to_sexp());

    let new_text = format!("{}2{}", "(".repeat(depth), ")".repeat(depth));
    let (new_tree, ranges) = reparse(&tree, &text, edit, &new_text);
    assert_eq!(new_tree.root_node().to_sexp(), sexp(&language, &new_text));
    let spans: Vec<_> = ranges.iter().map(Range::bytes).collect();
    assert_eq!(spans, vec![depth..depth + 1]);
}

#[test]
fn long_repetition_stays_shallow() {
    let language = module_language();
    let count = 20_000;
    let text = format!("module M {{ {} }}", vec!["ab"; count].join(" "));
    let tree = parse(&language, &text);
    let body = tree.root_node().child_by_field_name("body").unwrap();
    assert!(!body.has_error());
    assert_eq!(body.named_child_count(), count);

    let mut deepest = 0;
    let mut stack = vec![(tree.root(), 1)];
    while let Some((subtree, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(subtree.children().iter().map(|c| (&c.tree, depth + 1)));
    }
    assert!(deepest < 8, "repeat helpers nest {deepest} levels deep");

    let at = text.len() - 2;
    let new_text = format!("{} cd }}", &text[..at]);
    let (new_tree, _) = reparse(&tree, &text, InputEdit::insert(text.as_bytes(), at, b" cd"), &new_text);
    let body = new_tree.root_node().child_by_field_name("body").unwrap();
    assert_eq!(body.named_child_count(), count + 1);
    assert_eq!(body.named_child(count).unwrap().utf8_text(new_text.as_str()), "cd");
}

#[test]
fn chunked_source_parses_like_a_string() {
    let language = module_language();
    let text = indoc! {"
        module Main {
          // comment
          alpha beta
        }
    "};
    let chunked: ChunkedSource = text
        .as_bytes()
        .chunks(3)
        .map(|c| c.to_vec())
        .collect();
    let mut parser = Parser::new(&language).unwrap();
    let tree = parser.parse(&chunked, None).unwrap();
    assert_eq!(tree.root_node().to_sexp(), sexp(&language, text));
}

#[test]
fn cancellation() {
    let language = module_language();
    let flag = Arc::new(AtomicBool::new(true));
    let mut parser = Parser::new(&language).unwrap();
    parser.set_cancellation_flag(Some(flag.clone()));
    assert_eq!(parser.parse("module M {}", None).unwrap_err(), ParseError::Cancelled);

    parser.set_cancellation_flag(None);
    assert!(parser.parse("module M {}", None).is_ok());
}

#[test]
fn language_without_its_scanner_is_rejected() {
    let language = load(&heredoc_grammar());
    let err = Parser::new(&language).unwrap_err();
    assert!(matches!(
        err,
        LanguageError::MissingScanner { externals: 1, .. }
    ));
    insta::assert_snapshot!(err, @"language `heredoc` declares 1 external tokens but has no scanner");
}

#[test]
fn tree_from_another_language_is_ignored() {
    let module = module_language();
    let arithmetic = arithmetic_language(true);
    let old = parse(&arithmetic, "1 + 2");
    let mut parser = Parser::new(&module).unwrap();
    let tree = parser.parse("module M {}", Some(&old)).unwrap();
    assert_eq!(tree.root_node().to_sexp(), sexp(&module, "module M {}"));
}
