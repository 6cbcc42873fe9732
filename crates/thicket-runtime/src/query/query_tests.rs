use indoc::indoc;

use crate::query::QueryErrorKind;
use crate::test_utils::{arithmetic_language, module_language, parse};
use crate::{Language, Query, QueryCursor, Tree};

/// `pattern: capture=text ...` per match.
fn run(language: &Language, tree: &Tree, text: &str, query: &str) -> String {
    let query = Query::new(language, query).unwrap();
    run_with(&query, &QueryCursor::new(), tree, text)
}

fn run_with(query: &Query, cursor: &QueryCursor, tree: &Tree, text: &str) -> String {
    let mut out = Vec::new();
    for m in cursor.matches(query, tree.root_node(), text) {
        let captures: Vec<String> = m
            .captures
            .iter()
            .map(|c| {
                format!(
                    "{}={}",
                    query.capture_names()[c.index as usize],
                    c.node.utf8_text(text)
                )
            })
            .collect();
        out.push(format!("{}: {}", m.pattern_index, captures.join(" ")));
    }
    out.join("\n")
}

fn error(language: &Language, query: &str) -> String {
    Query::new(language, query).unwrap_err().to_string()
}

#[test]
fn captures_in_pre_order() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(identifier) @id"), @r"
    0: id=M
    0: id=a
    0: id=b
    ");
}

#[test]
fn patterns_are_tried_in_order_at_each_node() {
    let language = module_language();
    let text = "module M { a }";
    let tree = parse(&language, text);
    let query = indoc! {r#"
        (block) @block
        ; keywords and names
        "module" @keyword
        (identifier) @id
    "#};
    insta::assert_snapshot!(run(&language, &tree, text, query), @r"
    1: keyword=module
    2: id=M
    0: block={ a }
    2: id=a
    ");
}

#[test]
fn fields() {
    let language = module_language();
    let text = "module M { a }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(
        run(&language, &tree, text, "(module_definition name: (identifier) @name body: (block) @body)"),
        @"0: name=M body={ a }"
    );
    assert_eq!(
        run(&language, &tree, text, "(module_definition body: (identifier))"),
        ""
    );
}

#[test]
fn one_match_per_node_and_pattern() {
    let language = module_language();
    let text = "module M { a b c }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(block (identifier) @first)"), @"0: first=a");
    insta::assert_snapshot!(run(&language, &tree, text, "(block (identifier)* @all)"), @"0: all=a all=b all=c");
    insta::assert_snapshot!(run(&language, &tree, text, "(block (identifier) @x (identifier)+ @rest)"), @"0: x=a rest=b rest=c");
    assert_eq!(run(&language, &tree, text, "(block (identifier) (identifier) (identifier) (identifier))"), "");
    insta::assert_snapshot!(run(&language, &tree, text, "(block \"{\" (identifier)? @opt)"), @"0: opt=a");
}

#[test]
fn anchors() {
    let language = module_language();
    let text = "module M { a b c }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(block . (identifier) @first)"), @"0: first=a");
    insta::assert_snapshot!(run(&language, &tree, text, "(block (identifier) @last .)"), @"0: last=c");
    insta::assert_snapshot!(
        run(&language, &tree, text, "(block (identifier) @x . (identifier) @y (#eq? @y \"c\"))"),
        @"0: x=b y=c"
    );
}

#[test]
fn wildcards_and_alternations() {
    let language = module_language();
    let text = "module M { a }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(block _ @any)"), @"0: any={");
    insta::assert_snapshot!(run(&language, &tree, text, "(block (_) @named)"), @"0: named=a");
    insta::assert_snapshot!(run(&language, &tree, text, "[\"{\" \"}\"] @brace"), @r"
    0: brace={
    0: brace=}
    ");
    insta::assert_snapshot!(
        run(&language, &tree, text, "(module_definition [(block) @b (identifier) @i])"),
        @"0: i=M"
    );
}

#[test]
fn predicates() {
    let language = module_language();
    let text = "module M { a b ab }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "((identifier) @id (#eq? @id \"b\"))"), @"0: id=b");
    insta::assert_snapshot!(run(&language, &tree, text, "((identifier) @id (#not-eq? @id \"b\"))"), @r"
    0: id=M
    0: id=a
    0: id=ab
    ");
    insta::assert_snapshot!(run(&language, &tree, text, "((identifier) @id (#match? @id \"^[a-z]+$\"))"), @r"
    0: id=a
    0: id=b
    0: id=ab
    ");
    insta::assert_snapshot!(run(&language, &tree, text, "((identifier) @id (#not-match? @id \"a\"))"), @r"
    0: id=M
    0: id=b
    ");
}

#[test]
fn predicates_choose_among_assignments() {
    let language = module_language();
    let text = "module M { a b a }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(
        run(&language, &tree, text, "(block (identifier) @id (#eq? @id \"b\"))"),
        @"0: id=b"
    );
    insta::assert_snapshot!(
        run(&language, &tree, text, "(block (identifier) @x (identifier) @y (#eq? @x @y))"),
        @"0: x=a y=a"
    );
}

#[test]
fn negated_fields() {
    let language = arithmetic_language(true);
    let text = "1 + 2";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(expression !left) @leaf"), @r"
    0: leaf=1
    0: leaf=2
    ");
    insta::assert_snapshot!(
        run(&language, &tree, text, "(expression left: (_) @l \"+\" right: (_) @r)"),
        @"0: l=1 r=2"
    );
}

#[test]
fn error_and_missing_nodes() {
    let language = module_language();
    let text = "module M x { }";
    let tree = parse(&language, text);
    insta::assert_snapshot!(run(&language, &tree, text, "(ERROR) @error"), @"0: error=x");
    assert_eq!(run(&language, &tree, text, "(MISSING) @missing"), "");

    let text = "module M {";
    let tree = parse(&language, text);
    assert_eq!(run(&language, &tree, text, "(MISSING) @missing"), "0: missing=");
    assert_eq!(run(&language, &tree, text, "(MISSING \"}\") @m"), "0: m=");
    assert_eq!(run(&language, &tree, text, "(MISSING identifier) @m"), "");
}

#[test]
fn byte_range_restricts_the_walk() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let query = Query::new(&language, "(identifier) @id").unwrap();
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(11..12);
    insta::assert_snapshot!(run_with(&query, &cursor, &tree, text), @"0: id=a");
}

#[test]
fn matches_are_lazy() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let query = Query::new(&language, "(identifier) @id").unwrap();
    let cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), text);
    let first = matches.next().unwrap();
    assert_eq!(first.captures[0].node.utf8_text(text), "M");
    let rest: Vec<_> = matches.collect();
    assert_eq!(rest.len(), 2);

    // a fresh iterator starts over
    assert_eq!(cursor.matches(&query, tree.root_node(), text).count(), 3);
}

#[test]
fn query_metadata() {
    let language = module_language();
    let source = "(block) @b\n  ((identifier) @i @b)";
    let query = Query::new(&language, source).unwrap();
    assert_eq!(query.pattern_count(), 2);
    assert_eq!(query.capture_names(), ["b", "i"]);
    assert_eq!(query.capture_index_for_name("i"), Some(1));
    assert_eq!(query.capture_index_for_name("z"), None);
    assert_eq!(query.start_byte_for_pattern(1), Some(13));
    assert_eq!(query.start_byte_for_pattern(2), None);

    let text = "module M { }";
    let tree = parse(&language, text);
    let matched = QueryCursor::new()
        .matches(&query, tree.root_node(), text)
        .find(|m| m.pattern_index == 1)
        .unwrap();
    let nodes: Vec<_> = matched.nodes_for_capture_index(0).collect();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].utf8_text(text), "M");
}

#[test]
fn compile_errors() {
    let language = module_language();
    insta::assert_snapshot!(error(&language, "(identifer) @x"), @"unknown node kind `identifer` at byte 1");
    insta::assert_snapshot!(error(&language, "(block nope: (identifier))"), @"unknown field `nope` at byte 7");
    insta::assert_snapshot!(error(&language, "\"while\""), @"unknown node kind `while` at byte 0");
    insta::assert_snapshot!(
        error(&language, "((identifier) @id (#eq? @other \"x\"))"),
        @"unknown capture `@other` at byte 24"
    );
    insta::assert_snapshot!(
        error(&language, "((identifier) @id (#contains? @id \"x\"))"),
        @"unknown predicate `#contains?` at byte 19"
    );
    insta::assert_snapshot!(
        error(&language, "((identifier) @id (#eq? @id))"),
        @"predicate `#eq?` expects a capture and a capture or string at byte 19"
    );
    insta::assert_snapshot!(error(&language, "(block"), @"syntax error: expected `)`, found end of query at byte 6");
    insta::assert_snapshot!(error(&language, "(identifier)*"), @"syntax error: quantifiers need an enclosing node at byte 12");

    let err = Query::new(&language, "((identifier) @id (#match? @id \"(\"))").unwrap_err();
    assert_eq!(err.offset, 19);
    assert!(matches!(err.kind, QueryErrorKind::Regex { ref pattern, .. } if pattern == "("));
}
