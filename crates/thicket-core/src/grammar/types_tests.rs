use super::dsl::*;
use super::*;

#[test]
fn without_precedence_strips_nested_wrappers() {
    let rule = prec_left(1, prec_dynamic(2, sym("x")));
    assert_eq!(rule.without_precedence(), &Rule::Symbol("x".into()));
}

#[test]
fn for_each_symbol_visits_in_order() {
    let rule = crate::seq![
        field("a", sym("first")),
        repeat(crate::choice![sym("second"), "lit"]),
        alias(sym("third"), "renamed"),
    ];
    let mut seen = Vec::new();
    rule.for_each_symbol(&mut |name| seen.push(name));
    assert_eq!(seen, ["first", "second", "third"]);
}

#[test]
fn rule_lookup() {
    let grammar = GrammarBuilder::new("g").rule("root", blank()).build();
    assert!(grammar.has_rule("root"));
    assert!(!grammar.has_rule("missing"));
    assert_eq!(grammar.start_rule(), Some("root"));
}
