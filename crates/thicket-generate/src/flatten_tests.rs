use indoc::indoc;
use thicket_core::dsl::*;
use thicket_core::{Grammar, choice, seq};

use thicket_table::{SymbolId, SymbolKind};

use crate::flatten::{FlatGrammar, flatten};
use crate::prepare::prepare;
use crate::{GenerateError, GenerateOptions};
use crate::test_utils::module_grammar;

fn flat(grammar: &Grammar) -> FlatGrammar {
    flatten(&prepare(grammar).unwrap(), &GenerateOptions::default()).unwrap()
}

fn render(grammar: &FlatGrammar) -> String {
    let mut out = String::new();
    for production in &grammar.productions {
        out.push_str(&grammar.symbols[production.lhs as usize].name);
        out.push_str(" ->");
        for step in &production.steps {
            out.push(' ');
            if let Some(field) = &step.field {
                out.push_str(field);
                out.push(':');
            }
            out.push_str(&grammar.symbols[step.symbol as usize].name);
            if let Some((alias, _)) = &step.alias {
                out.push_str(" as ");
                out.push_str(alias);
            }
            if step.precedence != 0 {
                out.push_str(&format!("@{}", step.precedence));
            }
        }
        if production.dynamic_precedence != 0 {
            out.push_str(&format!("  [dynamic {}]", production.dynamic_precedence));
        }
        out.push('\n');
    }
    out
}

#[test]
fn module_grammar_productions() {
    let grammar = flat(&module_grammar());
    insta::assert_snapshot!(render(&grammar), @r"
    module_definition -> module name:identifier body:block
    block_repeat1 -> identifier
    block_repeat1 -> block_repeat1 identifier
    block -> { block_repeat1 }
    block -> { }
    ");

    assert_eq!(grammar.symbols[grammar.start_symbol as usize].name, "module_definition");
    let helper = grammar
        .symbols
        .iter()
        .position(|s| s.name == "block_repeat1")
        .unwrap() as SymbolId;
    assert_eq!(grammar.symbols[helper as usize].kind, SymbolKind::Auxiliary);
    assert!(!grammar.symbols[helper as usize].visible);
    assert_eq!(grammar.symbols[grammar.owner(helper) as usize].name, "block");
    assert!(grammar.is_terminal(grammar.token_symbols[0]));
}

#[test]
fn optional_and_choice_expand() {
    let grammar = GrammarBuilder::new("g")
        .rule(
            "call",
            seq![
                sym("name"),
                optional(seq!["(", optional(sym("name")), ")"]),
            ],
        )
        .rule("name", pattern("[a-z]+"))
        .build();
    insta::assert_snapshot!(render(&flat(&grammar)), @r"
    call -> name ( name )
    call -> name ( )
    call -> name
    ");
}

#[test]
fn aliases_and_precedence_attach_to_steps() {
    let grammar = GrammarBuilder::new("g")
        .rule(
            "root",
            choice![
                prec_dynamic(3, alias(sym("word"), "label")),
                prec_left(2, seq![sym("word"), "=", sym("word")]),
            ],
        )
        .rule("word", pattern("[a-z]+"))
        .build();
    assert_eq!(
        render(&flat(&grammar)),
        indoc! {"
            root -> word as label  [dynamic 3]
            root -> word@2 =@2 word@2
        "}
    );
}

#[test]
fn inline_rules_are_substituted() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", seq![sym("_value"), ";"])
        .rule("_value", choice!["a", "b"])
        .inline("_value")
        .build();
    let grammar = flat(&grammar);
    insta::assert_snapshot!(render(&grammar), @r"
    root -> a ;
    root -> b ;
    ");
    assert!(grammar.symbols.iter().all(|s| s.name != "_value"));
}

#[test]
fn recursive_inline_is_rejected() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", seq!["x", sym("_loop")])
        .rule("_loop", seq!["y", sym("_loop")])
        .inline("_loop")
        .build();
    let err = flatten(&prepare(&grammar).unwrap(), &GenerateOptions::default()).unwrap_err();
    assert_eq!(err, GenerateError::RecursiveInline("_loop".into()));
}

#[test]
fn alternative_limit() {
    let grammar = GrammarBuilder::new("g")
        .rule(
            "root",
            seq![
                optional("a"),
                optional("b"),
                optional("c"),
                optional("d"),
                "e",
            ],
        )
        .build();
    let options = GenerateOptions::default().max_alternatives(8);
    let err = flatten(&prepare(&grammar).unwrap(), &options).unwrap_err();
    assert_eq!(err, GenerateError::TooManyAlternatives("root".into(), 8));

    let grammar = flat(&grammar);
    assert_eq!(grammar.productions.len(), 16);
}

#[test]
fn declared_conflicts_map_to_symbols() {
    let grammar = GrammarBuilder::new("g")
        .rule("root", choice![sym("a"), sym("b")])
        .rule("a", seq![sym("id"), "!"])
        .rule("b", seq![sym("id"), "?"])
        .rule("id", pattern("[a-z]+"))
        .conflict(["a", "b"])
        .build();
    let grammar = flat(&grammar);
    let names: Vec<&str> = grammar.conflicts[0]
        .iter()
        .map(|&s| grammar.symbols[s as usize].name.as_str())
        .collect();
    assert_eq!(names, ["a", "b"]);
}
