use thicket_core::dsl::*;
use thicket_core::{Grammar, choice, seq};

use crate::{Language, Parser, Tree};

/// Compile a grammar, round-tripping the table through its binary form.
pub fn load(grammar: &Grammar) -> Language {
    let generated = thicket_generate::generate(grammar).expect("grammar should compile");
    let bytes = generated.table.to_bytes().expect("table should serialize");
    Language::load(&bytes).expect("table should load")
}

/// `module M { a b }` with `//` line comments.
pub fn module_language() -> Language {
    load(
        &GrammarBuilder::new("toy")
            .rule(
                "module_definition",
                seq![
                    "module",
                    field("name", sym("identifier")),
                    field("body", sym("block")),
                ],
            )
            .rule("block", seq!["{", repeat(sym("identifier")), "}"])
            .rule("identifier", pattern("[A-Za-z_][A-Za-z0-9_]*"))
            .rule("comment", token(seq!["//", pattern("[^\n]*")]))
            .extra(pattern(r"\s"))
            .extra(sym("comment"))
            .word("identifier")
            .build(),
    )
}

/// Binary arithmetic with `+`, `*` and parentheses.
pub fn arithmetic_language(with_precedence: bool) -> Language {
    let binary = |op: &str, level: i32| {
        let body = seq![
            field("left", sym("expression")),
            field("operator", op),
            field("right", sym("expression")),
        ];
        if with_precedence {
            prec_left(level, body)
        } else {
            body
        }
    };
    load(
        &GrammarBuilder::new("arith")
            .rule("program", sym("expression"))
            .rule(
                "expression",
                choice![
                    binary("+", 1),
                    binary("*", 2),
                    sym("number"),
                    seq!["(", sym("expression"), ")"],
                ],
            )
            .rule("number", pattern("[0-9]+"))
            .extra(pattern(r"\s"))
            .build(),
    )
}

/// `let` statements whose values are raw `<<...>>` blocks recognized by an
/// external scanner.
pub fn heredoc_grammar() -> Grammar {
    GrammarBuilder::new("heredoc")
        .rule("program", repeat(sym("statement")))
        .rule(
            "statement",
            seq!["let", field("name", sym("identifier")), "=", sym("_value"), ";"],
        )
        .rule("_value", choice![sym("raw"), sym("identifier")])
        .rule("identifier", pattern("[a-z]+"))
        .external(sym("raw"))
        .extra(pattern(r"\s"))
        .word("identifier")
        .build()
}

pub fn parse(language: &Language, text: &str) -> Tree {
    let mut parser = Parser::new(language).expect("language should check");
    parser.parse(text, None).expect("parse should not be cancelled")
}

pub fn sexp(language: &Language, text: &str) -> String {
    parse(language, text).root_node().to_sexp()
}

/// Padding and text of every leaf, concatenated.
pub fn reconstruct(tree: &Tree, text: &str) -> String {
    let mut out = String::new();
    let mut offset = 0;
    for (start, leaf) in tree.root().leaves() {
        let end = start + leaf.total().bytes as usize;
        assert_eq!(start, offset, "leaves must tile the text");
        out.push_str(&text[start..end]);
        offset = end;
    }
    out
}
