use thicket_core::dsl::*;
use thicket_core::{Grammar, choice, seq};

/// `module M { a b }` style toy language.
pub fn module_grammar() -> Grammar {
    GrammarBuilder::new("toy")
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
        .extra(pattern(r"\s"))
        .word("identifier")
        .build()
}

/// Binary arithmetic, optionally with precedence annotations.
pub fn arithmetic(with_precedence: bool) -> Grammar {
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
    GrammarBuilder::new("arith")
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
        .build()
}
