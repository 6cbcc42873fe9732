use thicket_core::dsl::*;
use thicket_core::{Grammar, choice, seq};
use thicket_runtime::{Language, Parser, Tree};

/// `module M { a b }` with `//` line comments.
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
        .rule("comment", token(seq!["//", pattern("[^\n]*")]))
        .extra(pattern(r"\s"))
        .extra(sym("comment"))
        .word("identifier")
        .build()
}

/// `1 + 2 * 3` without precedence, so the table has undeclared conflicts.
pub fn ambiguous_grammar() -> Grammar {
    GrammarBuilder::new("ambiguous")
        .rule("program", sym("expression"))
        .rule(
            "expression",
            choice![
                seq![sym("expression"), "+", sym("expression")],
                seq![sym("expression"), "*", sym("expression")],
                sym("number"),
            ],
        )
        .rule("number", pattern("[0-9]+"))
        .extra(pattern(r"\s"))
        .build()
}

/// Balanced parentheses, nested as deep as the input goes.
pub fn nested_grammar() -> Grammar {
    GrammarBuilder::new("nested")
        .rule("group", seq!["(", optional(sym("group")), ")"])
        .extra(pattern(r"\s"))
        .build()
}

pub fn table_bytes(grammar: &Grammar) -> Vec<u8> {
    let generated = thicket_generate::generate(grammar).expect("grammar should compile");
    generated.table.to_bytes().expect("table should serialize")
}

pub fn module_language() -> Language {
    Language::load(&table_bytes(&module_grammar())).expect("table should load")
}

pub fn parse(language: &Language, text: &str) -> Tree {
    Parser::new(language)
        .expect("language should be usable")
        .parse(text, None)
        .expect("parse should not be cancelled")
}
