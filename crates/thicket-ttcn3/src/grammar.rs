//! TTCN-3 core language grammar.
//!
//! Modules are definitions like any other and may nest, so groups, modules
//! and component bodies share one definition list. A source file is either a
//! list of definitions or a single expression, which is how module parameter
//! values are written.
//!
//! Semicolons between definitions and statements are optional. That makes a
//! few constructs genuinely ambiguous (`var integer x` is either a typed
//! declaration or an untyped one followed by the statement `x`); those are
//! declared as conflicts and settled at runtime, with typed declarations
//! preferred through dynamic precedence.

use thicket_core::dsl::*;
use thicket_core::{Grammar, Rule, choice, seq};

/// Operator binding strength, tightest first.
mod prec {
    pub const PRIMARY: i32 = 150;
    pub const UNARY: i32 = 145;
    pub const MULTIPLICATIVE: i32 = 140;
    pub const ADDITIVE: i32 = 130;
    pub const BITWISE_NOT: i32 = 120;
    pub const BITWISE_AND: i32 = 110;
    pub const BITWISE_XOR: i32 = 100;
    pub const BITWISE_OR: i32 = 90;
    pub const SHIFT: i32 = 80;
    pub const RELATIONAL: i32 = 70;
    pub const EQUALITY: i32 = 60;
    pub const LOGICAL_NOT: i32 = 50;
    pub const LOGICAL_AND: i32 = 40;
    pub const LOGICAL_XOR: i32 = 30;
    pub const LOGICAL_OR: i32 = 20;
}

const BINARY_OPERATORS: &[(i32, &[&str])] = &[
    (prec::MULTIPLICATIVE, &["*", "/", "mod", "rem"]),
    (prec::ADDITIVE, &["+", "-", "&"]),
    (prec::BITWISE_AND, &["and4b"]),
    (prec::BITWISE_XOR, &["xor4b"]),
    (prec::BITWISE_OR, &["or4b"]),
    (prec::SHIFT, &["<<", ">>", "<@", "@>"]),
    (prec::RELATIONAL, &["<", ">", "<=", ">="]),
    (prec::EQUALITY, &["==", "!="]),
    (prec::LOGICAL_AND, &["and"]),
    (prec::LOGICAL_XOR, &["xor"]),
    (prec::LOGICAL_OR, &["or"]),
];

/// Definition kinds an import or exception list may name.
const IMPORT_KINDS: &[&str] = &[
    "group",
    "type",
    "template",
    "const",
    "testcase",
    "altstep",
    "function",
    "signature",
    "modulepar",
];

/// The grammar behind [`language`](crate::language).
pub fn grammar() -> Grammar {
    let builder = GrammarBuilder::new(crate::NAME)
        .rule(
            "source_file",
            choice![
                repeat(seq![sym("_definition"), optional(";")]),
                sym("_expression"),
            ],
        )
        .extra(sym("comment"))
        .extra(pattern(r"\s+"))
        .word("_identifier")
        .conflict(["break_stmt"])
        .conflict(["continue_stmt"])
        .conflict(["return_stmt"])
        .conflict(["reference", "name"])
        .conflict(["var_decl"])
        .conflict(["const_decl"])
        .conflict(["module_parameter"]);

    let builder = definitions(builder);
    let builder = types(builder);
    let builder = statements(builder);
    let builder = expressions(builder);
    lexical(builder).build()
}

fn definitions(builder: GrammarBuilder) -> GrammarBuilder {
    builder
        .rule(
            "_definition",
            choices(&[
                "altstep",
                "component_type",
                "const_decl",
                "control",
                "enumerated_type",
                "external_function",
                "friend",
                "func",
                "group",
                "import_definition",
                "module",
                "module_parameter",
                "port_decl",
                "port_type",
                "record_of_type",
                "record_type",
                "set_of_type",
                "set_type",
                "signature",
                "subtype",
                "template",
                "testcase",
                "timer_decl",
                "union_type",
                "var_decl",
            ]),
        )
        .rule(
            "module",
            seq![
                "module",
                sym("_parameterized_name"),
                field("language_spec", optional(sym("language_spec"))),
                sym("_definition_body"),
                attributes(),
            ],
        )
        .rule(
            "group",
            seq![
                visibility(),
                "group",
                sym("_parameterized_name"),
                sym("_definition_body"),
                attributes(),
            ],
        )
        .rule(
            "_definition_body",
            seq!["{", repeat(seq![sym("_definition"), optional(";")]), "}"],
        )
        .rule(
            "func",
            seq![
                visibility(),
                "function",
                field("modifiers", optional(sym("modifiers"))),
                sym("_parameterized_name"),
                field("parameters", sym("parameters")),
                runs_on(),
                clause("mtc", "mtc"),
                clause("system", "system"),
                field("return_type", optional(sym("return_type"))),
                field("body", optional(sym("block"))),
                attributes(),
            ],
        )
        .rule(
            "external_function",
            seq![
                visibility(),
                "external",
                "function",
                field("modifiers", optional(sym("modifiers"))),
                sym("_parameterized_name"),
                field("parameters", sym("parameters")),
                field("return_type", optional(sym("return_type"))),
                attributes(),
            ],
        )
        .rule(
            "altstep",
            seq![
                visibility(),
                "altstep",
                field("modifiers", optional(sym("modifiers"))),
                sym("_parameterized_name"),
                field("parameters", sym("parameters")),
                runs_on(),
                clause("mtc", "mtc"),
                clause("system", "system"),
                field("body", optional(sym("alt_block"))),
                attributes(),
            ],
        )
        .rule(
            "testcase",
            seq![
                visibility(),
                "testcase",
                sym("_parameterized_name"),
                field("parameters", sym("parameters")),
                field(
                    "runs_on",
                    optional(seq![
                        "runs",
                        "on",
                        sym("reference"),
                        optional(seq!["system", sym("reference")]),
                    ]),
                ),
                field("body", optional(sym("block"))),
                attributes(),
            ],
        )
        .rule(
            "control",
            seq![visibility(), "control", field("body", sym("block")), attributes()],
        )
        .rule(
            "signature",
            seq![
                visibility(),
                "signature",
                sym("_parameterized_name"),
                field("parameters", sym("parameters")),
                field("return_type", optional(sym("return_type"))),
                field(
                    "exception",
                    optional(seq!["exception", "(", sym("references"), ")"]),
                ),
                attributes(),
            ],
        )
        .rule(
            "template",
            seq![
                visibility(),
                "template",
                field(
                    "restriction",
                    optional(seq!["(", sym("template_restriction"), ")"]),
                ),
                field("modifiers", optional(sym("modifiers"))),
                field("type", sym("reference")),
                sym("_parameterized_name"),
                field("parameters", optional(sym("parameters"))),
                field("modifies", optional(seq!["modifies", sym("reference")])),
                ":=",
                field("value", sym("_expression")),
                attributes(),
            ],
        )
        .rule("module_parameter", declaration("modulepar", true))
        .rule("const_decl", declaration("const", false))
        .rule("var_decl", declaration("var", true))
        .rule(
            "timer_decl",
            seq![
                visibility(),
                field("type", alias("timer", "reference")),
                field("declarators", sep_by1(",", sym("declarator"))),
                attributes(),
            ],
        )
        .rule(
            "port_decl",
            seq![
                visibility(),
                "port",
                field("type", sym("nested_type")),
                field("declarators", sep_by1(",", sym("declarator"))),
                attributes(),
            ],
        )
        .rule(
            "declarator",
            seq![
                sym("_parameterized_name"),
                field("array_def", optional(sym("array_def"))),
                field("value", optional(seq![":=", sym("_expression")])),
            ],
        )
        .rule(
            "friend",
            seq![
                field("private", optional("private")),
                "friend",
                "module",
                sym("references"),
                attributes(),
            ],
        )
        .rule(
            "import_definition",
            seq![
                visibility(),
                "import",
                "from",
                field("module_id", sym("reference")),
                field("body", sym("_import_body")),
                attributes(),
            ],
        )
        .rule(
            "_import_body",
            choice![
                seq![
                    "all",
                    optional(seq![
                        "except",
                        "{",
                        repeat(seq![sym("_except_spec"), optional(";")]),
                        "}",
                    ]),
                ],
                seq!["{", repeat(seq![sym("_import_spec"), optional(";")]), "}"],
            ],
        )
        .rule(
            "_import_spec",
            seq![
                field("kind", keywords(IMPORT_KINDS)),
                choice![
                    sym("references"),
                    seq!["all", optional(seq!["except", sym("references")])],
                ],
            ],
        )
        .rule(
            "_except_spec",
            seq![
                field("kind", keywords(IMPORT_KINDS)),
                field("refs", choice![sym("references"), "all"]),
            ],
        )
        .rule(
            "attributes",
            seq!["with", "{", repeat(seq![sym("attribute"), optional(";")]), "}"],
        )
        .rule(
            "attribute",
            seq![
                field(
                    "kind",
                    keywords(&["extension", "encode", "variant", "display", "optional"]),
                ),
                field("modifier", optional("override")),
                field("specifier", optional(seq!["(", sym("references"), ")"])),
                field("value", sym("charstring")),
            ],
        )
        .rule(
            "language_spec",
            seq!["language", sep_by1(",", sym("charstring"))],
        )
        .rule(
            "_parameterized_name",
            seq![
                field("name", sym("name")),
                field("type_parameters", optional(sym("type_parameters"))),
            ],
        )
        .rule(
            "type_parameters",
            seq!["<", sep_by(",", sym("type_parameter")), ">"],
        )
        .rule(
            "type_parameter",
            seq![
                "in",
                field("type", choice![sym("nested_type"), "type", "signature"]),
                field("name", sym("name")),
                field("default", optional(seq![":=", sym("nested_type")])),
            ],
        )
        .rule("parameters", seq!["(", sep_by(",", sym("parameter")), ")"])
        .rule(
            "parameter",
            seq![
                field("direction", optional(keywords(&["in", "out", "inout"]))),
                field("template_restriction", optional(sym("nested_template"))),
                field("type", sym("nested_type")),
                field("name", sym("name")),
                field("array_def", optional(sym("array_def"))),
                field("default", optional(seq![":=", sym("_expression")])),
            ],
        )
        .rule(
            "return_type",
            seq![
                "return",
                field("template_restriction", optional(sym("nested_template"))),
                field("type", sym("nested_type")),
            ],
        )
        .rule("modifiers", repeat1(sym("modifier")))
        .rule("visibility", keywords(&["public", "private", "friend"]))
}

fn types(builder: GrammarBuilder) -> GrammarBuilder {
    builder
        .rule("record_type", structured_type("record"))
        .rule("set_type", structured_type("set"))
        .rule("union_type", structured_type("union"))
        .rule("record_of_type", list_type("record"))
        .rule("set_of_type", list_type("set"))
        .rule(
            "enumerated_type",
            seq![
                visibility(),
                "type",
                "enumerated",
                sym("_parameterized_name"),
                "{",
                field("values", sep_by(",", sym("enumerated_value"))),
                "}",
                attributes(),
            ],
        )
        .rule(
            "enumerated_value",
            seq![
                field("name", sym("name")),
                field(
                    "value",
                    optional(seq!["(", sep_by1(",", sym("_expression")), ")"]),
                ),
            ],
        )
        .rule(
            "subtype",
            seq![
                visibility(),
                "type",
                field("super_type", sym("nested_type")),
                sym("_parameterized_name"),
                field("value_constraint", optional(sym("template_values"))),
                field("length_constraint", optional(sym("length_spec"))),
                attributes(),
            ],
        )
        .rule(
            "component_type",
            seq![
                visibility(),
                "type",
                "component",
                sym("_parameterized_name"),
                field("extends", optional(seq!["extends", sym("references")])),
                field("body", optional(sym("block"))),
                attributes(),
            ],
        )
        .rule(
            "port_type",
            seq![
                visibility(),
                "type",
                "port",
                sym("_parameterized_name"),
                field("kind", keywords(&["message", "procedure", "mixed"])),
                field("port_attributes", optional(sym("port_attributes"))),
                attributes(),
            ],
        )
        .rule(
            "port_attributes",
            seq![
                "{",
                repeat(seq![sym("port_message_types"), optional(";")]),
                "}",
            ],
        )
        .rule(
            "port_message_types",
            seq![
                field("direction", keywords(&["in", "out", "inout"])),
                field("messages", sep_by1(",", sym("reference"))),
            ],
        )
        .rule(
            "field",
            seq![
                field("type", sym("nested_type")),
                field("name", sym("name")),
                field("array_def", optional(sym("array_def"))),
                field("value_constraint", optional(sym("template_values"))),
                field("length_constraint", optional(sym("length_spec"))),
                field("optional", optional("optional")),
            ],
        )
        .rule("array_def", repeat1(seq!["[", sym("_expression"), "]"]))
        .rule(
            "length_spec",
            seq![
                "length",
                "(",
                field("lower", optional(seq![sym("_boundary"), ".."])),
                field("upper", sym("_boundary")),
                ")",
            ],
        )
        .rule("_boundary", choice![sym("number"), sym("reference")])
        .rule("nested_type", sym("reference"))
        .rule(
            "nested_template",
            choice![
                seq![
                    "template",
                    optional(seq!["(", sym("template_restriction"), ")"]),
                ],
                sym("template_restriction"),
            ],
        )
        .rule("template_restriction", keywords(&["omit", "value", "present"]))
}

fn statements(builder: GrammarBuilder) -> GrammarBuilder {
    builder
        .rule(
            "block",
            seq![
                sym("_basic_block"),
                field("catches", repeat(sym("catch_clause"))),
                field("finally", optional(sym("finally_clause"))),
            ],
        )
        .rule(
            "_basic_block",
            seq!["{", repeat(seq![sym("_statement"), optional(";")]), "}"],
        )
        .rule("catch_clause", seq!["catch", sym("_basic_block")])
        .rule("finally_clause", seq!["finally", sym("_basic_block")])
        .rule(
            "_statement",
            choices(&[
                "block",
                "reference",
                "redirection_expr",
                "assignment",
                "var_decl",
                "timer_decl",
                "port_decl",
                "const_decl",
                "template",
                "label_stmt",
                "goto_stmt",
                "break_stmt",
                "continue_stmt",
                "return_stmt",
                "if_stmt",
                "select_stmt",
                "for_stmt",
                "while_stmt",
                "do_while_stmt",
                "alt_stmt",
                "interleave_stmt",
            ]),
        )
        .rule(
            "assignment",
            seq![
                field("left", sym("reference")),
                ":=",
                field("right", sym("_expression")),
            ],
        )
        .rule("label_stmt", seq!["label", sym("name")])
        .rule("goto_stmt", seq!["goto", sym("name")])
        .rule("break_stmt", seq!["break", optional(sym("name"))])
        .rule("continue_stmt", seq!["continue", optional(sym("name"))])
        .rule(
            "return_stmt",
            seq!["return", field("value", optional(sym("_expression")))],
        )
        .rule(
            "if_stmt",
            seq![
                "if",
                "(",
                field("condition", sym("_expression")),
                ")",
                field("then", sym("block")),
                field(
                    "else",
                    optional(seq!["else", choice![sym("if_stmt"), sym("block")]]),
                ),
            ],
        )
        .rule(
            "for_stmt",
            seq![
                "for",
                "(",
                field("init", optional(choice![sym("var_decl"), sym("assignment")])),
                ";",
                field("condition", optional(sym("_expression"))),
                ";",
                field("post", optional(choice![sym("assignment"), sym("reference")])),
                ")",
                field("body", sym("block")),
            ],
        )
        .rule(
            "while_stmt",
            seq![
                "while",
                "(",
                field("condition", sym("_expression")),
                ")",
                field("body", sym("block")),
            ],
        )
        .rule(
            "do_while_stmt",
            seq![
                "do",
                field("body", sym("block")),
                "while",
                "(",
                field("condition", sym("_expression")),
                ")",
            ],
        )
        .rule(
            "select_stmt",
            seq![
                "select",
                "(",
                field("expression", sym("_expression")),
                ")",
                "{",
                field("clauses", repeat(sym("select_case"))),
                "}",
            ],
        )
        .rule(
            "select_case",
            seq![
                "case",
                choice![
                    seq!["(", field("values", sep_by1(",", sym("_expression"))), ")"],
                    "else",
                ],
                field("body", sym("block")),
            ],
        )
        .rule(
            "alt_stmt",
            seq![
                "alt",
                field("nodefault", optional("@nodefault")),
                field("body", sym("alt_block")),
            ],
        )
        .rule(
            "interleave_stmt",
            seq![
                "interleave",
                field("nodefault", optional("@nodefault")),
                field("body", sym("alt_block")),
            ],
        )
        .rule(
            "alt_block",
            seq![
                "{",
                repeat(seq![
                    choices(&[
                        "var_decl",
                        "timer_decl",
                        "port_decl",
                        "const_decl",
                        "template",
                        "guarded_stmt",
                        "guarded_else_stmt",
                    ]),
                    optional(";"),
                ]),
                "}",
            ],
        )
        .rule(
            "guarded_stmt",
            seq![
                "[",
                field("condition", optional(sym("_expression"))),
                "]",
                field("stmt", choice![sym("reference"), sym("redirection_expr")]),
                field("body", optional(sym("block"))),
            ],
        )
        .rule(
            "guarded_else_stmt",
            seq!["[", "else", "]", field("body", sym("block"))],
        )
        .rule(
            "redirection_expr",
            seq![
                sym("reference"),
                "->",
                field("value", optional(seq!["value", sym("_expression")])),
                field("param", optional(seq!["param", sym("template_values")])),
                field("sender", optional(seq!["sender", sym("_expression")])),
            ],
        )
}

fn expressions(builder: GrammarBuilder) -> GrammarBuilder {
    let binary = BINARY_OPERATORS
        .iter()
        .map(|&(level, operators)| {
            prec_left(
                level,
                seq![
                    field("left", sym("_expression")),
                    field("operator", keywords(operators)),
                    field("right", sym("_expression")),
                ],
            )
        })
        .collect();

    builder
        .rule(
            "_expression",
            choice![
                sym("unary_expression"),
                sym("binary_expression"),
                "null",
                "omit",
                "?",
                "*",
                sym("boolean_literal"),
                sym("verdict_literal"),
                sym("number"),
                sym("charstring"),
                sym("bitstring"),
                sym("hexstring"),
                sym("octetstring"),
                sym("template_values"),
                sym("composite_literal"),
                sym("inline_template"),
                sym("reference"),
            ],
        )
        .rule(
            "unary_expression",
            choice![
                unary(prec::UNARY, keywords(&["+", "-"])),
                unary(prec::BITWISE_NOT, "not4b".into()),
                unary(prec::LOGICAL_NOT, "not".into()),
            ],
        )
        .rule("binary_expression", choice(binary))
        .rule(
            "template_values",
            seq!["(", sep_by1(",", sym("_expression")), ")"],
        )
        .rule(
            "composite_literal",
            seq![
                "{",
                sep_by(",", choice![sym("_expression"), sym("assignment")]),
                "}",
            ],
        )
        .rule(
            "inline_template",
            seq![field("type", sym("reference")), ":", field("value", sym("_expression"))],
        )
        .rule("references", sep_by1(",", sym("reference")))
        .rule(
            "reference",
            choice![
                sym("selector_expression"),
                sym("index_expression"),
                sym("function_call_expression"),
                sym("_identifier"),
                seq![keywords(&["any", "all"]), keywords(&["port", "timer", "component"])],
            ],
        )
        .rule(
            "selector_expression",
            prec_left(
                prec::PRIMARY,
                seq![
                    field("operand", sym("reference")),
                    ".",
                    field("field", sym("reference")),
                ],
            ),
        )
        .rule(
            "index_expression",
            prec_left(
                prec::PRIMARY,
                seq![
                    field("operand", sym("reference")),
                    "[",
                    field("index", sep_by(",", sym("_expression"))),
                    "]",
                ],
            ),
        )
        .rule(
            "function_call_expression",
            prec_left(
                prec::PRIMARY,
                seq![
                    field("function", sym("reference")),
                    "(",
                    field("arguments", sep_by(",", sym("_expression"))),
                    ")",
                ],
            ),
        )
        .rule("name", sym("_identifier"))
        .rule("boolean_literal", keywords(&["true", "false"]))
        .rule(
            "verdict_literal",
            keywords(&["none", "pass", "inconc", "fail", "error"]),
        )
}

fn lexical(builder: GrammarBuilder) -> GrammarBuilder {
    builder
        .rule("_identifier", pattern("[a-zA-Z_][a-zA-Z0-9_]*"))
        .rule("modifier", pattern("@[a-zA-Z0-9_]+"))
        .rule(
            "number",
            token(seq![
                pattern(r"[0-9]+(\.[0-9]+)?"),
                optional(pattern("[eE][+-]?[0-9][0-9_]*")),
            ]),
        )
        .rule("charstring", pattern(r#""(\\.|""|[^"\\])*""#))
        .rule("bitstring", pattern("'[01*? ]+'[bB]"))
        .rule("hexstring", pattern("'[0-9A-Fa-f*? ]+'[hH]"))
        .rule("octetstring", pattern("'[0-9A-Fa-f*? ]+'[oO]"))
        .rule(
            "comment",
            token(choice![
                seq!["//", pattern(r"[^\n\r]*")],
                seq!["/*", pattern(r"[^*]*\*+([^/*][^*]*\*+)*"), "/"],
            ]),
        )
}

fn choices(names: &[&str]) -> Rule {
    choice(names.iter().map(|name| sym(*name)).collect())
}

fn keywords(words: &[&str]) -> Rule {
    choice(words.iter().map(|word| string(*word)).collect())
}

fn visibility() -> Rule {
    field("visibility", optional(sym("visibility")))
}

fn attributes() -> Rule {
    field("attributes", optional(sym("attributes")))
}

fn runs_on() -> Rule {
    field("runs_on", optional(seq!["runs", "on", sym("reference")]))
}

/// `keyword reference`, optional, labelled `name`.
fn clause(name: &str, keyword: &str) -> Rule {
    field(name, optional(seq![keyword, sym("reference")]))
}

fn unary(level: i32, operator: Rule) -> Rule {
    prec_right(
        level,
        seq![
            field("operator", operator),
            field("operand", sym("_expression")),
        ],
    )
}

/// `var`, `const` and `modulepar` declarations. A present type outweighs
/// reading the type name as the first declarator.
fn declaration(keyword: &str, templated: bool) -> Rule {
    let restriction = if templated {
        field("template_restriction", optional(sym("nested_template")))
    } else {
        blank()
    };
    seq![
        visibility(),
        keyword,
        restriction,
        field("type", optional(prec_dynamic(1, sym("nested_type")))),
        field("declarators", sep_by1(",", sym("declarator"))),
        attributes(),
    ]
}

fn structured_type(keyword: &str) -> Rule {
    seq![
        visibility(),
        "type",
        keyword,
        sym("_parameterized_name"),
        "{",
        field("fields", sep_by(",", sym("field"))),
        "}",
        attributes(),
    ]
}

fn list_type(keyword: &str) -> Rule {
    seq![
        visibility(),
        "type",
        keyword,
        field("length_constraint", optional(sym("length_spec"))),
        "of",
        field("element_type", sym("nested_type")),
        sym("_parameterized_name"),
        field("element_value_constraint", optional(sym("template_values"))),
        attributes(),
    ]
}
