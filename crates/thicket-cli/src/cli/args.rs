//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so the same definition is reused by
//! every command that takes it.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Source file to parse (positional). `-` reads stdin.
pub fn source_path_arg() -> Arg {
    Arg::new("source_path")
        .value_name("SOURCE")
        .value_parser(value_parser!(PathBuf))
        .help("Source file to parse (- for stdin)")
}

/// Inline source text (-s/--source).
pub fn source_text_arg() -> Arg {
    Arg::new("source_text")
        .short('s')
        .long("source")
        .value_name("TEXT")
        .conflicts_with("source_path")
        .help("Inline source text")
}

/// Bundled language (-l/--lang).
pub fn lang_arg() -> Arg {
    Arg::new("lang")
        .short('l')
        .long("lang")
        .value_name("LANG")
        .help("Bundled language (inferred from extension if not specified)")
}

/// Table file produced by `thicket generate` (-t/--table).
pub fn table_arg() -> Arg {
    Arg::new("table")
        .short('t')
        .long("table")
        .value_name("TABLE")
        .value_parser(value_parser!(PathBuf))
        .conflicts_with("lang")
        .help("Grammar table file")
}

/// grammar.json input (positional).
pub fn grammar_path_arg() -> Arg {
    Arg::new("grammar_path")
        .value_name("GRAMMAR")
        .value_parser(value_parser!(PathBuf))
        .help("grammar.json to compile")
}

/// Query text (-q/--query).
pub fn query_text_arg() -> Arg {
    Arg::new("query_text")
        .short('q')
        .long("query")
        .value_name("PATTERN")
        .help("Query patterns")
}

/// Query file (--query-file).
pub fn query_file_arg() -> Arg {
    Arg::new("query_file")
        .long("query-file")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .conflicts_with("query_text")
        .help("Read query patterns from a file")
}

/// Edited span (--at START:OLD_END).
pub fn at_arg() -> Arg {
    Arg::new("at")
        .long("at")
        .value_name("START:OLD_END")
        .required(true)
        .help("Byte span replaced by the edit (START alone for a pure insertion)")
}

/// Replacement text (--insert).
pub fn insert_arg() -> Arg {
    Arg::new("insert")
        .long("insert")
        .value_name("TEXT")
        .default_value("")
        .help("Text inserted at START (empty deletes the span)")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Include anonymous nodes (--raw).
pub fn raw_arg() -> Arg {
    Arg::new("raw")
        .long("raw")
        .action(ArgAction::SetTrue)
        .help("Include anonymous nodes (keywords, punctuation)")
}

/// Show source positions (--spans).
pub fn spans_arg() -> Arg {
    Arg::new("spans")
        .long("spans")
        .action(ArgAction::SetTrue)
        .help("Show source positions")
}

/// Print the reparsed tree as well (--tree).
pub fn show_tree_arg() -> Arg {
    Arg::new("show_tree")
        .long("tree")
        .action(ArgAction::SetTrue)
        .help("Also print the reparsed tree")
}

/// Machine-readable output (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output JSON")
}

/// Write output to file (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write output to file")
}

/// Production limit per rule (--max-alternatives).
pub fn max_alternatives_arg() -> Arg {
    Arg::new("max_alternatives")
        .long("max-alternatives")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .help("Maximum productions a single rule may expand into")
}

/// Treat undeclared conflicts as errors (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Fail on conflicts the grammar does not declare")
}

/// Stack version limit (--max-versions).
pub fn max_versions_arg() -> Arg {
    Arg::new("max_versions")
        .long("max-versions")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .help("Maximum parse stack versions alive at once")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .global(true)
        .help("Log more (-v debug, -vv trace); THICKET_LOG overrides")
}
