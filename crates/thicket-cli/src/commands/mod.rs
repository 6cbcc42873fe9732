pub mod check;
pub mod dump;
pub mod edit;
pub mod generate;
pub mod lang_resolver;
pub mod langs;
pub mod query;
pub mod source;
pub mod tree;

mod diagnostics;

#[cfg(test)]
mod commands_tests;
#[cfg(test)]
mod test_utils;

use std::io;
use std::path::PathBuf;

use thicket_core::GrammarError;
use thicket_generate::GenerateError;
use thicket_runtime::{EditError, LanguageError, ParseError};
use thicket_table::LoadError;

/// Everything a command can fail with. `main` prints it as `error: …`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("source required (positional SOURCE or -s/--source)")]
    SourceRequired,
    #[error("unknown language `{name}`{}", suggestion_hint(.suggestion.as_deref()))]
    UnknownLanguage {
        name: String,
        suggestion: Option<String>,
    },
    #[error("cannot infer language from extension `.{0}`; use -l/--lang or -t/--table")]
    UnknownExtension(String),
    #[error("a language is required; use -l/--lang or -t/--table")]
    LanguageRequired,
    #[error("a grammar is required (GRAMMAR path or -l/--lang)")]
    GrammarRequired,
    #[error("invalid edit span `{0}`: expected START or START:OLD_END")]
    InvalidSpan(String),
    #[error("edit span {start}..{old_end} lies outside the {len}-byte source")]
    SpanOutOfBounds {
        start: usize,
        old_end: usize,
        len: usize,
    },
    #[error("{count} undeclared conflict(s) in grammar `{grammar}`")]
    UndeclaredConflicts { grammar: String, count: usize },
    #[error("{count} syntax error(s) in {source_name}")]
    SyntaxErrors { source_name: String, count: usize },
    /// Already rendered as a diagnostic.
    #[error("{0}")]
    Reported(String),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) => format!("; did you mean `{name}`? (run `thicket langs` for the full list)"),
        None => " (run `thicket langs` for the full list)".to_owned(),
    }
}
