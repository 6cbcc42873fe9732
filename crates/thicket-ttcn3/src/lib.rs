#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! TTCN-3 for the thicket parser engine.
//!
//! The table is compiled from [`grammar`] on first use and shared by every
//! later call. It goes through the same binary form a table file would, so a
//! language obtained here behaves exactly like one loaded from disk.

use std::sync::LazyLock;

use thicket_runtime::{Language, LanguageError};

mod grammar;


pub use grammar::grammar;

/// Language name, as stored in the table.
pub const NAME: &str = "ttcn3";

/// Names accepted on the command line.
pub const NAMES: &[&str] = &["ttcn3", "ttcn", "ttcn-3"];

/// Source file extensions.
pub const EXTENSIONS: &[&str] = &["ttcn3", "ttcn", "ttcnpp"];

static LANGUAGE: LazyLock<Result<Language, LanguageError>> = LazyLock::new(build);

/// The TTCN-3 language, ready for [`Parser::new`](thicket_runtime::Parser::new).
pub fn language() -> Result<Language, LanguageError> {
    LANGUAGE.clone()
}

fn build() -> Result<Language, LanguageError> {
    let generated = thicket_generate::generate(&grammar()).map_err(build_error)?;
    tracing::debug!(
        states = generated.report.state_count,
        conflicts = generated.report.conflicts.len(),
        "compiled {NAME} grammar"
    );
    let bytes = generated.table.to_bytes()?;
    Ok(Language::load(&bytes)?)
}

fn build_error(err: impl std::fmt::Display) -> LanguageError {
    LanguageError::Build {
        language: NAME.to_owned(),
        message: err.to_string(),
    }
}
