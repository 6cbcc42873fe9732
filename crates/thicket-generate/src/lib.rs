//! Grammar compiler for thicket.
//!
//! Turns a [`Grammar`] into a [`LanguageTable`]:
//! - `prepare` - reference checks, token extraction, symbol classification
//! - `flatten` - rules into productions (choices expanded, repeats as helper rules)
//! - `lalr` - LALR(1) item sets with propagated lookaheads
//! - `resolve` - precedence/associativity conflict resolution, GLR action lists
//! - `lexer` - token and separator automata
//! - `emit` - table assembly

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod emit;
mod error;
mod flatten;
mod lalr;
mod lexer;
mod prepare;
mod resolve;
mod token_set;

#[cfg(test)]
mod flatten_tests;
#[cfg(test)]
mod lexer_tests;
#[cfg(test)]
pub(crate) mod test_utils;

pub use error::GenerateError;

use thicket_core::Grammar;
use thicket_table::{LanguageTable, StateId};

/// Generation limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Maximum productions a single rule may expand into.
    pub max_alternatives: usize,
    /// Maximum nesting of inline rules.
    pub max_inline_depth: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_alternatives: 4096,
            max_inline_depth: 16,
        }
    }
}

impl GenerateOptions {
    pub fn max_alternatives(mut self, limit: usize) -> Self {
        self.max_alternatives = limit;
        self
    }

    pub fn max_inline_depth(mut self, depth: u32) -> Self {
        self.max_inline_depth = depth;
        self
    }
}

/// A conflict left in the table for the GLR runtime to explore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictReport {
    pub state: StateId,
    pub lookahead: String,
    /// Rendered actions, in table order.
    pub actions: Vec<String>,
    /// Rules whose items take part in the conflict.
    pub rules: Vec<String>,
    /// Whether a `conflicts` entry of the grammar covers it.
    pub declared: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub state_count: usize,
    pub production_count: usize,
    pub token_count: usize,
    pub conflicts: Vec<ConflictReport>,
}

impl Report {
    pub fn undeclared_conflicts(&self) -> impl Iterator<Item = &ConflictReport> {
        self.conflicts.iter().filter(|c| !c.declared)
    }
}

/// Output of [`generate`].
#[derive(Clone, Debug)]
pub struct Generated {
    pub table: LanguageTable,
    pub report: Report,
}

/// Compile a grammar with default options.
pub fn generate(grammar: &Grammar) -> Result<Generated, GenerateError> {
    generate_with(grammar, GenerateOptions::default())
}

pub fn generate_with(grammar: &Grammar, options: GenerateOptions) -> Result<Generated, GenerateError> {
    let prepared = prepare::prepare(grammar)?;
    let flat = flatten::flatten(&prepared, &options)?;
    let automaton = lalr::build(&flat);
    let resolved = resolve::resolve(&flat, &automaton);
    let lexical = lexer::build(&prepared)?;
    let generated = emit::emit(&prepared, &flat, &automaton, resolved, lexical)?;

    tracing::debug!(
        grammar = %grammar.name,
        states = generated.report.state_count,
        productions = generated.report.production_count,
        tokens = generated.report.token_count,
        conflicts = generated.report.conflicts.len(),
        "generated parse table"
    );
    for conflict in generated.report.undeclared_conflicts() {
        tracing::warn!(
            state = conflict.state,
            lookahead = %conflict.lookahead,
            rules = ?conflict.rules,
            "undeclared conflict kept for GLR"
        );
    }
    Ok(generated)
}
