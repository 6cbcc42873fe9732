//! GLR parsing with error recovery and incremental reuse.
//!
//! The parser keeps a small set of stack versions. A table cell with several
//! actions forks the current version; versions that reach the same state at
//! the same position are merged; a version without any action fails. When
//! every version has failed, the most advanced one is repaired by skipping,
//! inserting or popping material, and parsing resumes. Parsing therefore
//! always produces a tree.

mod glr;
mod recovery;
mod reuse;
mod stack;

#[cfg(test)]
mod parser_tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::language::{Language, LanguageError};
use crate::source::Source;
use crate::tree::{Range, Tree};

use glr::Run;

/// Parse failure. Syntax errors are never failures; they end up as ERROR
/// and MISSING nodes in the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("parse cancelled")]
    Cancelled,
}

/// Bounds on the work the parser does per token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuelLimits {
    /// Maximum stack versions alive at once (default: 6).
    pub(crate) max_versions: usize,
    /// Tokens a recovery candidate is tried against (default: 3).
    pub(crate) recovery_lookahead: usize,
    /// Deepest pop considered by recovery (default: 16).
    pub(crate) max_pop_depth: usize,
    /// Reductions allowed between two shifts (default: 10,000).
    pub(crate) reduction_fuel: u32,
}

impl Default for FuelLimits {
    fn default() -> Self {
        Self {
            max_versions: 6,
            recovery_lookahead: 3,
            max_pop_depth: 16,
            reduction_fuel: 10_000,
        }
    }
}

impl FuelLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_versions(mut self, count: usize) -> Self {
        self.max_versions = count.max(1);
        self
    }

    pub fn recovery_lookahead(mut self, tokens: usize) -> Self {
        self.recovery_lookahead = tokens.max(1);
        self
    }

    pub fn max_pop_depth(mut self, depth: usize) -> Self {
        self.max_pop_depth = depth;
        self
    }

    pub fn reduction_fuel(mut self, fuel: u32) -> Self {
        self.reduction_fuel = fuel;
        self
    }

    pub fn get_max_versions(&self) -> usize {
        self.max_versions
    }

    pub fn get_reduction_fuel(&self) -> u32 {
        self.reduction_fuel
    }
}

/// Parses text with one language. Reusable across parses.
#[derive(Debug)]
pub struct Parser {
    language: Language,
    limits: FuelLimits,
    cancellation: Option<Arc<AtomicBool>>,
}

impl Parser {
    /// Fails when the language needs an external scanner it does not have.
    pub fn new(language: &Language) -> Result<Self, LanguageError> {
        language.check()?;
        Ok(Self {
            language: language.clone(),
            limits: FuelLimits::default(),
            cancellation: None,
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        language.check()?;
        self.language = language.clone();
        Ok(())
    }

    pub fn with_limits(mut self, limits: FuelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: FuelLimits) {
        self.limits = limits;
    }

    /// Parsing stops with [`ParseError::Cancelled`] once the flag is set.
    pub fn set_cancellation_flag(&mut self, flag: Option<Arc<AtomicBool>>) {
        self.cancellation = flag;
    }

    /// Parse `source`. With `old`, a tree already edited to match `source`,
    /// unchanged subtrees of `old` are reused.
    pub fn parse<S: Source + ?Sized>(&mut self, source: &S, old: Option<&Tree>) -> Result<Tree, ParseError> {
        let old = old.filter(|tree| tree.language().name() == self.language.name());
        let mut run = Run::new(&self.language, source, old, self.limits);
        loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                tracing::debug!("parse cancelled");
                return Err(ParseError::Cancelled);
            }
            if let Some(tree) = run.step() {
                return Ok(tree);
            }
        }
    }

    /// Parse `source` against an edited tree, also reporting which ranges
    /// changed structure.
    pub fn reparse<S: Source + ?Sized>(&mut self, edited: &Tree, source: &S) -> Result<(Tree, Vec<Range>), ParseError> {
        let tree = self.parse(source, Some(edited))?;
        let ranges = Tree::changed_ranges(edited, &tree);
        Ok((tree, ranges))
    }
}
