//! Structural queries over syntax trees.
//!
//! Patterns use the S-expression notation of tree-sitter queries:
//! `(binary_expression left: (number) @lhs "+" (_)* @rest)`. A query is
//! compiled against one language, so unknown node kinds and fields are
//! rejected up front.

mod cursor;
mod error;
mod lexer;
mod parser;
mod predicate;

#[cfg(test)]
mod query_tests;

pub use cursor::{QueryCursor, QueryMatches};
pub use error::{QueryError, QueryErrorKind};

use crate::language::Language;
use crate::tree::Node;
use parser::{Pattern, QueryParser};

/// A compiled query.
#[derive(Clone, Debug)]
pub struct Query {
    language: Language,
    patterns: Vec<Pattern>,
    capture_names: Vec<String>,
}

impl Query {
    pub fn new(language: &Language, source: &str) -> Result<Self, QueryError> {
        let tokens = lexer::lex(source)?;
        let (patterns, capture_names) = QueryParser::new(source, tokens, language).parse()?;
        tracing::debug!(
            patterns = patterns.len(),
            captures = capture_names.len(),
            "compiled query"
        );
        Ok(Self {
            language: language.clone(),
            patterns,
            capture_names,
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names
            .iter()
            .position(|c| c == name)
            .map(|i| i as u32)
    }

    /// Offset of the pattern in the query text.
    pub fn start_byte_for_pattern(&self, index: usize) -> Option<usize> {
        self.patterns.get(index).map(|p| p.start_byte)
    }

    pub(crate) fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// One captured node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryCapture<'t> {
    pub node: Node<'t>,
    /// Index into [`Query::capture_names`].
    pub index: u32,
}

/// A pattern matched at one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMatch<'t> {
    pub pattern_index: usize,
    /// In pattern order.
    pub captures: Vec<QueryCapture<'t>>,
}

impl<'t> QueryMatch<'t> {
    pub fn nodes_for_capture_index(&self, index: u32) -> impl Iterator<Item = Node<'t>> + '_ {
        self.captures
            .iter()
            .filter(move |c| c.index == index)
            .map(|c| c.node)
    }
}
