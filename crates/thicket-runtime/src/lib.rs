//! Incremental, error-tolerant GLR parsing over thicket grammar tables.
//!
//! # Example
//!
//! ```
//! use thicket_runtime::{InputEdit, Language, Parser};
//!
//! fn sexp(table: &[u8], text: &str) -> Result<String, Box<dyn std::error::Error>> {
//!     let language = Language::load(table)?;
//!     let mut parser = Parser::new(&language)?;
//!     let tree = parser.parse(text, None)?;
//!
//!     let mut edited_text = text.to_owned();
//!     edited_text.insert_str(0, " ");
//!     let edited = tree.edit(&InputEdit::insert(text.as_bytes(), 0, b" "))?;
//!     let (tree, changed) = parser.reparse(&edited, edited_text.as_str())?;
//!     Ok(format!("{} ({} changed)", tree.root_node().to_sexp(), changed.len()))
//! }
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod language;
mod length;
mod lexer;
mod parser;
pub mod query;
mod source;
mod tree;

#[cfg(test)]
pub(crate) mod test_utils;

pub use language::{Language, LanguageError};
pub use length::{Length, Point};
pub use lexer::{ExternalMatch, ExternalScanner, ScanCursor, ValidExternals};
pub use parser::{FuelLimits, ParseError, Parser};
pub use query::{Query, QueryCapture, QueryCursor, QueryError, QueryMatch};
pub use source::{ChunkedSource, Source};
pub use tree::{EditError, InputEdit, Node, Range, Tree, TreeCursor};
