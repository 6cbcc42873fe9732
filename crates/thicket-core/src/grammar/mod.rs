//! Grammar types for tree-sitter style grammars.
//!
//! This module provides types for representing `grammar.json` files,
//! with support for JSON round-tripping, compact binary serialization
//! and a builder DSL for grammars written directly in Rust.

mod binary;
pub mod dsl;
mod json;
mod types;

#[cfg(test)]
mod types_tests;

pub use json::GrammarError;
pub use types::{Grammar, Precedence, PrecedenceEntry, Rule};
