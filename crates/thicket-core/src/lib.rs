#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar model for thicket.
//!
//! A [`Grammar`] is the input to table generation. It can be read from a
//! tree-sitter style `grammar.json`, built in Rust with the [`dsl`] builders,
//! and stored compactly with postcard.

mod colors;
pub mod grammar;

pub use colors::Colors;
pub use grammar::dsl;
pub use grammar::{Grammar, GrammarError, Precedence, PrecedenceEntry, Rule};
