//! Persistent syntax trees.
//!
//! A [`Tree`] is an immutable value. [`Tree::edit`] returns a new tree whose
//! geometry reflects a text edit; the old tree stays valid and both share
//! every subtree the edit did not touch.

mod cursor;
mod diff;
mod edit;
mod node;
pub(crate) mod subtree;

#[cfg(test)]
mod diff_tests;
#[cfg(test)]
mod node_tests;

pub use cursor::TreeCursor;
pub use edit::{EditError, InputEdit};
pub use node::Node;

use std::fmt;

use crate::language::Language;
use crate::length::{Length, Point};
use subtree::Subtree;

/// A span of text, in bytes and points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    pub(crate) fn from_lengths(start: Length, end: Length) -> Self {
        Self {
            start_byte: start.bytes as usize,
            end_byte: end.bytes as usize,
            start_point: start.extent,
            end_point: end.extent,
        }
    }

    pub fn bytes(&self) -> std::ops::Range<usize> {
        self.start_byte..self.end_byte
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} ({} - {})",
            self.start_byte, self.end_byte, self.start_point, self.end_point
        )
    }
}

/// A parsed syntax tree.
#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
    /// Text replaced by edits since the tree was parsed, in current coordinates.
    edited: Vec<(Length, Length)>,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language) -> Self {
        Self {
            root,
            language,
            edited: Vec::new(),
        }
    }

    pub(crate) fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root_node())
    }

    /// Length of the text the tree covers, in bytes.
    pub fn len(&self) -> usize {
        self.root.total().bytes as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte ranges whose node structure differs between `old` (already
    /// edited) and `new`.
    pub fn changed_ranges(old: &Tree, new: &Tree) -> Vec<Range> {
        diff::changed_ranges(old, new)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {}}}", self.root_node().to_sexp())
    }
}
