//! Walks the previous tree alongside the parse, offering unchanged subtrees.

use thicket_table::{ParseAction, StateId};

use crate::language::Language;
use crate::tree::subtree::Subtree;

#[derive(Clone)]
struct Slot<'t> {
    parent: &'t Subtree,
    index: usize,
    /// Start (padding included) of `parent.children()[index]`.
    offset: u32,
}

/// Pre-order position in an old tree.
#[derive(Clone)]
pub(crate) struct ReuseCursor<'t> {
    stack: Vec<Slot<'t>>,
}

impl<'t> ReuseCursor<'t> {
    /// Starts at the root's first child; the root itself is never reused.
    pub fn new(root: &'t Subtree) -> Self {
        let mut cursor = Self {
            stack: vec![Slot {
                parent: root,
                index: 0,
                offset: 0,
            }],
        };
        cursor.settle();
        cursor
    }

    fn current(&self) -> Option<(&'t Subtree, u32)> {
        let slot = self.stack.last()?;
        Some((&slot.parent.children()[slot.index].tree, slot.offset))
    }

    fn advance(&mut self) {
        if let Some(slot) = self.stack.last_mut() {
            slot.offset += slot.parent.children()[slot.index].tree.total().bytes;
            slot.index += 1;
        }
        self.settle();
    }

    fn descend(&mut self) {
        match self.current() {
            Some((tree, offset)) if !tree.children().is_empty() => {
                self.stack.push(Slot {
                    parent: tree,
                    index: 0,
                    offset,
                });
            }
            _ => self.advance(),
        }
    }

    /// Pop exhausted levels so `current` is valid or the walk is over.
    fn settle(&mut self) {
        while let Some(slot) = self.stack.last() {
            if slot.index < slot.parent.children().len() {
                return;
            }
            self.stack.pop();
            if let Some(parent) = self.stack.last_mut() {
                parent.offset += parent.parent.children()[parent.index].tree.total().bytes;
                parent.index += 1;
            }
        }
    }

    /// An old subtree starting at `position` that a parser in `state` can
    /// take as is, largest first.
    pub fn reusable(&mut self, language: &Language, position: u32, state: StateId) -> Option<Subtree> {
        loop {
            let (tree, start) = self.current()?;
            if start < position {
                if start + tree.total().bytes <= position {
                    self.advance();
                } else {
                    self.descend();
                }
                continue;
            }
            if start > position {
                return None;
            }
            if tree.children().is_empty() {
                return self.reusable_leaf(language, tree, state).then(|| tree.clone());
            }
            if self.reusable_node(language, tree, state) {
                return Some(tree.clone());
            }
            self.descend();
        }
    }

    fn reusable_leaf(&self, language: &Language, tree: &Subtree, state: StateId) -> bool {
        !tree.has_changes()
            && !tree.is_error()
            && !tree.is_missing()
            && tree.size().bytes > 0
            && tree.lex_mode() == language.lex_mode_id(state)
    }

    fn reusable_node(&self, language: &Language, tree: &Subtree, state: StateId) -> bool {
        let table = language.table();
        if tree.has_changes()
            || tree.is_fragile()
            || tree.has_error()
            || tree.is_extra()
            || tree.parse_state() != state
            || table.goto(state, tree.symbol()).is_none()
        {
            return false;
        }
        let Some((first, lex_mode)) = tree.first_leaf() else {
            return false;
        };
        if lex_mode != table.lex_mode(state)
            || !matches!(table.actions(state, first), [ParseAction::Shift { .. }])
        {
            return false;
        }
        self.followed_by_unchanged_token()
    }

    /// The token after the current subtree decided its reductions, so it
    /// must be unchanged too.
    fn followed_by_unchanged_token(&self) -> bool {
        let mut ahead = self.clone();
        ahead.advance();
        while let Some((tree, _)) = ahead.current() {
            if tree.children().is_empty() {
                if tree.has_changes() {
                    return false;
                }
                if !tree.is_extra() {
                    return true;
                }
                ahead.advance();
            } else if tree.has_changes() {
                ahead.descend();
            } else if tree.is_extra() {
                ahead.advance();
            } else {
                return true;
            }
        }
        true
    }
}
