//! Repairing a failed version.
//!
//! Three kinds of repair are tried: skipping the lookahead, inserting one
//! MISSING token before it, and popping frames off the stack. Each is scored
//! by running the automaton (on states only, without building trees) over the
//! next few tokens; the repair that gets furthest wins.

use std::collections::HashMap;

use thicket_table::{END_SYMBOL, ParseAction, StateId, SymbolId};

use super::glr::{Run, Status};
use crate::length::Length;
use crate::source::Source;
use crate::tree::subtree::{
    ERROR_COST_PER_MISSING_TREE, ERROR_COST_PER_SKIPPED_CHAR, ERROR_COST_PER_SKIPPED_LINE,
    ERROR_COST_PER_SKIPPED_TREE, Subtree,
};

/// Recoveries allowed at one position before skipping is forced.
const MAX_RECOVERIES_PER_POSITION: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Repair {
    Skip,
    Insert(SymbolId),
    Pop(usize),
}

struct Candidate {
    repair: Repair,
    score: usize,
    cost: u32,
}

impl<S: Source + ?Sized> Run<'_, S> {
    pub(super) fn recover(&mut self, index: usize) {
        let Some(token) = self.versions[index].lookahead.take() else {
            self.versions[index].status = Status::Active;
            return;
        };
        let at_end = Self::is_end(&token);

        let version = &mut self.versions[index];
        if version.recovery_position == version.position.bytes {
            version.recoveries += 1;
        } else {
            version.recovery_position = version.position.bytes;
            version.recoveries = 1;
        }
        let forced = version.recoveries > MAX_RECOVERIES_PER_POSITION;

        let chosen = if forced {
            None
        } else {
            self.choose(index, &token, at_end)
        };

        let version = &mut self.versions[index];
        version.status = Status::Active;
        match chosen {
            Some(Repair::Insert(symbol)) => {
                tracing::debug!(
                    position = version.position.bytes,
                    missing = self.language.symbol_name(symbol),
                    "recovery: insert"
                );
                let state = self.arena.state(version.head);
                version.lookahead = Some(Subtree::missing(self.language, symbol, state));
            }
            Some(Repair::Pop(depth)) => {
                tracing::debug!(position = version.position.bytes, depth, "recovery: pop");
                self.pop_into_error(index, depth);
            }
            Some(Repair::Skip) => self.skip(index, token),
            None if !at_end => self.skip(index, token),
            None => {
                tracing::debug!(position = version.position.bytes, "recovery: wrap everything");
                self.accept_everything(index, token);
            }
        }
    }

    fn choose(&self, index: usize, token: &Subtree, at_end: bool) -> Option<Repair> {
        let version = &self.versions[index];
        let table = self.language.table();
        let states = self.arena.states(version.head);
        let Some(&top) = states.last() else {
            return None;
        };
        let mut lexed = HashMap::new();
        let mut candidates = Vec::new();

        if !at_end {
            let after = version.position + token.total();
            candidates.push(Candidate {
                repair: Repair::Skip,
                score: self.simulate(&states, None, after, &mut lexed),
                cost: self.skip_cost(index, token),
            });
        }

        for symbol in table.expected_terminals(top) {
            if symbol == END_SYMBOL || self.language.symbol(symbol).extra {
                continue;
            }
            let score = self.simulate(&states, Some((symbol, version.position)), version.position, &mut lexed);
            if score >= 2 {
                candidates.push(Candidate {
                    repair: Repair::Insert(symbol),
                    score,
                    cost: ERROR_COST_PER_MISSING_TREE,
                });
            }
        }

        let max_depth = self.limits.max_pop_depth.min(states.len() - 1);
        for depth in 1..=max_depth {
            let base = &states[..states.len() - depth];
            let score = self.simulate(base, None, version.position, &mut lexed);
            if score >= 1 {
                candidates.push(Candidate {
                    repair: Repair::Pop(depth),
                    score,
                    cost: self.pop_cost(index, depth),
                });
            }
        }

        candidates
            .into_iter()
            .max_by(|a, b| {
                a.score
                    .cmp(&b.score)
                    .then(b.cost.cmp(&a.cost))
                    .then(b.repair.cmp(&a.repair))
            })
            .map(|c| c.repair)
    }

    /// Tokens accepted, up to the recovery window, when the automaton runs
    /// from `states` on `first` and then on lexed input from `position`.
    /// Reaching Accept counts as the whole window.
    fn simulate(
        &self,
        states: &[StateId],
        first: Option<(SymbolId, Length)>,
        mut position: Length,
        lexed: &mut HashMap<(u32, u32), (SymbolId, Length, bool)>,
    ) -> usize {
        let table = self.language.table();
        let window = self.limits.recovery_lookahead;
        let mut stack = states.to_vec();
        let mut pending = first;
        let mut consumed = 0;
        let mut budget = window * 4 + 8;

        while consumed < window && budget > 0 {
            budget -= 1;
            let Some(&top) = stack.last() else {
                return consumed;
            };
            let (symbol, end) = match pending.take() {
                Some(token) => token,
                None => {
                    let mode = self.language.lex_mode_id(top);
                    let (symbol, end, unrecognized) = *lexed
                        .entry((position.bytes, mode))
                        .or_insert_with(|| {
                            let token = self.lex(position, top);
                            (token.symbol(), position + token.total(), !token.visible() && token.is_error())
                        });
                    if unrecognized {
                        return consumed;
                    }
                    (symbol, end)
                }
            };

            let mut reductions = 0;
            loop {
                let Some(&top) = stack.last() else {
                    return consumed;
                };
                match table.actions(top, symbol).first() {
                    None => return consumed,
                    Some(ParseAction::Accept) => return window,
                    Some(ParseAction::ShiftExtra) => {
                        position = end;
                        break;
                    }
                    Some(&ParseAction::Shift { state }) => {
                        stack.push(state);
                        position = end;
                        consumed += 1;
                        break;
                    }
                    Some(&ParseAction::Reduce { production }) => {
                        reductions += 1;
                        if reductions > 256 {
                            return consumed;
                        }
                        let production = table.production(production);
                        let keep = stack.len().saturating_sub(production.child_count()).max(1);
                        stack.truncate(keep);
                        let Some(next) = stack.last().and_then(|&s| table.goto(s, production.lhs)) else {
                            return consumed;
                        };
                        stack.push(next);
                    }
                }
            }
        }
        consumed
    }

    fn skip_cost(&self, index: usize, token: &Subtree) -> u32 {
        let head = self.versions[index].head;
        match &self.arena.get(head).subtree {
            Some(top) if top.is_error() && !top.children().is_empty() => {
                // the token extends the ERROR node on top by its full length
                let grown = token.total();
                token.error_cost()
                    + ERROR_COST_PER_SKIPPED_CHAR * grown.bytes
                    + ERROR_COST_PER_SKIPPED_LINE * grown.extent.row
                    + if token.is_extra() { 0 } else { ERROR_COST_PER_SKIPPED_TREE }
            }
            _ => Subtree::wrapped_error_cost(std::slice::from_ref(token)),
        }
    }

    fn pop_cost(&self, index: usize, depth: usize) -> u32 {
        let (popped, _) = self.popped(index, depth);
        let own: u32 = popped.iter().map(Subtree::error_cost).sum();
        Subtree::wrapped_error_cost(&popped) - own
    }

    /// Subtrees above the `depth`-th non-extra frame, bottom first, and the
    /// frame left on top.
    fn popped(&self, index: usize, depth: usize) -> (Vec<Subtree>, u32) {
        let mut head = self.versions[index].head;
        let mut popped = Vec::new();
        let mut count = 0;
        while count < depth {
            let frame = self.arena.get(head);
            let (Some(subtree), Some(parent)) = (&frame.subtree, frame.parent) else {
                break;
            };
            if !subtree.is_extra() {
                count += 1;
            }
            popped.push(subtree.clone());
            head = parent;
        }
        popped.reverse();
        (popped, head)
    }

    /// Wrap the lookahead in an ERROR node, extending an ERROR node that is
    /// already on top.
    fn skip(&mut self, index: usize, token: Subtree) {
        let version = &self.versions[index];
        tracing::debug!(
            position = version.position.bytes,
            symbol = self.language.symbol_name(token.symbol()),
            "recovery: skip"
        );
        let mut head = version.head;
        let mut children = vec![token];
        if let Some(top) = &self.arena.get(head).subtree
            && top.is_error()
            && !top.children().is_empty()
            && let Some(parent) = self.arena.get(head).parent
        {
            let mut merged: Vec<Subtree> = top.children().iter().map(|c| c.tree.clone()).collect();
            merged.append(&mut children);
            children = merged;
            let version = &mut self.versions[index];
            version.error_cost -= top.error_cost();
            version.dynamic_precedence -= top.dynamic_precedence();
            version.position = version.position.saturating_sub(top.total());
            head = parent;
        }
        let state = self.arena.state(head);
        let error = Subtree::error(self.language, children, state);
        self.versions[index].head = head;
        self.shift(index, state, error);
    }

    fn pop_into_error(&mut self, index: usize, depth: usize) {
        let (popped, head) = self.popped(index, depth);
        let removed: Length = popped.iter().fold(Length::ZERO, |acc, s| acc + s.total());
        let own: u32 = popped.iter().map(Subtree::error_cost).sum();
        let dynamic: i32 = popped.iter().map(Subtree::dynamic_precedence).sum();
        let state = self.arena.state(head);
        let error = Subtree::error(self.language, popped, state);

        let version = &mut self.versions[index];
        version.head = head;
        version.position = version.position.saturating_sub(removed);
        version.error_cost -= own;
        version.dynamic_precedence -= dynamic;
        self.shift(index, state, error);
    }
}
