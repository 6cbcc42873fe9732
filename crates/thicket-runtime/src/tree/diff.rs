use std::collections::HashMap;

use thicket_table::{AliasId, SymbolId};

use super::{Node, Range, Tree};
use crate::length::Length;

/// What makes two visible nodes interchangeable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    start: u32,
    end: u32,
    symbol: SymbolId,
    alias: Option<AliasId>,
    missing: bool,
    depth: u32,
}

pub(super) fn changed_ranges(old: &Tree, new: &Tree) -> Vec<Range> {
    let mut counts: HashMap<NodeKey, (i64, Length, Length)> = HashMap::new();
    let mut count = |node: Node<'_>, depth: u32, delta: i64| {
        let (start, end) = bounds(&node);
        counts.entry(key(&node, depth)).or_insert((0, start, end)).0 += delta;
    };

    // Both walks run in document order. A subtree the new tree took over
    // from the old one at the same place is skipped on both sides.
    let mut old_walk = Walk::new(old);
    let mut new_walk = Walk::new(new);
    loop {
        match (old_walk.peek(), new_walk.peek()) {
            (None, None) => break,
            (Some(_), None) => {
                if let Some((node, depth)) = old_walk.descend() {
                    count(node, depth, 1);
                }
            }
            (None, Some(_)) => {
                if let Some((node, depth)) = new_walk.descend() {
                    count(node, depth, -1);
                }
            }
            (Some(a), Some(b)) if shared(&a, &b) => {
                old_walk.skip();
                new_walk.skip();
            }
            (Some(a), Some(b)) => {
                let order = walk_order(&a).cmp(&walk_order(&b));
                if order.is_le()
                    && let Some((node, depth)) = old_walk.descend()
                {
                    count(node, depth, 1);
                }
                if order.is_ge()
                    && let Some((node, depth)) = new_walk.descend()
                {
                    count(node, depth, -1);
                }
            }
        }
    }

    let mut spans: Vec<(Length, Length)> = counts
        .into_values()
        .filter(|(count, _, _)| *count != 0)
        .map(|(_, start, end)| (start, end))
        .chain(old.edited_ranges().iter().copied())
        .collect();
    spans.sort_by_key(|(start, end)| (start.bytes, end.bytes));

    let mut merged: Vec<(Length, Length)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        if let Some(last) = merged.last_mut()
            && start.bytes <= last.1.bytes
        {
            if end.bytes > last.1.bytes {
                last.1 = end;
            }
            continue;
        }
        merged.push((start, end));
    }

    merged
        .into_iter()
        .map(|(start, end)| Range::from_lengths(start, end))
        .collect()
}

fn key(node: &Node<'_>, depth: u32) -> NodeKey {
    NodeKey {
        start: node.start_byte() as u32,
        end: node.end_byte() as u32,
        symbol: node.kind_id(),
        alias: node.alias_id(),
        missing: node.is_missing(),
        depth,
    }
}

fn bounds(node: &Node<'_>) -> (Length, Length) {
    let range = node.range();
    (
        Length::new(range.start_byte as u32, range.start_point),
        Length::new(range.end_byte as u32, range.end_point),
    )
}

fn shared(a: &Node<'_>, b: &Node<'_>) -> bool {
    a.subtree().ptr_eq(b.subtree()) && a.start_byte() == b.start_byte() && a.alias_id() == b.alias_id()
}

/// Outer nodes first among nodes starting at the same byte.
fn walk_order(node: &Node<'_>) -> (usize, std::cmp::Reverse<usize>) {
    (node.start_byte(), std::cmp::Reverse(node.end_byte()))
}

/// Pre-order walk over visible nodes, with their depth.
struct Walk<'t> {
    stack: Vec<(Node<'t>, u32)>,
}

impl<'t> Walk<'t> {
    fn new(tree: &'t Tree) -> Self {
        Self {
            stack: vec![(tree.root_node(), 0)],
        }
    }

    fn peek(&self) -> Option<Node<'t>> {
        self.stack.last().map(|(node, _)| *node)
    }

    /// Drop the next node together with its descendants.
    fn skip(&mut self) {
        self.stack.pop();
    }

    /// Take the next node and queue its children.
    fn descend(&mut self) -> Option<(Node<'t>, u32)> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}
