//! Pattern matching and the lazy match iterator.
//!
//! Matching backtracks over sibling lists: a child item may skip any number
//! of siblings unless an anchor forbids skipping named ones. Every way a
//! pattern can match a node is enumerated (up to a bound) so that predicates
//! can reject one assignment of captures and accept another.

use std::ops::Range;

use super::parser::{Expr, ExprKind, Item, NodePattern, NodeTest, Pattern, Quantifier};
use super::{Query, QueryCapture, QueryMatch};
use crate::source::Source;
use crate::tree::Node;

/// Alternative capture assignments kept per subpattern.
const MAX_ALTERNATIVES: usize = 64;
/// Matching steps allowed per node and pattern.
const MATCH_FUEL: u32 = 100_000;

type Bindings<'t> = Vec<QueryCapture<'t>>;

/// Runs queries. Holds only configuration; each call to [`matches`]
/// starts a fresh traversal.
///
/// [`matches`]: QueryCursor::matches
#[derive(Clone, Debug, Default)]
pub struct QueryCursor {
    byte_range: Option<Range<usize>>,
}

impl QueryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only visit nodes intersecting `range`.
    pub fn set_byte_range(&mut self, range: Range<usize>) -> &mut Self {
        self.byte_range = Some(range);
        self
    }

    /// Matches of `query` in the subtree of `node`, in pre-order and, per
    /// node, in pattern order. Each pattern matches a node at most once.
    pub fn matches<'q, 't, 's, S: Source + ?Sized>(
        &self,
        query: &'q Query,
        node: Node<'t>,
        source: &'s S,
    ) -> QueryMatches<'q, 't, 's, S> {
        QueryMatches {
            query,
            source,
            range: self.byte_range.clone(),
            stack: vec![node],
            current: None,
            next_pattern: 0,
        }
    }
}

/// Iterator returned by [`QueryCursor::matches`].
pub struct QueryMatches<'q, 't, 's, S: Source + ?Sized> {
    query: &'q Query,
    source: &'s S,
    range: Option<Range<usize>>,
    /// Nodes still to visit, next on top.
    stack: Vec<Node<'t>>,
    current: Option<Node<'t>>,
    next_pattern: usize,
}

impl<'t, S: Source + ?Sized> QueryMatches<'_, 't, '_, S> {
    fn in_range(&self, node: &Node<'t>) -> bool {
        match &self.range {
            None => true,
            Some(range) => {
                let (start, end) = (node.start_byte(), node.end_byte());
                (start < range.end && range.start < end) || (start == end && range.contains(&start))
            }
        }
    }
}

impl<'t, S: Source + ?Sized> Iterator for QueryMatches<'_, 't, '_, S> {
    type Item = QueryMatch<'t>;

    fn next(&mut self) -> Option<QueryMatch<'t>> {
        loop {
            let node = match self.current {
                Some(node) => node,
                None => {
                    let node = self.stack.pop()?;
                    let children: Vec<_> = node.children().filter(|c| self.in_range(c)).collect();
                    self.stack.extend(children.into_iter().rev());
                    self.current = Some(node);
                    self.next_pattern = 0;
                    node
                }
            };

            let patterns = self.query.patterns();
            while self.next_pattern < patterns.len() {
                let index = self.next_pattern;
                self.next_pattern += 1;
                if let Some(captures) = first_match(&patterns[index], node, self.source) {
                    return Some(QueryMatch {
                        pattern_index: index,
                        captures,
                    });
                }
            }
            self.current = None;
        }
    }
}

fn first_match<'t, S: Source + ?Sized>(pattern: &Pattern, node: Node<'t>, source: &S) -> Option<Bindings<'t>> {
    let mut matcher = Matcher { fuel: MATCH_FUEL };
    matcher
        .expr(&pattern.expr, node)
        .into_iter()
        .find(|bindings| pattern.predicates.iter().all(|p| p.holds(bindings, source)))
}

fn test(test: &NodeTest, node: &Node<'_>) -> bool {
    match test {
        NodeTest::Any => true,
        NodeTest::AnyNamed => node.is_named(),
        NodeTest::Kind { name, named } => node.kind() == name && node.is_named() == *named,
        NodeTest::Missing(None) => node.is_missing(),
        NodeTest::Missing(Some((name, named))) => {
            node.is_missing() && node.kind() == name && node.is_named() == *named
        }
    }
}

/// Positions the next item may match at.
fn candidates(children: &[Node<'_>], pos: usize, anchored: bool) -> Vec<usize> {
    if !anchored {
        return (pos..children.len()).collect();
    }
    let mut out = Vec::new();
    for (i, child) in children.iter().enumerate().skip(pos) {
        out.push(i);
        if child.is_named() {
            break;
        }
    }
    out
}

/// Backtracking matcher with a bound on total work per attempt.
struct Matcher {
    fuel: u32,
}

impl Matcher {
    fn burn(&mut self) -> bool {
        if self.fuel == 0 {
            return false;
        }
        self.fuel -= 1;
        true
    }

    fn expr<'t>(&mut self, expr: &Expr, node: Node<'t>) -> Vec<Bindings<'t>> {
        if !self.burn() {
            return Vec::new();
        }
        let mut out = match &expr.kind {
            ExprKind::Node(pattern) => self.node(pattern, node),
            ExprKind::Alternation(alternatives) => {
                let mut out = Vec::new();
                for alternative in alternatives {
                    out.extend(self.expr(alternative, node));
                    if out.len() >= MAX_ALTERNATIVES {
                        break;
                    }
                }
                out
            }
        };
        out.truncate(MAX_ALTERNATIVES);
        if !expr.captures.is_empty() {
            for bindings in &mut out {
                let own = expr.captures.iter().map(|&index| QueryCapture { node, index });
                bindings.splice(0..0, own);
            }
        }
        out
    }

    fn node<'t>(&mut self, pattern: &NodePattern, node: Node<'t>) -> Vec<Bindings<'t>> {
        if !test(&pattern.test, &node) {
            return Vec::new();
        }
        if pattern
            .negated_fields
            .iter()
            .any(|&field| node.child_by_field_id(field).is_some())
        {
            return Vec::new();
        }
        if pattern.items.is_empty() {
            return vec![Vec::new()];
        }
        let children: Vec<Node<'t>> = node.children().collect();
        self.items(&pattern.items, &children, 0, false)
    }

    /// Ways `items` match `children[pos..]`. With `anchored`, no named child
    /// may be skipped before the next item (or before the end).
    fn items<'t>(&mut self, items: &[Item], children: &[Node<'t>], pos: usize, anchored: bool) -> Vec<Bindings<'t>> {
        let Some((first, rest)) = items.split_first() else {
            if anchored && children[pos..].iter().any(|c| c.is_named()) {
                return Vec::new();
            }
            return vec![Vec::new()];
        };
        match first {
            Item::Anchor => self.items(rest, children, pos, true),
            Item::Child { quantifier, .. } => {
                let (min, max) = match quantifier {
                    Quantifier::One => (1, 1),
                    Quantifier::ZeroOrOne => (0, 1),
                    Quantifier::ZeroOrMore => (0, usize::MAX),
                    Quantifier::OneOrMore => (1, usize::MAX),
                };
                self.repeat(first, rest, children, pos, anchored, (min, max))
            }
        }
    }

    /// Greedy: more repetitions are tried first.
    fn repeat<'t>(
        &mut self,
        item: &Item,
        rest: &[Item],
        children: &[Node<'t>],
        pos: usize,
        anchored: bool,
        (min, max): (usize, usize),
    ) -> Vec<Bindings<'t>> {
        let Item::Child { field, expr, .. } = item else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if max > 0 {
            for i in candidates(children, pos, anchored) {
                if !self.burn() {
                    return out;
                }
                let child = children[i];
                if field.is_some() && child.field_id() != *field {
                    continue;
                }
                let heads = self.expr(expr, child);
                if heads.is_empty() {
                    continue;
                }
                let tails = self.repeat(item, rest, children, i + 1, false, (min.saturating_sub(1), max - 1));
                for head in &heads {
                    for tail in &tails {
                        let mut bindings = head.clone();
                        bindings.extend(tail.iter().copied());
                        out.push(bindings);
                        if out.len() >= MAX_ALTERNATIVES {
                            return out;
                        }
                    }
                }
            }
        }
        if min == 0 {
            out.extend(self.items(rest, children, pos, anchored));
            out.truncate(MAX_ALTERNATIVES);
        }
        out
    }
}
