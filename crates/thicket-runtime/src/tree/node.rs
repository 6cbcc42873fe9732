use std::borrow::Cow;
use std::fmt;

use thicket_table::{AliasId, FieldId, SymbolId};

use super::subtree::{Child, Subtree};
use super::{Range, Tree, TreeCursor};
use crate::length::{Length, Point};
use crate::source::Source;

/// A visible node of a [`Tree`].
///
/// Hidden rules and repetition helpers are transparent: their children are
/// reported as children of the nearest visible ancestor, and fields attached
/// to a hidden node are inherited by its visible descendants.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    subtree: &'t Subtree,
    /// Absolute start of the subtree's padding.
    offset: Length,
    field: Option<FieldId>,
    alias: Option<AliasId>,
}

impl<'t> Node<'t> {
    pub(crate) fn root(tree: &'t Tree) -> Self {
        Self {
            tree,
            subtree: tree.root(),
            offset: Length::ZERO,
            field: None,
            alias: None,
        }
    }

    pub(crate) fn subtree(&self) -> &'t Subtree {
        self.subtree
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn kind(&self) -> &'t str {
        let table = self.tree.language().table();
        match self.alias {
            Some(alias) => &table.alias(alias).name,
            None => table.symbol_name(self.subtree.symbol()),
        }
    }

    pub fn kind_id(&self) -> SymbolId {
        self.subtree.symbol()
    }

    pub fn alias_id(&self) -> Option<AliasId> {
        self.alias
    }

    pub fn is_named(&self) -> bool {
        match self.alias {
            Some(alias) => self.tree.language().table().alias(alias).named,
            None => self.subtree.named(),
        }
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    /// The node is, or contains, an ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    fn start(&self) -> Length {
        self.offset + self.subtree.padding()
    }

    fn end(&self) -> Length {
        self.start() + self.subtree.size()
    }

    pub fn start_byte(&self) -> usize {
        self.start().bytes as usize
    }

    pub fn end_byte(&self) -> usize {
        self.end().bytes as usize
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_position(&self) -> Point {
        self.start().extent
    }

    pub fn end_position(&self) -> Point {
        self.end().extent
    }

    pub fn range(&self) -> Range {
        Range::from_lengths(self.start(), self.end())
    }

    /// Visible children in order.
    pub fn children(&self) -> std::vec::IntoIter<Node<'t>> {
        let mut out = Vec::new();
        let mut stack: Vec<(std::slice::Iter<'t, Child>, Length, Option<FieldId>)> =
            vec![(self.subtree.children().iter(), self.offset, None)];
        while let Some((children, position, inherited)) = stack.last_mut() {
            let Some(child) = children.next() else {
                stack.pop();
                continue;
            };
            let start = *position;
            *position = start + child.tree.total();
            let field = child.field.or(*inherited);
            if child.is_visible() {
                out.push(Node {
                    tree: self.tree,
                    subtree: &child.tree,
                    offset: start,
                    field,
                    alias: child.alias,
                });
            } else if !child.tree.children().is_empty() {
                stack.push((child.tree.children().iter(), start, field));
            }
        }
        out.into_iter()
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.children().nth(index)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        self.children().filter(|c| c.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'t>> {
        self.named_children().nth(index)
    }

    /// Field this node occupies in its parent.
    pub fn field_name(&self) -> Option<&'t str> {
        let language = self.tree.language();
        self.field.map(|f| language.table().field_name(f))
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.field
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        let field = self.tree.language().field_id(name)?;
        self.child_by_field_id(field)
    }

    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'t>> {
        self.children().find(|c| c.field == Some(field))
    }

    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'t>> {
        match self.tree.language().field_id(name) {
            Some(field) => self.children().filter(|c| c.field == Some(field)).collect(),
            None => Vec::new(),
        }
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'t str> {
        self.child(index)?.field_name()
    }

    /// Found by walking down from the root.
    pub fn parent(&self) -> Option<Node<'t>> {
        let mut stack = vec![self.tree.root_node()];
        while let Some(candidate) = stack.pop() {
            for child in candidate.children() {
                if child == *self {
                    return Some(candidate);
                }
                if child.start_byte() <= self.start_byte()
                    && self.end_byte() <= child.end_byte()
                    && !child.subtree.children().is_empty()
                {
                    stack.push(child);
                }
            }
        }
        None
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let siblings: Vec<_> = self.parent()?.children().collect();
        let index = siblings.iter().position(|s| s == self)?;
        siblings.get(index + 1).copied()
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let siblings: Vec<_> = self.parent()?.children().collect();
        let index = siblings.iter().position(|s| s == self)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_named_sibling(&self) -> Option<Node<'t>> {
        let mut next = self.next_sibling();
        while let Some(node) = next {
            if node.is_named() {
                return Some(node);
            }
            next = node.next_sibling();
        }
        None
    }

    /// Smallest descendant spanning `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'t>> {
        self.descend(start, end, false)
    }

    /// Smallest named descendant spanning `start..end`.
    pub fn named_descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'t>> {
        self.descend(start, end, true)
    }

    fn descend(&self, start: usize, end: usize, named: bool) -> Option<Node<'t>> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        let mut best = (!named || node.is_named()).then_some(node);
        while let Some(child) = node
            .children()
            .find(|c| c.start_byte() <= start && end <= c.end_byte() && c.end_byte() > c.start_byte())
        {
            if !named || child.is_named() {
                best = Some(child);
            }
            node = child;
        }
        best
    }

    /// S-expression of the named structure, with field labels.
    pub fn to_sexp(&self) -> String {
        enum Step<'t> {
            Open { node: Node<'t>, nested: bool },
            Close,
        }

        let mut out = String::new();
        let mut steps = vec![Step::Open {
            node: *self,
            nested: false,
        }];
        while let Some(step) = steps.pop() {
            let (node, nested) = match step {
                Step::Close => {
                    out.push(')');
                    continue;
                }
                Step::Open { node, nested } => (node, nested),
            };
            if nested {
                out.push(' ');
                if let Some(field) = node.field_name() {
                    out.push_str(field);
                    out.push_str(": ");
                }
            }
            if node.is_missing() {
                if node.is_named() {
                    out.push_str(&format!("(MISSING {})", node.kind()));
                } else {
                    out.push_str(&format!("(MISSING {:?})", node.kind()));
                }
                continue;
            }
            out.push('(');
            out.push_str(node.kind());
            steps.push(Step::Close);
            let shown: Vec<_> = node.children().filter(|c| c.is_named() || c.is_missing()).collect();
            steps.extend(shown.into_iter().rev().map(|node| Step::Open { node, nested: true }));
        }
        out
    }

    /// Text of the node, with invalid UTF-8 replaced.
    pub fn utf8_text<'s, S: Source + ?Sized>(&self, source: &'s S) -> Cow<'s, str> {
        match source.slice(self.byte_range()) {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(*self)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.subtree.ptr_eq(other.subtree)
            && self.offset == other.offset
            && self.alias == other.alias
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} ({}) - ({})}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}
