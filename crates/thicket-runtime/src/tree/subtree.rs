//! Immutable, reference-counted tree storage.
//!
//! Geometry is relative: a subtree knows its `padding` (separators before
//! it) and `size`, never its absolute position. Editing therefore copies only
//! the path from the root to the edited region, and every untouched subtree
//! is shared with the previous tree.

use std::sync::Arc;

use std::fmt;

use thicket_table::{
    AliasId, ERROR_SYMBOL, FieldId, LexModeId, ProductionId, StateId, SymbolId, SymbolKind,
};

use crate::language::Language;
use crate::length::Length;

pub(crate) const ERROR_COST_PER_RECOVERY: u32 = 500;
pub(crate) const ERROR_COST_PER_MISSING_TREE: u32 = 110;
pub(crate) const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
pub(crate) const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
pub(crate) const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;

#[derive(Clone)]
pub(crate) struct Subtree(Arc<SubtreeData>);

#[derive(Clone)]
pub(crate) struct SubtreeData {
    pub symbol: SymbolId,
    pub padding: Length,
    pub size: Length,
    pub lookahead_bytes: u32,
    /// State the subtree was pushed in.
    pub parse_state: StateId,
    /// Lex mode a leaf was lexed in.
    pub lex_mode: LexModeId,
    pub production: Option<ProductionId>,
    pub visible: bool,
    pub named: bool,
    pub extra: bool,
    pub missing: bool,
    /// Built while several parse versions were alive.
    pub fragile: bool,
    pub has_changes: bool,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    /// Symbol and lex mode of the first leaf.
    pub first_leaf: Option<(SymbolId, LexModeId)>,
    pub children: Vec<Child>,
}

/// A child slot: the subtree plus what the parent's production says about it.
#[derive(Clone)]
pub(crate) struct Child {
    pub tree: Subtree,
    pub field: Option<FieldId>,
    pub alias: Option<AliasId>,
}

impl Child {
    pub fn plain(tree: Subtree) -> Self {
        Self {
            tree,
            field: None,
            alias: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.alias.is_some() || self.tree.visible()
    }
}

/// Leaf description handed to [`Subtree::leaf`].
pub(crate) struct LeafSpec {
    pub symbol: SymbolId,
    pub padding: Length,
    pub size: Length,
    pub lookahead_bytes: u32,
    pub parse_state: StateId,
    pub lex_mode: LexModeId,
    pub unrecognized: bool,
}

impl Subtree {
    pub fn leaf(language: &Language, spec: LeafSpec) -> Self {
        let info = language.symbol(spec.symbol);
        Self(Arc::new(SubtreeData {
            symbol: spec.symbol,
            padding: spec.padding,
            size: spec.size,
            lookahead_bytes: spec.lookahead_bytes,
            parse_state: spec.parse_state,
            lex_mode: spec.lex_mode,
            production: None,
            visible: info.visible && !spec.unrecognized,
            named: info.named,
            extra: info.extra,
            missing: false,
            fragile: false,
            has_changes: false,
            error_cost: 0,
            dynamic_precedence: 0,
            first_leaf: Some((spec.symbol, spec.lex_mode)),
            children: Vec::new(),
        }))
    }

    /// Zero-width token inserted by error recovery.
    pub fn missing(language: &Language, symbol: SymbolId, parse_state: StateId) -> Self {
        let info = language.symbol(symbol);
        Self(Arc::new(SubtreeData {
            symbol,
            padding: Length::ZERO,
            size: Length::ZERO,
            lookahead_bytes: 0,
            parse_state,
            lex_mode: 0,
            production: None,
            visible: info.visible,
            named: info.named,
            extra: false,
            missing: true,
            fragile: false,
            has_changes: false,
            error_cost: ERROR_COST_PER_MISSING_TREE,
            dynamic_precedence: 0,
            first_leaf: None,
            children: Vec::new(),
        }))
    }

    /// Interior node over `children`.
    pub fn node(
        language: &Language,
        symbol: SymbolId,
        children: Vec<Child>,
        production: Option<ProductionId>,
        parse_state: StateId,
        fragile: bool,
    ) -> Self {
        let info = language.symbol(symbol);
        let mut total = Length::ZERO;
        let mut reach = 0u32;
        let mut error_cost = 0;
        let mut dynamic_precedence = production
            .map(|p| language.table().production(p).dynamic_precedence)
            .unwrap_or(0);
        let mut fragile = fragile;
        let mut first_leaf = None;
        for child in &children {
            let tree = &child.tree.0;
            total = total + tree.padding + tree.size;
            reach = reach.max(total.bytes + tree.lookahead_bytes);
            error_cost += tree.error_cost;
            dynamic_precedence += tree.dynamic_precedence;
            fragile |= tree.fragile;
            if first_leaf.is_none() {
                first_leaf = tree.first_leaf;
            }
        }
        let padding = children.first().map_or(Length::ZERO, |c| c.tree.0.padding);
        let size = total - padding;

        if symbol == ERROR_SYMBOL {
            let skipped = children.iter().filter(|c| !c.tree.0.extra).count();
            error_cost += error_penalty(size, skipped);
        }

        Self(Arc::new(SubtreeData {
            symbol,
            padding,
            size,
            lookahead_bytes: reach.saturating_sub(total.bytes),
            parse_state,
            lex_mode: 0,
            production,
            visible: info.visible,
            named: info.named,
            extra: symbol == ERROR_SYMBOL,
            missing: false,
            fragile,
            has_changes: false,
            error_cost,
            dynamic_precedence,
            first_leaf,
            children,
        }))
    }

    /// Skipped or popped material, kept in the tree as an ERROR node.
    pub fn error(language: &Language, children: Vec<Subtree>, parse_state: StateId) -> Self {
        let mut children: Vec<Child> = children.into_iter().map(Child::plain).collect();
        Self::flatten_repeats(language, &mut children, None);
        Self::node(language, ERROR_SYMBOL, children, None, parse_state, false)
    }

    /// Error cost of an ERROR node over `children`, without building it.
    pub fn wrapped_error_cost(children: &[Subtree]) -> u32 {
        let own: u32 = children.iter().map(Subtree::error_cost).sum();
        let total = children.iter().fold(Length::ZERO, |acc, c| acc + c.total());
        let padding = children.first().map_or(Length::ZERO, Subtree::padding);
        let skipped = children.iter().filter(|c| !c.is_extra()).count();
        own + error_penalty(total - padding, skipped)
    }

    /// Repetition helpers reduce as `aux -> aux x`, each step holding the
    /// previous one as its first child. Collapse every such chain among
    /// `children` into one node over all the repeated items. A first child
    /// of symbol `keep` is left nested; it is the step being extended.
    pub fn flatten_repeats(language: &Language, children: &mut [Child], keep: Option<SymbolId>) {
        for (index, child) in children.iter_mut().enumerate() {
            if index == 0 && keep == Some(child.tree.symbol()) {
                continue;
            }
            if child.tree.is_nested_repeat(language) {
                child.tree = child.tree.flatten_repeat(language);
            }
        }
    }

    fn is_nested_repeat(&self, language: &Language) -> bool {
        language.table().symbol(self.symbol()).kind == SymbolKind::Auxiliary
            && self
                .children()
                .first()
                .is_some_and(|c| c.tree.symbol() == self.symbol())
    }

    fn flatten_repeat(&self, language: &Language) -> Subtree {
        let symbol = self.symbol();
        let mut steps = Vec::new();
        let mut bottom = self;
        while let Some(first) = bottom.children().first()
            && first.tree.symbol() == symbol
        {
            steps.push(bottom);
            bottom = &first.tree;
        }
        let fragile = bottom.is_fragile() || steps.iter().any(|s| s.is_fragile());
        let mut children = bottom.children().to_vec();
        for step in steps.iter().rev() {
            children.extend(step.children()[1..].iter().cloned());
        }
        Self::node(
            language,
            symbol,
            children,
            self.production(),
            self.parse_state(),
            fragile,
        )
    }

    pub fn data(&self) -> &SubtreeData {
        &self.0
    }

    pub fn make_mut(&mut self) -> &mut SubtreeData {
        Arc::make_mut(&mut self.0)
    }

    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn symbol(&self) -> SymbolId {
        self.0.symbol
    }

    pub fn padding(&self) -> Length {
        self.0.padding
    }

    pub fn size(&self) -> Length {
        self.0.size
    }

    /// Padding plus size.
    pub fn total(&self) -> Length {
        self.0.padding + self.0.size
    }

    pub fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    pub fn children(&self) -> &[Child] {
        &self.0.children
    }

    pub fn is_leaf(&self) -> bool {
        self.0.children.is_empty() && self.0.production.is_none() && self.0.symbol != ERROR_SYMBOL
    }

    pub fn visible(&self) -> bool {
        self.0.visible
    }

    pub fn named(&self) -> bool {
        self.0.named
    }

    pub fn is_extra(&self) -> bool {
        self.0.extra
    }

    pub fn is_missing(&self) -> bool {
        self.0.missing
    }

    pub fn is_error(&self) -> bool {
        self.0.symbol == ERROR_SYMBOL
    }

    pub fn is_fragile(&self) -> bool {
        self.0.fragile
    }

    pub fn has_changes(&self) -> bool {
        self.0.has_changes
    }

    pub fn error_cost(&self) -> u32 {
        self.0.error_cost
    }

    pub fn has_error(&self) -> bool {
        self.0.error_cost > 0
    }

    pub fn dynamic_precedence(&self) -> i32 {
        self.0.dynamic_precedence
    }

    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub fn lex_mode(&self) -> LexModeId {
        self.0.lex_mode
    }

    pub fn first_leaf(&self) -> Option<(SymbolId, LexModeId)> {
        self.0.first_leaf
    }

    pub fn production(&self) -> Option<ProductionId> {
        self.0.production
    }

    pub fn set_extra(&mut self) {
        if !self.0.extra {
            self.make_mut().extra = true;
        }
    }

    pub fn set_parse_state(&mut self, state: StateId) {
        if self.0.parse_state != state {
            self.make_mut().parse_state = state;
        }
    }

    pub fn set_fragile(&mut self) {
        if !self.0.fragile {
            self.make_mut().fragile = true;
        }
    }

    /// Every leaf in order, with its absolute start (padding included).
    pub fn leaves(&self) -> Vec<(usize, &Subtree)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((offset, tree)) = stack.pop() {
            if tree.children().is_empty() {
                out.push((offset, tree));
                continue;
            }
            let mut starts = Vec::with_capacity(tree.children().len());
            let mut position = offset;
            for child in tree.children() {
                starts.push((position, &child.tree));
                position += child.tree.total().bytes as usize;
            }
            stack.extend(starts.into_iter().rev());
        }
        out
    }
}

fn error_penalty(size: Length, skipped_trees: usize) -> u32 {
    ERROR_COST_PER_RECOVERY
        + ERROR_COST_PER_SKIPPED_CHAR * size.bytes
        + ERROR_COST_PER_SKIPPED_LINE * size.extent.row
        + ERROR_COST_PER_SKIPPED_TREE * skipped_trees as u32
}

impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtree")
            .field("symbol", &self.0.symbol)
            .field("padding", &self.0.padding.bytes)
            .field("size", &self.0.size.bytes)
            .field("children", &self.0.children.len())
            .finish()
    }
}

impl Drop for SubtreeData {
    fn drop(&mut self) {
        let mut stack: Vec<Subtree> = self.children.drain(..).map(|c| c.tree).collect();
        while let Some(tree) = stack.pop() {
            if let Ok(mut data) = Arc::try_unwrap(tree.0) {
                stack.extend(data.children.drain(..).map(|c| c.tree));
            }
        }
    }
}
