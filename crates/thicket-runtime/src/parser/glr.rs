use thicket_table::{END_SYMBOL, LexModeId, ParseAction, ProductionId, SymbolKind};

use super::FuelLimits;
use super::reuse::ReuseCursor;
use super::stack::FrameArena;
use crate::language::Language;
use crate::length::Length;
use crate::lexer::Lexer;
use crate::source::Source;
use crate::tree::Tree;
use crate::tree::subtree::{Child, LeafSpec, Subtree};

#[derive(Clone)]
pub(super) enum Status {
    Active,
    /// No action for the lookahead, which is kept for recovery.
    Failed,
    Accepted(Subtree),
}

#[derive(Clone)]
pub(super) struct Version {
    pub head: u32,
    /// End of the text consumed so far.
    pub position: Length,
    pub lookahead: Option<Subtree>,
    pub status: Status,
    /// Sum over the stack's subtrees.
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    /// Reductions since the last shift.
    pub reductions: u32,
    /// Recoveries at `recovery_position`.
    pub recoveries: u32,
    pub recovery_position: u32,
}

impl Version {
    fn is_active(&self) -> bool {
        matches!(self.status, Status::Active)
    }
}

/// State of one parse.
pub(super) struct Run<'a, S: Source + ?Sized> {
    pub language: &'a Language,
    pub lexer: Lexer<'a, S>,
    pub arena: FrameArena,
    pub versions: Vec<Version>,
    pub limits: FuelLimits,
    reuse: Option<ReuseCursor<'a>>,
    /// Last token lexed, shared by versions in the same lex mode.
    token_cache: Option<(u32, LexModeId, Subtree)>,
}

impl<'a, S: Source + ?Sized> Run<'a, S> {
    pub fn new(language: &'a Language, source: &'a S, old: Option<&'a Tree>, limits: FuelLimits) -> Self {
        let mut arena = FrameArena::new();
        let head = arena.bottom(language.table().start_state);
        Self {
            language,
            lexer: Lexer::new(language, source),
            arena,
            versions: vec![Version {
                head,
                position: Length::ZERO,
                lookahead: None,
                status: Status::Active,
                error_cost: 0,
                dynamic_precedence: 0,
                reductions: 0,
                recoveries: 0,
                recovery_position: 0,
            }],
            limits,
            reuse: old.map(|tree| ReuseCursor::new(tree.root())),
            token_cache: None,
        }
    }

    /// Advance the least advanced active version by one action. Returns the
    /// tree once no version is left to advance.
    pub fn step(&mut self) -> Option<Tree> {
        let next = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .min_by_key(|(i, v)| (v.position.bytes, *i))
            .map(|(i, _)| i);

        match next {
            Some(index) => self.advance(index),
            None => {
                if let Some(tree) = self.finish() {
                    return Some(tree);
                }
                self.recover_best();
            }
        }
        self.condense();
        None
    }

    fn active_count(&self) -> usize {
        self.versions.iter().filter(|v| v.is_active()).count()
    }

    fn top_state(&self, index: usize) -> u32 {
        self.arena.state(self.versions[index].head)
    }

    fn advance(&mut self, index: usize) {
        let state = self.top_state(index);
        let token = match self.versions[index].lookahead.take() {
            Some(token) => token,
            None => self.next_token(index),
        };

        if !self.language.symbol(token.symbol()).is_terminal() && !token.is_error() {
            self.push_reused(index, token);
            return;
        }

        let actions = self.language.table().actions(state, token.symbol());
        let Some((&first, rest)) = actions.split_first() else {
            let version = &mut self.versions[index];
            tracing::trace!(
                state,
                symbol = self.language.symbol_name(token.symbol()),
                position = version.position.bytes,
                "no action"
            );
            version.lookahead = Some(token);
            version.status = Status::Failed;
            return;
        };

        for &action in rest {
            if self.versions.len() >= self.limits.max_versions * 2 {
                break;
            }
            let mut fork = self.versions[index].clone();
            fork.lookahead = None;
            self.versions.push(fork);
            let fork = self.versions.len() - 1;
            self.apply(fork, action, token.clone());
        }
        self.apply(index, first, token);
    }

    fn next_token(&mut self, index: usize) -> Subtree {
        let state = self.top_state(index);
        let position = self.versions[index].position;

        if self.active_count() == 1
            && let Some(reuse) = &mut self.reuse
            && let Some(tree) = reuse.reusable(self.language, position.bytes, state)
        {
            tracing::trace!(
                symbol = self.language.symbol_name(tree.symbol()),
                position = position.bytes,
                "reused subtree"
            );
            return tree;
        }

        let lex_mode = self.language.lex_mode_id(state);
        if let Some((cached_at, cached_mode, token)) = &self.token_cache
            && *cached_at == position.bytes
            && *cached_mode == lex_mode
        {
            return token.clone();
        }
        let token = self.lex(position, state);
        self.token_cache = Some((position.bytes, lex_mode, token.clone()));
        token
    }

    pub(super) fn lex(&self, position: Length, state: u32) -> Subtree {
        let lexeme = self.lexer.lex(position, state);
        Subtree::leaf(
            self.language,
            LeafSpec {
                symbol: lexeme.symbol,
                padding: lexeme.padding,
                size: lexeme.size,
                lookahead_bytes: lexeme.lookahead_bytes,
                parse_state: state,
                lex_mode: lexeme.lex_mode,
                unrecognized: lexeme.unrecognized,
            },
        )
    }

    fn apply(&mut self, index: usize, action: ParseAction, mut token: Subtree) {
        let state = self.top_state(index);
        match action {
            ParseAction::Shift { state: next } => {
                token.set_parse_state(state);
                if self.active_count() > 1 {
                    token.set_fragile();
                }
                self.shift(index, next, token);
            }
            ParseAction::ShiftExtra => {
                token.set_parse_state(state);
                token.set_extra();
                self.shift(index, state, token);
            }
            ParseAction::Reduce { production } => {
                self.versions[index].lookahead = Some(token);
                self.reduce(index, production);
            }
            ParseAction::Accept => self.accept(index, token),
        }
    }

    pub(super) fn shift(&mut self, index: usize, state: u32, token: Subtree) {
        let version = &mut self.versions[index];
        version.position = version.position + token.total();
        version.error_cost += token.error_cost();
        version.dynamic_precedence += token.dynamic_precedence();
        version.reductions = 0;
        version.head = self.arena.push(version.head, state, token);
    }

    fn push_reused(&mut self, index: usize, tree: Subtree) {
        let state = self.top_state(index);
        match self.language.table().goto(state, tree.symbol()) {
            Some(next) => self.shift(index, next, tree),
            None => {
                // the reuse cursor checked the goto; lex normally if it ever fails
                self.reuse = None;
            }
        }
    }

    fn reduce(&mut self, index: usize, production_id: ProductionId) {
        let table = self.language.table();
        let production = table.production(production_id);
        let count = production.child_count();
        let mut head = self.versions[index].head;

        let mut trailing = Vec::new();
        if count > 0 {
            while let Some(subtree) = &self.arena.get(head).subtree
                && subtree.is_extra()
            {
                trailing.push(subtree.clone());
                head = self.arena.get(head).parent.unwrap_or(head);
            }
        }

        let mut children = Vec::with_capacity(count);
        let mut taken = 0;
        while taken < count {
            let frame = self.arena.get(head);
            let (Some(subtree), Some(parent)) = (frame.subtree.clone(), frame.parent) else {
                break;
            };
            head = parent;
            if subtree.is_extra() {
                children.push(Child::plain(subtree));
            } else {
                taken += 1;
                let step = production.steps[count - taken];
                children.push(Child {
                    tree: subtree,
                    field: step.field,
                    alias: step.alias,
                });
            }
        }
        children.reverse();

        let lhs = production.lhs;
        let extending = (table.symbol(lhs).kind == SymbolKind::Auxiliary).then_some(lhs);
        Subtree::flatten_repeats(self.language, &mut children, extending);

        let below = self.arena.state(head);
        let fragile = self.active_count() > 1;
        let node = Subtree::node(self.language, lhs, children, Some(production_id), below, fragile);

        let Some(next) = table.goto(below, lhs) else {
            self.versions[index].status = Status::Failed;
            return;
        };

        let version = &mut self.versions[index];
        version.dynamic_precedence += production.dynamic_precedence;
        version.reductions += 1;
        version.head = self.arena.push(head, next, node);
        for extra in trailing.into_iter().rev() {
            version.head = self.arena.push(version.head, next, extra);
        }
        if version.reductions > self.limits.reduction_fuel {
            tracing::debug!(position = version.position.bytes, "reduction fuel exhausted");
            version.status = Status::Failed;
        }
    }

    /// The stack holds leading extras, the start symbol and trailing extras;
    /// the root adopts the start node's children in their place.
    fn accept(&mut self, index: usize, eof: Subtree) {
        let table = self.language.table();
        let head = self.versions[index].head;
        let mut children = Vec::new();
        let mut production = None;
        for subtree in self.arena.subtrees(head) {
            if subtree.symbol() == table.start_symbol && !subtree.is_extra() && production.is_none() {
                production = subtree.production();
                children.extend(subtree.children().iter().cloned());
            } else {
                children.push(Child::plain(subtree));
            }
        }
        children.push(Child::plain(eof));
        let root = Subtree::node(
            self.language,
            table.start_symbol,
            children,
            production,
            table.start_state,
            false,
        );
        self.versions[index].status = Status::Accepted(root);
    }

    /// Wrap everything on the stack in one ERROR node under a start-symbol root.
    pub(super) fn accept_everything(&mut self, index: usize, eof: Subtree) {
        let table = self.language.table();
        let head = self.versions[index].head;
        let error = Subtree::error(self.language, self.arena.subtrees(head), table.start_state);
        let root = Subtree::node(
            self.language,
            table.start_symbol,
            vec![Child::plain(error), Child::plain(eof)],
            None,
            table.start_state,
            false,
        );
        let version = &mut self.versions[index];
        version.error_cost = root.error_cost();
        version.status = Status::Accepted(root);
    }

    /// Drop failed versions others have overtaken, merge equivalent versions
    /// and enforce the version limit.
    fn condense(&mut self) {
        let accepted = self
            .versions
            .iter()
            .any(|v| matches!(v.status, Status::Accepted(_)));
        let frontier = self
            .versions
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.position.bytes)
            .max();
        self.versions.retain(|v| match v.status {
            Status::Failed => !accepted && frontier.is_none_or(|f| f < v.position.bytes),
            _ => true,
        });

        let mut i = 0;
        while i < self.versions.len() {
            let mut j = i + 1;
            while j < self.versions.len() {
                if self.mergeable(i, j) {
                    if self.prefer(j, i) {
                        self.versions.swap(i, j);
                    }
                    self.versions.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        while self.active_count() > self.limits.max_versions {
            let worst = self
                .versions
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_active())
                .max_by_key(|(i, v)| (v.error_cost, -v.dynamic_precedence, *i))
                .map(|(i, _)| i);
            match worst {
                Some(index) => {
                    self.versions.remove(index);
                }
                None => break,
            }
        }
    }

    fn mergeable(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.versions[i], &self.versions[j]);
        a.is_active()
            && b.is_active()
            && a.position == b.position
            && a.lookahead.is_none()
            && b.lookahead.is_none()
            && self.arena.same_states(a.head, b.head)
    }

    /// Whether version `a` beats version `b`.
    fn prefer(&self, a: usize, b: usize) -> bool {
        let (x, y) = (&self.versions[a], &self.versions[b]);
        (x.error_cost, -x.dynamic_precedence, a) < (y.error_cost, -y.dynamic_precedence, b)
    }

    fn finish(&mut self) -> Option<Tree> {
        let (_, root) = self
            .versions
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match &v.status {
                Status::Accepted(root) => Some((i, root)),
                _ => None,
            })
            .min_by_key(|(i, root)| (root.error_cost(), -root.dynamic_precedence(), *i))?;
        tracing::debug!(
            language = self.language.name(),
            bytes = root.total().bytes,
            frames = self.arena.len(),
            error_cost = root.error_cost(),
            "parse finished"
        );
        Some(Tree::new(root.clone(), self.language.clone()))
    }

    /// Repair the most advanced failed version and drop the rest.
    fn recover_best(&mut self) {
        let best = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| matches!(v.status, Status::Failed))
            .min_by_key(|(i, v)| {
                (
                    std::cmp::Reverse(v.position.bytes),
                    v.error_cost,
                    -v.dynamic_precedence,
                    *i,
                )
            })
            .map(|(i, _)| i);
        let Some(best) = best else {
            return;
        };
        let version = self.versions.swap_remove(best);
        self.versions.clear();
        self.versions.push(version);
        self.recover(0);
    }

    pub(super) fn is_end(token: &Subtree) -> bool {
        token.symbol() == END_SYMBOL && token.is_leaf()
    }
}
