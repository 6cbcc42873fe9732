//! LALR(1) automaton construction.
//!
//! States are identified by their kernel core (items without lookaheads).
//! Reaching an existing core merges lookaheads into it; a state whose
//! lookaheads grew is processed again until nothing changes.

use std::collections::{BTreeMap, HashMap, VecDeque};

use thicket_table::{END_SYMBOL, SymbolId};

use crate::flatten::FlatGrammar;
use crate::token_set::TokenSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Item {
    pub production: u32,
    pub dot: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct LrState {
    pub kernel: Vec<(Item, TokenSet)>,
    /// Successor states by symbol.
    pub transitions: BTreeMap<SymbolId, usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct Automaton {
    pub states: Vec<LrState>,
    /// Index of the augmented production `start' -> start`.
    pub augmented: u32,
    first: Vec<TokenSet>,
    nullable: Vec<bool>,
}

/// Production view including the augmented production.
struct Productions<'g> {
    grammar: &'g FlatGrammar,
    augmented: u32,
}

impl Productions<'_> {
    fn symbol_at(&self, item: Item) -> Option<SymbolId> {
        if item.production == self.augmented {
            return (item.dot == 0).then_some(self.grammar.start_symbol);
        }
        self.grammar.productions[item.production as usize]
            .steps
            .get(item.dot as usize)
            .map(|s| s.symbol)
    }

    fn rest_after_next(&self, item: Item) -> &[crate::flatten::FlatStep] {
        if item.production == self.augmented {
            return &[];
        }
        let steps = &self.grammar.productions[item.production as usize].steps;
        &steps[(item.dot as usize + 1).min(steps.len())..]
    }
}

pub(crate) fn build(grammar: &FlatGrammar) -> Automaton {
    let augmented = grammar.productions.len() as u32;
    let (first, nullable) = first_sets(grammar);
    let mut automaton = Automaton {
        states: Vec::new(),
        augmented,
        first,
        nullable,
    };

    let mut start_lookahead = TokenSet::new();
    start_lookahead.insert(END_SYMBOL);
    let start_item = Item {
        production: augmented,
        dot: 0,
    };
    automaton.states.push(LrState {
        kernel: vec![(start_item, start_lookahead)],
        transitions: BTreeMap::new(),
    });

    let mut cores: HashMap<Vec<Item>, usize> = HashMap::new();
    cores.insert(vec![start_item], 0);
    let mut queue = VecDeque::from([0usize]);
    let mut queued = vec![true];

    while let Some(state) = queue.pop_front() {
        queued[state] = false;
        let closure = automaton.closure(grammar, &automaton.states[state].kernel);

        let mut successors: BTreeMap<SymbolId, Vec<(Item, TokenSet)>> = BTreeMap::new();
        let view = Productions {
            grammar,
            augmented,
        };
        for (item, lookahead) in closure {
            if let Some(symbol) = view.symbol_at(item) {
                let advanced = Item {
                    production: item.production,
                    dot: item.dot + 1,
                };
                let kernel = successors.entry(symbol).or_default();
                match kernel.iter_mut().find(|(i, _)| *i == advanced) {
                    Some((_, existing)) => {
                        existing.union_with(&lookahead);
                    }
                    None => kernel.push((advanced, lookahead)),
                }
            }
        }

        for (symbol, mut kernel) in successors {
            kernel.sort_by_key(|(item, _)| *item);
            let core: Vec<Item> = kernel.iter().map(|(item, _)| *item).collect();
            let target = match cores.get(&core) {
                Some(&target) => {
                    let mut changed = false;
                    let existing = &mut automaton.states[target].kernel;
                    for ((_, mine), (_, new)) in existing.iter_mut().zip(&kernel) {
                        changed |= mine.union_with(new);
                    }
                    if changed && !queued[target] {
                        queued[target] = true;
                        queue.push_back(target);
                    }
                    target
                }
                None => {
                    let target = automaton.states.len();
                    automaton.states.push(LrState {
                        kernel,
                        transitions: BTreeMap::new(),
                    });
                    cores.insert(core, target);
                    queued.push(true);
                    queue.push_back(target);
                    target
                }
            };
            automaton.states[state].transitions.insert(symbol, target);
        }
    }

    tracing::trace!(states = automaton.states.len(), "built LALR(1) automaton");
    automaton
}

impl Automaton {
    /// Closure of a kernel with lookaheads.
    pub fn closure(&self, grammar: &FlatGrammar, kernel: &[(Item, TokenSet)]) -> Vec<(Item, TokenSet)> {
        let view = Productions {
            grammar,
            augmented: self.augmented,
        };
        let mut items: Vec<(Item, TokenSet)> = kernel.to_vec();
        let mut index: HashMap<Item, usize> = items
            .iter()
            .enumerate()
            .map(|(i, (item, _))| (*item, i))
            .collect();
        let mut pending: Vec<usize> = (0..items.len()).rev().collect();

        while let Some(i) = pending.pop() {
            let item = items[i].0;
            let Some(next) = view.symbol_at(item) else {
                continue;
            };
            if grammar.is_terminal(next) {
                continue;
            }

            let mut follow = TokenSet::new();
            let mut rest_nullable = true;
            for step in view.rest_after_next(item) {
                follow.union_with(&self.first[step.symbol as usize]);
                if !self.nullable[step.symbol as usize] {
                    rest_nullable = false;
                    break;
                }
            }
            if rest_nullable {
                let lookahead = items[i].1.clone();
                follow.union_with(&lookahead);
            }

            for &production in &grammar.by_lhs[next as usize] {
                let derived = Item {
                    production: production as u32,
                    dot: 0,
                };
                match index.get(&derived) {
                    Some(&j) => {
                        if items[j].1.union_with(&follow) {
                            pending.push(j);
                        }
                    }
                    None => {
                        index.insert(derived, items.len());
                        pending.push(items.len());
                        items.push((derived, follow.clone()));
                    }
                }
            }
        }
        items
    }

    pub fn is_augmented(&self, item: Item) -> bool {
        item.production == self.augmented
    }
}

/// FIRST sets and nullability for every symbol.
fn first_sets(grammar: &FlatGrammar) -> (Vec<TokenSet>, Vec<bool>) {
    let count = grammar.symbols.len();
    let mut first = vec![TokenSet::new(); count];
    let mut nullable = vec![false; count];
    for symbol in 0..count {
        if grammar.is_terminal(symbol as SymbolId) {
            first[symbol].insert(symbol as SymbolId);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for production in &grammar.productions {
            let lhs = production.lhs as usize;
            let mut all_nullable = true;
            for step in &production.steps {
                let symbol = step.symbol as usize;
                if symbol != lhs {
                    let step_first = first[symbol].clone();
                    changed |= first[lhs].union_with(&step_first);
                }
                if !nullable[symbol] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}
