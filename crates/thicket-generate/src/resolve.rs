//! Conflict resolution.
//!
//! Shift/reduce conflicts are settled by static precedence, then by the
//! associativity of the reduced production; reduce/reduce conflicts by
//! precedence. What remains is kept as an ordered action list for the GLR
//! runtime: shift, accept, then reduces by descending precedence and
//! declaration order.

use std::collections::{BTreeMap, BTreeSet};

use thicket_table::{ParseAction, StateId, SymbolId};

use crate::ConflictReport;
use crate::flatten::FlatGrammar;
use crate::lalr::Automaton;
use crate::prepare::Assoc;

#[derive(Clone, Debug, Default)]
pub(crate) struct ResolvedState {
    /// Sorted by terminal.
    pub actions: Vec<(SymbolId, Vec<ParseAction>)>,
    /// Sorted by nonterminal.
    pub gotos: Vec<(SymbolId, StateId)>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Resolved {
    pub states: Vec<ResolvedState>,
    pub conflicts: Vec<ConflictReport>,
}

#[derive(Default)]
struct Candidates {
    shift: Option<StateId>,
    shift_precedence: Option<(i32, i32)>,
    accept: bool,
    reduces: Vec<usize>,
    /// Rules of the items taking part.
    rules: BTreeSet<SymbolId>,
}

pub(crate) fn resolve(grammar: &FlatGrammar, automaton: &Automaton) -> Resolved {
    let mut resolved = Resolved::default();
    let extras: Vec<SymbolId> = grammar.extra_terminals().collect();

    for (state_index, state) in automaton.states.iter().enumerate() {
        let closure = automaton.closure(grammar, &state.kernel);
        let mut table: BTreeMap<SymbolId, Candidates> = BTreeMap::new();
        let mut gotos = Vec::new();

        for (&symbol, &target) in &state.transitions {
            if grammar.is_terminal(symbol) {
                table.entry(symbol).or_default().shift = Some(target as StateId);
            } else {
                gotos.push((symbol, target as StateId));
            }
        }

        for (item, lookahead) in &closure {
            if automaton.is_augmented(*item) {
                if item.dot == 1 {
                    for terminal in lookahead.iter() {
                        table.entry(terminal).or_default().accept = true;
                    }
                }
                continue;
            }
            let production = &grammar.productions[item.production as usize];
            match production.steps.get(item.dot as usize) {
                Some(step) if grammar.is_terminal(step.symbol) => {
                    let entry = table.entry(step.symbol).or_default();
                    entry.shift_precedence = Some(match entry.shift_precedence {
                        Some((lo, hi)) => (lo.min(step.precedence), hi.max(step.precedence)),
                        None => (step.precedence, step.precedence),
                    });
                    entry.rules.insert(grammar.owner(production.lhs));
                }
                Some(_) => {}
                None => {
                    for terminal in lookahead.iter() {
                        let entry = table.entry(terminal).or_default();
                        entry.reduces.push(item.production as usize);
                        entry.rules.insert(grammar.owner(production.lhs));
                    }
                }
            }
        }

        let mut actions = Vec::with_capacity(table.len());
        for (terminal, candidates) in table {
            let list = settle(grammar, &candidates);
            if list.len() > 1 {
                resolved.conflicts.push(report(
                    grammar,
                    state_index as StateId,
                    terminal,
                    &list,
                    &candidates.rules,
                ));
            }
            if !list.is_empty() {
                actions.push((terminal, list));
            }
        }

        for &extra in &extras {
            if let Err(at) = actions.binary_search_by_key(&extra, |(s, _)| *s) {
                actions.insert(at, (extra, vec![ParseAction::ShiftExtra]));
            }
        }

        resolved.states.push(ResolvedState { actions, gotos });
    }
    resolved
}

/// Apply precedence rules and order what survives.
fn settle(grammar: &FlatGrammar, candidates: &Candidates) -> Vec<ParseAction> {
    let mut reduces = candidates.reduces.clone();
    reduces.sort_unstable();
    reduces.dedup();
    let mut shift = candidates.shift;

    if shift.is_some() && !reduces.is_empty() {
        let (low, high) = candidates.shift_precedence.unwrap_or((0, 0));
        let mut prefer_reduce = false;
        reduces.retain(|&p| {
            let (precedence, assoc) = grammar.productions[p].precedence();
            if precedence > high {
                prefer_reduce = true;
                true
            } else if precedence < low {
                false
            } else if low == high {
                match assoc {
                    Assoc::Left => {
                        prefer_reduce = true;
                        true
                    }
                    Assoc::Right => false,
                    Assoc::None => true,
                }
            } else {
                true
            }
        });
        if prefer_reduce {
            shift = None;
        }
    }

    if reduces.len() > 1 {
        let best = reduces
            .iter()
            .map(|&p| grammar.productions[p].precedence().0)
            .max()
            .unwrap_or(0);
        reduces.retain(|&p| grammar.productions[p].precedence().0 == best);
    }
    reduces.sort_by_key(|&p| (std::cmp::Reverse(grammar.productions[p].precedence().0), p));

    let mut list = Vec::with_capacity(reduces.len() + 2);
    if let Some(state) = shift {
        list.push(ParseAction::Shift { state });
    }
    if candidates.accept {
        list.push(ParseAction::Accept);
    }
    list.extend(reduces.into_iter().map(|p| ParseAction::Reduce {
        production: p as u32,
    }));
    list
}

fn report(
    grammar: &FlatGrammar,
    state: StateId,
    terminal: SymbolId,
    list: &[ParseAction],
    rules: &BTreeSet<SymbolId>,
) -> ConflictReport {
    let name = |s: SymbolId| grammar.symbols[s as usize].name.clone();
    let actions = list
        .iter()
        .map(|action| match action {
            ParseAction::Shift { state } => format!("shift {state}"),
            ParseAction::ShiftExtra => "shift-extra".to_owned(),
            ParseAction::Accept => "accept".to_owned(),
            ParseAction::Reduce { production } => {
                let production = &grammar.productions[*production as usize];
                format!(
                    "reduce {} ({} children)",
                    name(production.lhs),
                    production.steps.len()
                )
            }
        })
        .collect();
    let declared = grammar
        .conflicts
        .iter()
        .any(|set| !set.is_empty() && set.iter().all(|s| rules.contains(s)));
    ConflictReport {
        state,
        lookahead: name(terminal),
        actions,
        rules: rules.iter().map(|&s| name(s)).collect(),
        declared,
    }
}
