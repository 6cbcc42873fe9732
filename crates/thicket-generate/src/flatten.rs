//! Rules to productions.
//!
//! Choices (and optionals) expand into separate productions. Repetitions
//! become hidden left-recursive helper rules `aux -> aux x | x`, which the
//! runtime splices flat. Fields, aliases and precedence attach to the steps
//! they wrap; dynamic precedence attaches to the production.

use std::collections::HashMap;

use thicket_table::{SymbolId, SymbolInfo, SymbolKind};

use crate::GenerateError;
use crate::GenerateOptions;
use crate::prepare::{Assoc, PreparedGrammar, Sym, Syntax};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FlatStep {
    pub symbol: SymbolId,
    pub field: Option<String>,
    pub alias: Option<(String, bool)>,
    pub precedence: i32,
    pub assoc: Assoc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FlatProduction {
    pub lhs: SymbolId,
    pub steps: Vec<FlatStep>,
    pub dynamic_precedence: i32,
}

impl FlatProduction {
    /// Precedence and associativity used when reducing.
    pub fn precedence(&self) -> (i32, Assoc) {
        self.steps
            .last()
            .map_or((0, Assoc::None), |s| (s.precedence, s.assoc))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FlatGrammar {
    /// Final symbol table: end, ERROR, tokens, externals, variables, helpers.
    pub symbols: Vec<SymbolInfo>,
    pub productions: Vec<FlatProduction>,
    /// Production indices by left-hand side.
    pub by_lhs: Vec<Vec<usize>>,
    pub start_symbol: SymbolId,
    /// Token index to symbol.
    pub token_symbols: Vec<SymbolId>,
    pub external_symbols: Vec<SymbolId>,
    /// Declared conflicts as symbol sets.
    pub conflicts: Vec<Vec<SymbolId>>,
    /// Helper symbol to the rule it was created for.
    pub helper_owner: HashMap<SymbolId, SymbolId>,
}

impl FlatGrammar {
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        self.symbols[symbol as usize].is_terminal()
    }

    pub fn extra_terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| s.extra && s.is_terminal())
            .map(|(i, _)| i as SymbolId)
    }

    /// The rule a symbol belongs to, looking through helper rules.
    pub fn owner(&self, symbol: SymbolId) -> SymbolId {
        self.helper_owner.get(&symbol).copied().unwrap_or(symbol)
    }
}

#[derive(Clone, Debug, Default)]
struct Ctx {
    field: Option<String>,
    alias: Option<(String, bool)>,
    precedence: i32,
    assoc: Assoc,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Alt {
    steps: Vec<FlatStep>,
    dynamic_precedence: i32,
}

pub(crate) fn flatten(
    prepared: &PreparedGrammar,
    options: &GenerateOptions,
) -> Result<FlatGrammar, GenerateError> {
    let mut symbols = vec![
        SymbolInfo {
            name: "end".to_owned(),
            kind: SymbolKind::End,
            named: false,
            visible: false,
            supertype: false,
            extra: false,
        },
        SymbolInfo {
            name: "ERROR".to_owned(),
            kind: SymbolKind::Error,
            named: true,
            visible: true,
            supertype: false,
            extra: false,
        },
    ];

    let mut token_symbols = Vec::with_capacity(prepared.tokens.len());
    for token in &prepared.tokens {
        token_symbols.push(symbols.len() as SymbolId);
        symbols.push(SymbolInfo {
            name: token.name.clone(),
            kind: SymbolKind::Terminal,
            named: token.named,
            visible: token.visible,
            supertype: false,
            extra: token.extra,
        });
    }

    let mut external_symbols = Vec::with_capacity(prepared.externals.len());
    for external in &prepared.externals {
        external_symbols.push(symbols.len() as SymbolId);
        symbols.push(SymbolInfo {
            name: external.name.clone(),
            kind: SymbolKind::External,
            named: external.named,
            visible: external.visible,
            supertype: false,
            extra: external.extra,
        });
    }

    let mut variable_symbols = Vec::with_capacity(prepared.variables.len());
    for variable in &prepared.variables {
        if variable.inline {
            variable_symbols.push(None);
            continue;
        }
        variable_symbols.push(Some(symbols.len() as SymbolId));
        symbols.push(SymbolInfo {
            name: variable.name.clone(),
            kind: SymbolKind::NonTerminal,
            named: true,
            visible: variable.visible,
            supertype: variable.supertype,
            extra: false,
        });
    }

    if symbols.len() > SymbolId::MAX as usize {
        return Err(GenerateError::TooLarge {
            what: "symbols",
            count: symbols.len(),
        });
    }

    let start_symbol = variable_symbols
        .first()
        .copied()
        .flatten()
        .ok_or_else(|| GenerateError::RecursiveInline(prepared.variables[0].name.clone()))?;

    let mut flattener = Flattener {
        prepared,
        options,
        symbols,
        token_symbols,
        external_symbols,
        variable_symbols,
        productions: Vec::new(),
        helper_owner: HashMap::new(),
        helper_counts: HashMap::new(),
    };

    for (index, variable) in prepared.variables.iter().enumerate() {
        let Some(lhs) = flattener.variable_symbols[index] else {
            continue;
        };
        let alts = flattener.rule(&variable.rule, &Ctx::default(), lhs, 0)?;
        for alt in alts {
            flattener.productions.push(FlatProduction {
                lhs,
                steps: alt.steps,
                dynamic_precedence: alt.dynamic_precedence,
            });
        }
    }

    let conflicts = prepared
        .conflicts
        .iter()
        .map(|set| set.iter().filter_map(|&sym| flattener.symbol(sym)).collect())
        .collect();

    let Flattener {
        symbols,
        productions,
        token_symbols,
        external_symbols,
        helper_owner,
        ..
    } = flattener;

    if symbols.len() > SymbolId::MAX as usize {
        return Err(GenerateError::TooLarge {
            what: "symbols",
            count: symbols.len(),
        });
    }

    let mut by_lhs = vec![Vec::new(); symbols.len()];
    for (index, production) in productions.iter().enumerate() {
        by_lhs[production.lhs as usize].push(index);
    }

    Ok(FlatGrammar {
        symbols,
        productions,
        by_lhs,
        start_symbol,
        token_symbols,
        external_symbols,
        conflicts,
        helper_owner,
    })
}

struct Flattener<'p> {
    prepared: &'p PreparedGrammar,
    options: &'p GenerateOptions,
    symbols: Vec<SymbolInfo>,
    token_symbols: Vec<SymbolId>,
    external_symbols: Vec<SymbolId>,
    variable_symbols: Vec<Option<SymbolId>>,
    productions: Vec<FlatProduction>,
    helper_owner: HashMap<SymbolId, SymbolId>,
    helper_counts: HashMap<SymbolId, usize>,
}

impl Flattener<'_> {
    fn symbol(&self, sym: Sym) -> Option<SymbolId> {
        match sym {
            Sym::Token(i) => Some(self.token_symbols[i]),
            Sym::External(i) => Some(self.external_symbols[i]),
            Sym::Variable(i) => self.variable_symbols[i],
        }
    }

    fn step(symbol: SymbolId, ctx: &Ctx) -> FlatStep {
        FlatStep {
            symbol,
            field: ctx.field.clone(),
            alias: ctx.alias.clone(),
            precedence: ctx.precedence,
            assoc: ctx.assoc,
        }
    }

    fn too_many(&self, owner: SymbolId) -> GenerateError {
        GenerateError::TooManyAlternatives(
            self.symbols[owner as usize].name.clone(),
            self.options.max_alternatives,
        )
    }

    fn rule(
        &mut self,
        rule: &Syntax,
        ctx: &Ctx,
        owner: SymbolId,
        depth: u32,
    ) -> Result<Vec<Alt>, GenerateError> {
        Ok(match rule {
            Syntax::Blank => vec![Alt::default()],
            Syntax::Symbol(Sym::Variable(index)) if self.variable_symbols[*index].is_none() => {
                let variable = &self.prepared.variables[*index];
                if depth >= self.options.max_inline_depth {
                    return Err(GenerateError::RecursiveInline(variable.name.clone()));
                }
                self.rule(&variable.rule, ctx, owner, depth + 1)?
            }
            Syntax::Symbol(sym) => match self.symbol(*sym) {
                Some(symbol) => vec![Alt {
                    steps: vec![Self::step(symbol, ctx)],
                    dynamic_precedence: 0,
                }],
                None => vec![Alt::default()],
            },
            Syntax::Seq(members) => {
                let mut acc = vec![Alt::default()];
                for member in members {
                    let tails = self.rule(member, ctx, owner, depth)?;
                    if acc.len().saturating_mul(tails.len()) > self.options.max_alternatives {
                        return Err(self.too_many(owner));
                    }
                    let mut next = Vec::with_capacity(acc.len() * tails.len());
                    for head in &acc {
                        for tail in &tails {
                            let mut steps = head.steps.clone();
                            steps.extend(tail.steps.iter().cloned());
                            next.push(Alt {
                                steps,
                                dynamic_precedence: strongest(
                                    head.dynamic_precedence,
                                    tail.dynamic_precedence,
                                ),
                            });
                        }
                    }
                    acc = next;
                }
                acc
            }
            Syntax::Choice(members) => {
                let mut alts: Vec<Alt> = Vec::new();
                for member in members {
                    for alt in self.rule(member, ctx, owner, depth)? {
                        if !alts.contains(&alt) {
                            alts.push(alt);
                        }
                    }
                    if alts.len() > self.options.max_alternatives {
                        return Err(self.too_many(owner));
                    }
                }
                alts
            }
            Syntax::Repeat(content) => {
                let mut alts = vec![Alt::default()];
                if let Some(helper) = self.repetition(content, ctx, owner, depth)? {
                    alts.insert(0, Alt {
                        steps: vec![Self::helper_step(helper, ctx)],
                        dynamic_precedence: 0,
                    });
                }
                alts
            }
            Syntax::Repeat1(content) => match self.repetition(content, ctx, owner, depth)? {
                Some(helper) => vec![Alt {
                    steps: vec![Self::helper_step(helper, ctx)],
                    dynamic_precedence: 0,
                }],
                None => vec![Alt::default()],
            },
            Syntax::Field { name, content } => {
                let inner = Ctx {
                    field: Some(name.clone()),
                    ..ctx.clone()
                };
                self.rule(content, &inner, owner, depth)?
            }
            Syntax::Alias {
                value,
                named,
                content,
            } => {
                let inner = Ctx {
                    alias: Some((value.clone(), *named)),
                    ..ctx.clone()
                };
                self.rule(content, &inner, owner, depth)?
            }
            Syntax::Prec {
                value,
                assoc,
                content,
            } => {
                let inner = Ctx {
                    precedence: *value,
                    assoc: *assoc,
                    ..ctx.clone()
                };
                self.rule(content, &inner, owner, depth)?
            }
            Syntax::PrecDynamic { value, content } => {
                let mut alts = self.rule(content, ctx, owner, depth)?;
                for alt in &mut alts {
                    alt.dynamic_precedence = strongest(alt.dynamic_precedence, *value);
                }
                alts
            }
        })
    }

    fn helper_step(helper: SymbolId, ctx: &Ctx) -> FlatStep {
        FlatStep {
            symbol: helper,
            field: None,
            alias: None,
            precedence: ctx.precedence,
            assoc: ctx.assoc,
        }
    }

    /// Create `helper -> helper x | x` for the non-empty alternatives of `content`.
    fn repetition(
        &mut self,
        content: &Syntax,
        ctx: &Ctx,
        owner: SymbolId,
        depth: u32,
    ) -> Result<Option<SymbolId>, GenerateError> {
        let alts: Vec<Alt> = self
            .rule(content, ctx, owner, depth)?
            .into_iter()
            .filter(|alt| !alt.steps.is_empty())
            .collect();
        if alts.is_empty() {
            return Ok(None);
        }

        let count = self.helper_counts.entry(owner).or_insert(0);
        *count += 1;
        let helper = self.symbols.len() as SymbolId;
        let name = format!("{}_repeat{count}", self.symbols[owner as usize].name);
        self.symbols.push(SymbolInfo {
            name,
            kind: SymbolKind::Auxiliary,
            named: false,
            visible: false,
            supertype: false,
            extra: false,
        });
        self.helper_owner.insert(helper, owner);

        for alt in alts {
            let mut recursive = vec![Self::helper_step(helper, ctx)];
            recursive.extend(alt.steps.iter().cloned());
            self.productions.push(FlatProduction {
                lhs: helper,
                steps: alt.steps,
                dynamic_precedence: alt.dynamic_precedence,
            });
            self.productions.push(FlatProduction {
                lhs: helper,
                steps: recursive,
                dynamic_precedence: alt.dynamic_precedence,
            });
        }
        Ok(Some(helper))
    }
}

/// The value with the larger magnitude.
fn strongest(a: i32, b: i32) -> i32 {
    if b.unsigned_abs() > a.unsigned_abs() { b } else { a }
}
