//! Table assembly.

use std::collections::{BTreeSet, HashMap};

use thicket_table::{
    AliasId, AliasInfo, FieldId, KeywordTable, LanguageTable, LexMode, ParseAction, ParseState,
    Production, ProductionStep, SymbolKind, TokenInfo,
};

use crate::flatten::FlatGrammar;
use crate::lalr::Automaton;
use crate::lexer::Lexical;
use crate::prepare::PreparedGrammar;
use crate::resolve::Resolved;
use crate::{GenerateError, Generated, Report};

fn too_large(what: &'static str, count: usize) -> GenerateError {
    GenerateError::TooLarge { what, count }
}

pub(crate) fn emit(
    prepared: &PreparedGrammar,
    flat: &FlatGrammar,
    automaton: &Automaton,
    resolved: Resolved,
    lexical: Lexical,
) -> Result<Generated, GenerateError> {
    let field_names: Vec<String> = flat
        .productions
        .iter()
        .flat_map(|p| p.steps.iter().filter_map(|s| s.field.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if field_names.len() >= u16::MAX as usize {
        return Err(too_large("fields", field_names.len()));
    }
    let field_ids: HashMap<&str, FieldId> = field_names
        .iter()
        .enumerate()
        .filter_map(|(i, name)| Some((name.as_str(), FieldId::new(i as u16 + 1)?)))
        .collect();

    let mut aliases: Vec<AliasInfo> = Vec::new();
    let mut alias_ids: HashMap<(String, bool), AliasId> = HashMap::new();
    let mut productions = Vec::with_capacity(flat.productions.len());
    for production in &flat.productions {
        let mut steps = Vec::with_capacity(production.steps.len());
        for step in &production.steps {
            let alias = match &step.alias {
                Some(key) => Some(match alias_ids.get(key) {
                    Some(&id) => id,
                    None => {
                        let id = AliasId::try_from(aliases.len())
                            .map_err(|_| too_large("aliases", aliases.len()))?;
                        aliases.push(AliasInfo {
                            name: key.0.clone(),
                            named: key.1,
                        });
                        alias_ids.insert(key.clone(), id);
                        id
                    }
                }),
                None => None,
            };
            steps.push(ProductionStep {
                field: step
                    .field
                    .as_deref()
                    .and_then(|name| field_ids.get(name).copied()),
                alias,
            });
        }
        productions.push(Production {
            lhs: production.lhs,
            precedence: production.precedence().0,
            dynamic_precedence: production.dynamic_precedence,
            steps,
        });
    }

    let external_index: HashMap<u16, u16> = flat
        .external_symbols
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i as u16))
        .collect();

    let mut action_lists: Vec<Vec<ParseAction>> = Vec::new();
    let mut action_list_ids: HashMap<Vec<ParseAction>, u32> = HashMap::new();
    let mut lex_modes: Vec<LexMode> = Vec::new();
    let mut lex_mode_ids: HashMap<LexMode, u32> = HashMap::new();
    let mut states = Vec::with_capacity(resolved.states.len());

    for state in resolved.states {
        let mut mode = LexMode::default();
        let mut actions = Vec::with_capacity(state.actions.len());
        for (terminal, list) in state.actions {
            match flat.symbols[terminal as usize].kind {
                SymbolKind::External => {
                    if let Some(&index) = external_index.get(&terminal) {
                        mode.externals.push(index);
                    }
                }
                _ => mode.terminals.push(terminal),
            }
            let next_id = action_lists.len() as u32;
            let id = *action_list_ids.entry(list.clone()).or_insert_with(|| {
                action_lists.push(list);
                next_id
            });
            actions.push((terminal, id));
        }
        mode.externals.sort_unstable();

        let next_mode = lex_modes.len() as u32;
        let lex_mode = *lex_mode_ids.entry(mode.clone()).or_insert_with(|| {
            lex_modes.push(mode);
            next_mode
        });

        states.push(ParseState {
            actions,
            gotos: state.gotos,
            lex_mode,
        });
    }
    if states.len() > u32::MAX as usize {
        return Err(too_large("states", states.len()));
    }

    let tokens: Vec<TokenInfo> = prepared
        .tokens
        .iter()
        .enumerate()
        .map(|(i, token)| TokenInfo {
            symbol: flat.token_symbols[i],
            kind: token.kind,
            source: token.source.clone(),
            precedence: token.precedence,
            immediate: token.immediate,
        })
        .collect();

    let keywords = match prepared.word {
        Some(word) if !lexical.keywords.is_empty() => Some(KeywordTable {
            word: flat.token_symbols[word],
            keywords: lexical
                .keywords
                .iter()
                .map(|(text, index)| (text.clone(), flat.token_symbols[*index]))
                .collect(),
        }),
        _ => None,
    };

    let supertypes = flat
        .symbols
        .iter()
        .enumerate()
        .filter(|(_, s)| s.supertype)
        .map(|(i, _)| i as u16)
        .collect();

    let report = Report {
        state_count: states.len(),
        production_count: productions.len(),
        token_count: tokens.len(),
        conflicts: resolved.conflicts,
    };
    debug_assert_eq!(automaton.states.len(), states.len());

    let table = LanguageTable {
        name: prepared.name.clone(),
        symbols: flat.symbols.clone(),
        field_names,
        aliases,
        productions,
        action_lists,
        states,
        lex_modes,
        start_state: 0,
        start_symbol: flat.start_symbol,
        tokens,
        lexer_dfa: lexical.lexer_dfa,
        separator_dfa: lexical.separator_dfa,
        keywords,
        externals: flat.external_symbols.clone(),
        supertypes,
    };

    Ok(Generated { table, report })
}
