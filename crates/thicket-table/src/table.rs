//! The decoded table body and its lookups.

use std::num::NonZeroU16;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::header::{HEADER_SIZE, Header};

pub type SymbolId = u16;
pub type StateId = u32;
pub type ProductionId = u32;
pub type LexModeId = u32;
pub type AliasId = u16;
pub type ExternalId = u16;
/// Field ids start at 1, so `Option<FieldId>` costs nothing extra.
pub type FieldId = NonZeroU16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// End of input.
    End,
    /// ERROR node kind.
    Error,
    /// Terminal recognized by the lexer automaton.
    Terminal,
    /// Terminal recognized by an external scanner.
    External,
    /// Nonterminal defined by a grammar rule.
    NonTerminal,
    /// Nonterminal introduced by the generator (repetition helpers).
    Auxiliary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub named: bool,
    pub visible: bool,
    pub supertype: bool,
    pub extra: bool,
}

impl SymbolInfo {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::End | SymbolKind::Terminal | SymbolKind::External
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasInfo {
    pub name: String,
    pub named: bool,
}

/// Per-child metadata of a production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStep {
    pub field: Option<FieldId>,
    pub alias: Option<AliasId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub lhs: SymbolId,
    /// Static precedence of the production (the precedence of its last step).
    pub precedence: i32,
    pub dynamic_precedence: i32,
    /// One entry per child; its length is the number of popped entries.
    pub steps: Vec<ProductionStep>,
}

impl Production {
    pub fn child_count(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseAction {
    Shift { state: StateId },
    /// Shift an extra token without changing state.
    ShiftExtra,
    Reduce { production: ProductionId },
    Accept,
}

/// One row of the parse table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    /// `(terminal, action list)` pairs sorted by terminal.
    pub actions: Vec<(SymbolId, u32)>,
    /// `(nonterminal, target state)` pairs sorted by nonterminal.
    pub gotos: Vec<(SymbolId, StateId)>,
    pub lex_mode: LexModeId,
}

/// Terminals the lexer may produce in a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexMode {
    /// Internal terminals, sorted.
    pub terminals: Vec<SymbolId>,
    /// External terminals by external index, sorted.
    pub externals: Vec<ExternalId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A string literal.
    String,
    /// A regular expression.
    Pattern,
}

/// Lexical definition of an internal terminal.
///
/// Token `i` is pattern `i` of the lexer automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: SymbolId,
    pub kind: TokenKind,
    /// Source of the token, for dumps and diagnostics.
    pub source: String,
    pub precedence: i32,
    pub immediate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    /// The word token that stands in for every keyword during lexing.
    pub word: SymbolId,
    /// `(keyword text, terminal)`, sorted by text.
    pub keywords: Vec<(String, SymbolId)>,
}

impl KeywordTable {
    pub fn lookup(&self, text: &[u8]) -> Option<SymbolId> {
        self.keywords
            .binary_search_by(|(k, _)| k.as_bytes().cmp(text))
            .ok()
            .map(|i| self.keywords[i].1)
    }

    pub fn is_keyword(&self, symbol: SymbolId) -> bool {
        self.keywords.iter().any(|&(_, s)| s == symbol)
    }
}

/// Complete grammar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageTable {
    pub name: String,
    /// Symbol 0 is end of input, symbol 1 is ERROR.
    pub symbols: Vec<SymbolInfo>,
    /// Field `id` is `field_names[id - 1]`.
    pub field_names: Vec<String>,
    pub aliases: Vec<AliasInfo>,
    pub productions: Vec<Production>,
    pub action_lists: Vec<Vec<ParseAction>>,
    pub states: Vec<ParseState>,
    pub lex_modes: Vec<LexMode>,
    pub start_state: StateId,
    pub start_symbol: SymbolId,
    pub tokens: Vec<TokenInfo>,
    /// Serialized sparse DFA over all tokens, anchored, one pattern per token.
    pub lexer_dfa: Vec<u8>,
    /// Serialized sparse DFA matching one separator occurrence.
    pub separator_dfa: Option<Vec<u8>>,
    pub keywords: Option<KeywordTable>,
    /// External terminal symbols, by external index.
    pub externals: Vec<SymbolId>,
    pub supertypes: Vec<SymbolId>,
}

const NO_ACTIONS: &[ParseAction] = &[];

impl LanguageTable {
    /// Decode and validate a table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let header = Header::from_bytes(bytes).ok_or(LoadError::FileTooSmall(bytes.len()))?;

        if !header.validate_magic() {
            return Err(LoadError::InvalidMagic);
        }
        if !header.validate_version() {
            return Err(LoadError::UnsupportedVersion(header.version));
        }
        if header.total_size as usize != bytes.len() {
            return Err(LoadError::SizeMismatch {
                header: header.total_size,
                actual: bytes.len(),
            });
        }

        let body = &bytes[HEADER_SIZE..];
        let actual = crc32fast::hash(body);
        if actual != header.checksum {
            return Err(LoadError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let table: LanguageTable = postcard::from_bytes(body)?;
        if table.header_counts()? != counts_of(&header) {
            return Err(LoadError::Inconsistent(
                "header counts disagree with body".to_owned(),
            ));
        }
        table.validate()?;
        Ok(table)
    }

    /// Encode the table with its header.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadError> {
        let body = postcard::to_allocvec(self)?;
        let total = HEADER_SIZE + body.len();
        let total_size = u32::try_from(total).map_err(|_| LoadError::TooLarge(total))?;

        let mut header = Header {
            checksum: crc32fast::hash(&body),
            total_size,
            body_size: total_size - HEADER_SIZE as u32,
            ..Default::default()
        };
        let counts = self.header_counts()?;
        header.symbol_count = counts.0;
        header.field_count = counts.1;
        header.alias_count = counts.2;
        header.token_count = counts.3;
        header.external_count = counts.4;
        header.state_count = counts.5;
        header.production_count = counts.6;
        header.lex_mode_count = counts.7;
        header.action_list_count = counts.8;

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn header_counts(&self) -> Result<Counts, LoadError> {
        fn small(what: &str, n: usize) -> Result<u16, LoadError> {
            u16::try_from(n).map_err(|_| LoadError::Inconsistent(format!("too many {what}: {n}")))
        }
        fn large(what: &str, n: usize) -> Result<u32, LoadError> {
            u32::try_from(n).map_err(|_| LoadError::Inconsistent(format!("too many {what}: {n}")))
        }
        Ok((
            small("symbols", self.symbols.len())?,
            small("fields", self.field_names.len())?,
            small("aliases", self.aliases.len())?,
            small("tokens", self.tokens.len())?,
            small("externals", self.externals.len())?,
            large("states", self.states.len())?,
            large("productions", self.productions.len())?,
            large("lex modes", self.lex_modes.len())?,
            large("action lists", self.action_lists.len())?,
        ))
    }

    /// Check every cross reference so lookups can index without panicking.
    fn validate(&self) -> Result<(), LoadError> {
        let bad = |msg: String| Err(LoadError::Inconsistent(msg));
        let symbol_count = self.symbols.len();
        let state_count = self.states.len();

        if symbol_count < 2
            || self.symbols[0].kind != SymbolKind::End
            || self.symbols[1].kind != SymbolKind::Error
        {
            return bad("symbols 0 and 1 must be end and ERROR".to_owned());
        }
        if self.start_state as usize >= state_count {
            return bad(format!("start state {} out of range", self.start_state));
        }
        if self.start_symbol as usize >= symbol_count {
            return bad(format!("start symbol {} out of range", self.start_symbol));
        }

        for (i, production) in self.productions.iter().enumerate() {
            if production.lhs as usize >= symbol_count {
                return bad(format!("production {i} has unknown lhs"));
            }
            for step in &production.steps {
                if step.field.is_some_and(|f| f.get() as usize > self.field_names.len()) {
                    return bad(format!("production {i} has unknown field"));
                }
                if step.alias.is_some_and(|a| a as usize >= self.aliases.len()) {
                    return bad(format!("production {i} has unknown alias"));
                }
            }
        }

        for (i, list) in self.action_lists.iter().enumerate() {
            for action in list {
                match *action {
                    ParseAction::Shift { state } if state as usize >= state_count => {
                        return bad(format!("action list {i} shifts to unknown state"));
                    }
                    ParseAction::Reduce { production }
                        if production as usize >= self.productions.len() =>
                    {
                        return bad(format!("action list {i} reduces unknown production"));
                    }
                    _ => {}
                }
            }
        }

        for (i, state) in self.states.iter().enumerate() {
            if state.lex_mode as usize >= self.lex_modes.len() {
                return bad(format!("state {i} has unknown lex mode"));
            }
            if !is_sorted_by_key(&state.actions) || !is_sorted_by_key(&state.gotos) {
                return bad(format!("state {i} rows are not sorted"));
            }
            for &(symbol, list) in &state.actions {
                if symbol as usize >= symbol_count || list as usize >= self.action_lists.len() {
                    return bad(format!("state {i} has an out of range action"));
                }
            }
            for &(symbol, target) in &state.gotos {
                if symbol as usize >= symbol_count || target as usize >= state_count {
                    return bad(format!("state {i} has an out of range goto"));
                }
            }
        }

        for (i, mode) in self.lex_modes.iter().enumerate() {
            if mode.terminals.iter().any(|&s| s as usize >= symbol_count)
                || mode.externals.iter().any(|&e| e as usize >= self.externals.len())
            {
                return bad(format!("lex mode {i} refers to unknown terminals"));
            }
        }

        for token in &self.tokens {
            if token.symbol as usize >= symbol_count {
                return bad(format!("token {:?} has unknown symbol", token.source));
            }
        }
        if let Some(keywords) = &self.keywords {
            if keywords.word as usize >= symbol_count
                || keywords.keywords.iter().any(|&(_, s)| s as usize >= symbol_count)
            {
                return bad("keyword table refers to unknown symbols".to_owned());
            }
            if !keywords.keywords.windows(2).all(|w| w[0].0 < w[1].0) {
                return bad("keyword table is not sorted".to_owned());
            }
        }
        if self
            .externals
            .iter()
            .chain(&self.supertypes)
            .any(|&s| s as usize >= symbol_count)
        {
            return bad("external or supertype symbol out of range".to_owned());
        }
        Ok(())
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id as usize]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.symbols[id as usize].name
    }

    /// Find a symbol by kind name and namedness. Prefers visible symbols.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        let mut hidden = None;
        for (id, info) in self.symbols.iter().enumerate() {
            if info.name == name && info.named == named {
                if info.visible {
                    return Some(id as SymbolId);
                }
                hidden.get_or_insert(id as SymbolId);
            }
        }
        hidden
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        &self.field_names[id.get() as usize - 1]
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let index = self.field_names.iter().position(|f| f == name)?;
        FieldId::new(index as u16 + 1)
    }

    pub fn alias(&self, id: AliasId) -> &AliasInfo {
        &self.aliases[id as usize]
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id as usize]
    }

    pub fn state(&self, id: StateId) -> &ParseState {
        &self.states[id as usize]
    }

    /// Actions for `terminal` in `state`; empty means a syntax error.
    pub fn actions(&self, state: StateId, terminal: SymbolId) -> &[ParseAction] {
        let row = &self.states[state as usize].actions;
        match row.binary_search_by_key(&terminal, |&(s, _)| s) {
            Ok(i) => &self.action_lists[row[i].1 as usize],
            Err(_) => NO_ACTIONS,
        }
    }

    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        let row = &self.states[state as usize].gotos;
        row.binary_search_by_key(&nonterminal, |&(s, _)| s)
            .ok()
            .map(|i| row[i].1)
    }

    /// Terminals with at least one action in `state`.
    pub fn expected_terminals(&self, state: StateId) -> impl Iterator<Item = SymbolId> + '_ {
        self.states[state as usize]
            .actions
            .iter()
            .filter(|(_, list)| !self.action_lists[*list as usize].is_empty())
            .map(|&(symbol, _)| symbol)
    }

    pub fn lex_mode(&self, state: StateId) -> LexModeId {
        self.states[state as usize].lex_mode
    }

    pub fn lex_mode_info(&self, id: LexModeId) -> &LexMode {
        &self.lex_modes[id as usize]
    }
}

type Counts = (u16, u16, u16, u16, u16, u32, u32, u32, u32);

fn counts_of(h: &Header) -> Counts {
    (
        h.symbol_count,
        h.field_count,
        h.alias_count,
        h.token_count,
        h.external_count,
        h.state_count,
        h.production_count,
        h.lex_mode_count,
        h.action_list_count,
    )
}

fn is_sorted_by_key<T>(row: &[(SymbolId, T)]) -> bool {
    row.windows(2).all(|w| w[0].0 < w[1].0)
}
