//! A loaded grammar table, ready to drive the lexer and parser.

use std::fmt;
use std::sync::Arc;

use regex_automata::dfa::sparse;
use thicket_table::{
    FieldId, LanguageTable, LoadError, StateId, SymbolId, SymbolInfo, deserialize_dfa,
};

use crate::lexer::ExternalScanner;

/// Language setup error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LanguageError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("language `{language}` declares {externals} external tokens but has no scanner")]
    MissingScanner { language: String, externals: usize },
    #[error("language `{language}` could not be built: {message}")]
    Build { language: String, message: String },
}

/// A grammar table plus its decoded automata. Cheap to clone.
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

#[derive(Clone)]
struct LanguageData {
    table: LanguageTable,
    lexer: sparse::DFA<Vec<u8>>,
    separator: Option<sparse::DFA<Vec<u8>>>,
    /// Symbol to token index (DFA pattern).
    token_of: Vec<Option<u32>>,
    scanner: Option<Arc<dyn ExternalScanner>>,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.0.table.name)
            .field("symbols", &self.0.table.symbols.len())
            .field("states", &self.0.table.states.len())
            .field("scanner", &self.0.scanner.is_some())
            .finish()
    }
}

impl Language {
    /// Load a serialized table, validating its header, checksum and automata.
    pub fn load(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_table(LanguageTable::from_bytes(bytes)?)
    }

    /// Wrap an already validated table.
    pub fn from_table(table: LanguageTable) -> Result<Self, LoadError> {
        let lexer = deserialize_dfa(&table.lexer_dfa)?;
        let separator = table
            .separator_dfa
            .as_deref()
            .map(deserialize_dfa)
            .transpose()?;
        let mut token_of = vec![None; table.symbols.len()];
        for (index, token) in table.tokens.iter().enumerate() {
            token_of[token.symbol as usize] = Some(index as u32);
        }
        tracing::debug!(
            language = %table.name,
            symbols = table.symbols.len(),
            states = table.states.len(),
            "loaded language"
        );
        Ok(Self(Arc::new(LanguageData {
            table,
            lexer,
            separator,
            token_of,
            scanner: None,
        })))
    }

    /// Attach the scanner for the grammar's external tokens.
    pub fn with_scanner(self, scanner: impl ExternalScanner + 'static) -> Self {
        let mut data = Arc::unwrap_or_clone(self.0);
        data.scanner = Some(Arc::new(scanner));
        Self(Arc::new(data))
    }

    /// Fails when the grammar needs a scanner that was never attached.
    pub fn check(&self) -> Result<(), LanguageError> {
        let externals = self.0.table.externals.len();
        if externals > 0 && self.0.scanner.is_none() {
            return Err(LanguageError::MissingScanner {
                language: self.name().to_owned(),
                externals,
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.0.table.name
    }

    pub fn table(&self) -> &LanguageTable {
        &self.0.table
    }

    pub fn symbol_count(&self) -> usize {
        self.0.table.symbols.len()
    }

    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.0.table.symbol_name(symbol)
    }

    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.0.table.symbol_for_name(name, named)
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        self.0.table.field_name(field)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.0.table.field_id(name)
    }

    pub fn state_count(&self) -> usize {
        self.0.table.states.len()
    }

    pub(crate) fn symbol(&self, symbol: SymbolId) -> &SymbolInfo {
        self.0.table.symbol(symbol)
    }

    pub(crate) fn lexer_dfa(&self) -> &sparse::DFA<Vec<u8>> {
        &self.0.lexer
    }

    pub(crate) fn separator_dfa(&self) -> Option<&sparse::DFA<Vec<u8>>> {
        self.0.separator.as_ref()
    }

    pub(crate) fn token_index(&self, symbol: SymbolId) -> Option<usize> {
        self.0
            .token_of
            .get(symbol as usize)
            .copied()
            .flatten()
            .map(|i| i as usize)
    }

    pub(crate) fn scanner(&self) -> Option<&dyn ExternalScanner> {
        self.0.scanner.as_deref()
    }

    pub(crate) fn lex_mode_id(&self, state: StateId) -> u32 {
        self.0.table.lex_mode(state)
    }
}
