//! Grammar table format for thicket.
//!
//! A table is a 64-byte [`Header`] followed by a postcard-encoded
//! [`LanguageTable`]. Tables are produced by `thicket-generate` and consumed by
//! `thicket-runtime`; the header version guards the boundary between them.

pub mod dfa;
pub mod dump;
mod error;
mod header;
mod table;

#[cfg(test)]
mod table_tests;
#[cfg(test)]
pub(crate) mod test_utils;

pub use dfa::deserialize_dfa;
pub use error::LoadError;
pub use header::{HEADER_SIZE, Header, MAGIC, VERSION};
pub use table::{
    AliasId, AliasInfo, ExternalId, FieldId, KeywordTable, LanguageTable, LexMode, LexModeId,
    ParseAction, ParseState, Production, ProductionId, ProductionStep, StateId, SymbolId,
    SymbolInfo, SymbolKind, TokenInfo, TokenKind,
};

/// Symbol id of the end-of-input terminal.
pub const END_SYMBOL: SymbolId = 0;
/// Symbol id of ERROR nodes.
pub const ERROR_SYMBOL: SymbolId = 1;
