use crate::header::{HEADER_SIZE, VERSION};

/// Table load error.
///
/// Every variant is detected before any table data is used, so a runtime that
/// holds a `LanguageTable` can index it without further checks.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("file too small: {0} bytes (minimum {HEADER_SIZE})")]
    FileTooSmall(usize),
    #[error("invalid magic: expected TSKT")]
    InvalidMagic,
    #[error(
        "unsupported table version {0}: this engine reads version {VERSION}; regenerate the table"
    )]
    UnsupportedVersion(u32),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: header says {expected:#010x}, body hashes to {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("table body decode error: {0}")]
    Decode(#[from] postcard::Error),
    #[error("inconsistent table: {0}")]
    Inconsistent(String),
    #[error("invalid lexer automaton: {0}")]
    InvalidDfa(String),
    #[error("table is too large: {0} bytes")]
    TooLarge(usize),
}
