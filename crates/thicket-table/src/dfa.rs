//! Lexer automaton deserialization.

use regex_automata::dfa::sparse::DFA;

use crate::error::LoadError;

/// Deserialize a sparse DFA stored in a table.
///
/// The bytes must have been produced by `DFA::to_bytes_little_endian()` with
/// the same regex-automata version; anything else is rejected, not trusted.
pub fn deserialize_dfa(bytes: &[u8]) -> Result<DFA<Vec<u8>>, LoadError> {
    let (dfa, _) = DFA::from_bytes(bytes).map_err(|e| LoadError::InvalidDfa(e.to_string()))?;
    Ok(dfa.to_owned())
}
