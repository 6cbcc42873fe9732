//! Languages compiled into the binary.

use thicket_core::Grammar;
use thicket_runtime::{Language, LanguageError};

use super::CliError;

/// A language whose grammar ships with the binary.
#[derive(Clone, Copy)]
pub struct Bundled {
    pub name: &'static str,
    pub names: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> Grammar,
    pub load: fn() -> Result<Language, LanguageError>,
}

const BUNDLED: &[Bundled] = &[
    #[cfg(feature = "lang-ttcn3")]
    Bundled {
        name: thicket_ttcn3::NAME,
        names: thicket_ttcn3::NAMES,
        extensions: thicket_ttcn3::EXTENSIONS,
        grammar: thicket_ttcn3::grammar,
        load: thicket_ttcn3::language,
    },
];

pub fn all() -> &'static [Bundled] {
    BUNDLED
}

/// Look up by any accepted name, ignoring case.
pub fn from_name(name: &str) -> Option<&'static Bundled> {
    BUNDLED
        .iter()
        .find(|lang| lang.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
}

pub fn from_ext(ext: &str) -> Option<&'static Bundled> {
    BUNDLED
        .iter()
        .find(|lang| lang.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

pub fn render() -> String {
    let mut out = format!("Bundled languages ({}):\n", BUNDLED.len());
    for lang in BUNDLED {
        let extensions: Vec<String> = lang.extensions.iter().map(|e| format!(".{e}")).collect();
        out.push_str(&format!("  {:<10} {}\n", lang.name, extensions.join(" ")));
    }
    out
}

pub fn run() -> Result<(), CliError> {
    print!("{}", render());
    Ok(())
}
