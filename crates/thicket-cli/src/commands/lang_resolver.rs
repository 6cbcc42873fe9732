use std::path::{Path, PathBuf};

use thicket_runtime::Language;

use super::CliError;
use super::langs::{self, Bundled};

/// `-l/--lang` or `-t/--table`, as given on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LanguageChoice {
    pub lang: Option<String>,
    pub table: Option<PathBuf>,
}

impl LanguageChoice {
    pub fn bundled(name: &str) -> Self {
        Self {
            lang: Some(name.to_owned()),
            table: None,
        }
    }

    /// Resolve the language: a table file first, then an explicit name, then
    /// the extension of `source_path`.
    pub fn resolve(&self, source_path: Option<&Path>) -> Result<Language, CliError> {
        if let Some(path) = &self.table {
            let bytes = std::fs::read(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let language = Language::load(&bytes)?;
            tracing::debug!(language = language.name(), "loaded table {}", path.display());
            return Ok(language);
        }
        let bundled = self.resolve_bundled(source_path)?;
        Ok((bundled.load)()?)
    }

    /// Resolve to a bundled language only.
    pub fn resolve_bundled(&self, source_path: Option<&Path>) -> Result<&'static Bundled, CliError> {
        if let Some(name) = &self.lang {
            return langs::from_name(name).ok_or_else(|| CliError::UnknownLanguage {
                name: name.clone(),
                suggestion: suggest_language(name),
            });
        }

        if let Some(ext) = source_path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
        {
            return langs::from_ext(ext).ok_or_else(|| CliError::UnknownExtension(ext.to_owned()));
        }

        Err(CliError::LanguageRequired)
    }
}

/// Closest bundled name within two edits of `input`.
pub fn suggest_language(input: &str) -> Option<String> {
    let input = &input.to_lowercase();
    langs::all()
        .iter()
        .flat_map(|lang| lang.names.iter().map(move |n| (lang.name, levenshtein(n, input))))
        .filter(|&(_, distance)| distance <= 2)
        .min_by_key(|&(_, distance)| distance)
        .map(|(name, _)| name.to_owned())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein("ttcn3", "ttcn3"), 0);
        assert_eq!(levenshtein("ttcn3", "tcn3"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn language_is_required_without_hints() {
        let err = LanguageChoice::default().resolve(None).unwrap_err();
        assert!(matches!(err, CliError::LanguageRequired));
    }

    #[test]
    fn unknown_extension_is_reported() {
        let err = LanguageChoice::default()
            .resolve(Some(Path::new("notes.txt")))
            .unwrap_err();
        insta::assert_snapshot!(err, @"cannot infer language from extension `.txt`; use -l/--lang or -t/--table");
    }

    #[test]
    fn missing_table_file_is_reported() {
        let choice = LanguageChoice {
            lang: None,
            table: Some(PathBuf::from("/nonexistent/lang.tbl")),
        };
        let err = choice.resolve(None).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    #[cfg(feature = "lang-ttcn3")]
    fn resolves_bundled_languages() {
        let by_name = LanguageChoice::bundled("TTCN-3").resolve_bundled(None).unwrap();
        assert_eq!(by_name.name, "ttcn3");
        let by_ext = LanguageChoice::default()
            .resolve_bundled(Some(Path::new("suite.ttcnpp")))
            .unwrap();
        assert_eq!(by_ext.name, "ttcn3");
    }

    #[test]
    #[cfg(feature = "lang-ttcn3")]
    fn suggests_close_names() {
        assert_eq!(suggest_language("ttcn2"), Some("ttcn3".to_owned()));
        assert_eq!(suggest_language("TTCN2"), Some("ttcn3".to_owned()));
        assert_eq!(suggest_language("python"), None);
        let err = LanguageChoice::bundled("tcn").resolve(None).unwrap_err();
        insta::assert_snapshot!(err, @"unknown language `tcn`; did you mean `ttcn3`? (run `thicket langs` for the full list)");
    }
}
