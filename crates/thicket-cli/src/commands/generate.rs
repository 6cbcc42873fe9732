use std::path::PathBuf;

use thicket_core::Grammar;
use thicket_generate::{GenerateOptions, Generated};

use super::CliError;
use super::lang_resolver::LanguageChoice;

pub struct GenerateArgs {
    pub grammar_path: Option<PathBuf>,
    /// Compile a bundled grammar instead of a grammar.json.
    pub lang: Option<String>,
    pub output: PathBuf,
    pub max_alternatives: Option<usize>,
    pub strict: bool,
}

pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let grammar = load_grammar(&args)?;
    let mut options = GenerateOptions::default();
    if let Some(limit) = args.max_alternatives {
        options = options.max_alternatives(limit);
    }

    let generated = compile(&grammar, options, args.strict)?;
    let bytes = generated.table.to_bytes()?;
    std::fs::write(&args.output, &bytes).map_err(|source| CliError::Write {
        path: args.output.clone(),
        source,
    })?;
    eprintln!(
        "{} ({} bytes) -> {}",
        summary(&grammar, &generated),
        bytes.len(),
        args.output.display()
    );
    Ok(())
}

fn load_grammar(args: &GenerateArgs) -> Result<Grammar, CliError> {
    if let Some(name) = &args.lang {
        let bundled = LanguageChoice::bundled(name).resolve_bundled(None)?;
        return Ok((bundled.grammar)());
    }
    let Some(path) = &args.grammar_path else {
        return Err(CliError::GrammarRequired);
    };
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(Grammar::from_json(&json)?)
}

/// Generate, printing every undeclared conflict as a warning. With `strict`
/// they fail the command.
pub fn compile(grammar: &Grammar, options: GenerateOptions, strict: bool) -> Result<Generated, CliError> {
    let generated = thicket_generate::generate_with(grammar, options)?;
    let undeclared: Vec<_> = generated.report.undeclared_conflicts().collect();
    for conflict in &undeclared {
        eprintln!(
            "warning: conflict in state {} on `{}` between {} ({})",
            conflict.state,
            conflict.lookahead,
            conflict.actions.join(" / "),
            conflict.rules.join(", ")
        );
    }
    if strict && !undeclared.is_empty() {
        return Err(CliError::UndeclaredConflicts {
            grammar: grammar.name.clone(),
            count: undeclared.len(),
        });
    }
    Ok(generated)
}

pub fn summary(grammar: &Grammar, generated: &Generated) -> String {
    let report = &generated.report;
    format!(
        "generated `{}`: {} states, {} productions, {} tokens, {} conflicts",
        grammar.name,
        report.state_count,
        report.production_count,
        report.token_count,
        report.conflicts.len()
    )
}
