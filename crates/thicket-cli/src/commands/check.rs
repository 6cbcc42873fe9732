use super::CliError;
use super::diagnostics::{self, Printer};
use super::lang_resolver::LanguageChoice;
use super::source::SourceInput;
use super::tree::parser_for;

pub struct CheckArgs {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub color: bool,
}

/// Silent on success; renders every syntax error to stderr otherwise.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let source = args.input.load()?;
    let language = args.language.resolve(args.input.file_path())?;
    let tree = parser_for(&language, None)?.parse(source.as_bytes(), None)?;

    let text = source.to_str_lossy();
    let errors = diagnostics::syntax_errors(&tree, &text);
    if errors.is_empty() {
        return Ok(());
    }

    let name = args.input.display_name();
    eprint!(
        "{}",
        Printer::new(&text)
            .path(&name)
            .colored(args.color)
            .render(&errors)
    );
    Err(CliError::SyntaxErrors {
        source_name: name,
        count: errors.len(),
    })
}
