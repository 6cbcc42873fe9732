use thicket_core::Colors;

use super::CliError;
use super::lang_resolver::LanguageChoice;

pub struct DumpArgs {
    pub language: LanguageChoice,
    pub color: bool,
}

pub fn run(args: DumpArgs) -> Result<(), CliError> {
    let language = args.language.resolve(None)?;
    print!(
        "{}",
        thicket_table::dump::dump(language.table(), Colors::new(args.color))
    );
    Ok(())
}
