//! Dispatch logic: extract params from `ArgMatches` and convert them to
//! command args.
//!
//! `*Params` structs mirror the command `*Args` but keep the raw
//! [`ColorChoice`]; the `From` impls resolve it when bridging to the
//! command handlers.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::edit::EditArgs;
use crate::commands::generate::GenerateArgs;
use crate::commands::lang_resolver::LanguageChoice;
use crate::commands::query::QueryArgs;
use crate::commands::source::SourceInput;
use crate::commands::tree::TreeArgs;

pub struct GenerateParams {
    pub grammar_path: Option<PathBuf>,
    pub lang: Option<String>,
    pub output: PathBuf,
    pub max_alternatives: Option<usize>,
    pub strict: bool,
}

impl GenerateParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: m.get_one::<PathBuf>("grammar_path").cloned(),
            lang: m.get_one::<String>("lang").cloned(),
            output: m.get_one::<PathBuf>("output").cloned().unwrap_or_default(),
            max_alternatives: m.get_one::<usize>("max_alternatives").copied(),
            strict: m.get_flag("strict"),
        }
    }
}

impl From<GenerateParams> for GenerateArgs {
    fn from(p: GenerateParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            lang: p.lang,
            output: p.output,
            max_alternatives: p.max_alternatives,
            strict: p.strict,
        }
    }
}

pub struct TreeParams {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub raw: bool,
    pub spans: bool,
    pub max_versions: Option<usize>,
    pub color: ColorChoice,
}

impl TreeParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: source_input(m),
            language: language_choice(m),
            raw: m.get_flag("raw"),
            spans: m.get_flag("spans"),
            max_versions: m.get_one::<usize>("max_versions").copied(),
            color: parse_color(m),
        }
    }
}

impl From<TreeParams> for TreeArgs {
    fn from(p: TreeParams) -> Self {
        Self {
            input: p.input,
            language: p.language,
            raw: p.raw,
            spans: p.spans,
            max_versions: p.max_versions,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CheckParams {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: source_input(m),
            language: language_choice(m),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            input: p.input,
            language: p.language,
            color: p.color.should_colorize(),
        }
    }
}

pub struct QueryParams {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub query_text: Option<String>,
    pub query_file: Option<PathBuf>,
    pub json: bool,
    pub color: ColorChoice,
}

impl QueryParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: source_input(m),
            language: language_choice(m),
            query_text: m.get_one::<String>("query_text").cloned(),
            query_file: m.get_one::<PathBuf>("query_file").cloned(),
            json: m.get_flag("json"),
            color: parse_color(m),
        }
    }
}

impl From<QueryParams> for QueryArgs {
    fn from(p: QueryParams) -> Self {
        Self {
            input: p.input,
            language: p.language,
            query_text: p.query_text,
            query_file: p.query_file,
            json: p.json,
            color: p.color.should_colorize(),
        }
    }
}

pub struct EditParams {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub at: String,
    pub insert: String,
    pub show_tree: bool,
    pub json: bool,
    pub color: ColorChoice,
}

impl EditParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: source_input(m),
            language: language_choice(m),
            at: m.get_one::<String>("at").cloned().unwrap_or_default(),
            insert: m.get_one::<String>("insert").cloned().unwrap_or_default(),
            show_tree: m.get_flag("show_tree"),
            json: m.get_flag("json"),
            color: parse_color(m),
        }
    }
}

impl From<EditParams> for EditArgs {
    fn from(p: EditParams) -> Self {
        Self {
            input: p.input,
            language: p.language,
            at: p.at,
            insert: p.insert,
            show_tree: p.show_tree,
            json: p.json,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub language: LanguageChoice,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            language: language_choice(m),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            language: p.language,
            color: p.color.should_colorize(),
        }
    }
}

fn source_input(m: &ArgMatches) -> SourceInput {
    SourceInput {
        path: m.get_one::<PathBuf>("source_path").cloned(),
        text: m.get_one::<String>("source_text").cloned(),
    }
}

fn language_choice(m: &ArgMatches) -> LanguageChoice {
    LanguageChoice {
        lang: m.get_one::<String>("lang").cloned(),
        table: m.get_one::<PathBuf>("table").cloned(),
    }
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
