use std::path::PathBuf;

use serde::Serialize;
use thicket_core::Colors;
use thicket_runtime::{Node, Query, QueryCursor, Tree};

use super::CliError;
use super::diagnostics::{self, Printer};
use super::lang_resolver::LanguageChoice;
use super::source::SourceInput;
use super::tree::parser_for;

pub struct QueryArgs {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub query_text: Option<String>,
    pub query_file: Option<PathBuf>,
    pub json: bool,
    pub color: bool,
}

pub fn run(args: QueryArgs) -> Result<(), CliError> {
    let (query_text, query_name) = match (&args.query_text, &args.query_file) {
        (Some(text), _) => (text.clone(), "<query>".to_owned()),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            (text, path.display().to_string())
        }
        (None, None) => (String::new(), "<query>".to_owned()),
    };

    let source = args.input.load()?;
    let language = args.language.resolve(args.input.file_path())?;
    let query = Query::new(&language, &query_text).map_err(|err| {
        CliError::Reported(
            Printer::new(&query_text)
                .path(&query_name)
                .colored(args.color)
                .render(&[diagnostics::query_error(&err)]),
        )
    })?;
    let tree = parser_for(&language, None)?.parse(source.as_bytes(), None)?;

    let matches = collect_matches(&query, &tree, source.as_bytes());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        print!("{}", render(&matches, Colors::new(args.color)));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct MatchOutput {
    pub pattern: usize,
    pub captures: Vec<CaptureOutput>,
}

#[derive(Debug, Serialize)]
pub struct CaptureOutput {
    pub name: String,
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: [u32; 2],
    pub end: [u32; 2],
    pub text: String,
}

impl CaptureOutput {
    fn new(name: &str, node: Node<'_>, source: &[u8]) -> Self {
        let (start, end) = (node.start_position(), node.end_position());
        Self {
            name: name.to_owned(),
            kind: node.kind().to_owned(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start: [start.row, start.column],
            end: [end.row, end.column],
            text: node.utf8_text(source).into_owned(),
        }
    }
}

pub fn collect_matches(query: &Query, tree: &Tree, source: &[u8]) -> Vec<MatchOutput> {
    let names = query.capture_names();
    QueryCursor::new()
        .matches(query, tree.root_node(), source)
        .map(|m| MatchOutput {
            pattern: m.pattern_index,
            captures: m
                .captures
                .iter()
                .map(|c| CaptureOutput::new(&names[c.index as usize], c.node, source))
                .collect(),
        })
        .collect()
}

/// One line per match, then one indented line per capture.
pub fn render(matches: &[MatchOutput], colors: Colors) -> String {
    let mut out = String::new();
    for m in matches {
        out.push_str(&format!("pattern {}\n", m.pattern));
        for c in &m.captures {
            out.push_str(&format!(
                "  {}@{}{} {}[{}:{}-{}:{}]{} {:?}\n",
                colors.blue,
                c.name,
                colors.reset,
                colors.dim,
                c.start[0],
                c.start[1],
                c.end[0],
                c.end[1],
                colors.reset,
                c.text
            ));
        }
    }
    out
}
