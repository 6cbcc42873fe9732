use std::ops::Range;

use serde::Serialize;
use thicket_core::Colors;
use thicket_runtime::{InputEdit, Language, Range as TextRange, Tree};

use super::CliError;
use super::lang_resolver::LanguageChoice;
use super::source::SourceInput;
use super::tree::{TreeFormat, parser_for};

pub struct EditArgs {
    pub input: SourceInput,
    pub language: LanguageChoice,
    /// `START` or `START:OLD_END`, in bytes.
    pub at: String,
    pub insert: String,
    pub show_tree: bool,
    pub json: bool,
    pub color: bool,
}

pub fn run(args: EditArgs) -> Result<(), CliError> {
    let source = args.input.load()?;
    let language = args.language.resolve(args.input.file_path())?;
    let span = parse_span(&args.at)?;

    let outcome = apply(&language, source.as_bytes(), span, args.insert.as_bytes())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.changed_json())?);
    } else {
        print!("{}", render_ranges(&outcome.changed));
    }
    if args.show_tree {
        let format = TreeFormat {
            colors: Colors::new(args.color),
            ..TreeFormat::default()
        };
        print!("{}", format.render(&outcome.tree, &outcome.text));
    }
    Ok(())
}

/// `12` is an insertion point, `12:20` a replaced span.
pub fn parse_span(spec: &str) -> Result<Range<usize>, CliError> {
    let invalid = || CliError::InvalidSpan(spec.to_owned());
    let (start, end) = match spec.split_once(':') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (spec.trim(), spec.trim()),
    };
    let start: usize = start.parse().map_err(|_| invalid())?;
    let end: usize = end.parse().map_err(|_| invalid())?;
    if end < start {
        return Err(invalid());
    }
    Ok(start..end)
}

pub struct EditOutcome {
    pub text: Vec<u8>,
    pub tree: Tree,
    pub changed: Vec<TextRange>,
}

impl EditOutcome {
    fn changed_json(&self) -> Vec<ChangedRange> {
        self.changed.iter().map(ChangedRange::from).collect()
    }
}

/// Parse `old`, replace `span` with `replacement` and reparse incrementally.
pub fn apply(
    language: &Language,
    old: &[u8],
    span: Range<usize>,
    replacement: &[u8],
) -> Result<EditOutcome, CliError> {
    if span.end > old.len() {
        return Err(CliError::SpanOutOfBounds {
            start: span.start,
            old_end: span.end,
            len: old.len(),
        });
    }

    let mut parser = parser_for(language, None)?;
    let tree = parser.parse(old, None)?;

    let mut text = Vec::with_capacity(old.len() + replacement.len());
    text.extend_from_slice(&old[..span.start]);
    text.extend_from_slice(replacement);
    text.extend_from_slice(&old[span.end..]);

    let edit = InputEdit::replace(old, span, replacement);
    let edited = tree.edit(&edit)?;
    let (tree, changed) = parser.reparse(&edited, text.as_slice())?;
    tracing::debug!(ranges = changed.len(), "reparsed after edit");
    Ok(EditOutcome {
        text,
        tree,
        changed,
    })
}

pub fn render_ranges(ranges: &[TextRange]) -> String {
    if ranges.is_empty() {
        return "no changes\n".to_owned();
    }
    ranges.iter().map(|r| format!("{r}\n")).collect()
}

#[derive(Debug, Serialize)]
struct ChangedRange {
    start_byte: usize,
    end_byte: usize,
    start: [u32; 2],
    end: [u32; 2],
}

impl From<&TextRange> for ChangedRange {
    fn from(r: &TextRange) -> Self {
        Self {
            start_byte: r.start_byte,
            end_byte: r.end_byte,
            start: [r.start_point.row, r.start_point.column],
            end: [r.end_point.row, r.end_point.column],
        }
    }
}
