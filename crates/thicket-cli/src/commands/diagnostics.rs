//! Rendering syntax errors and query errors as annotated snippets.

use std::fmt::Write as _;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use thicket_runtime::{Node, QueryError, Tree};

/// Longest excerpt of skipped text quoted in a message.
const EXCERPT_CHARS: usize = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: Range<usize>,
    pub message: String,
}

/// ERROR and MISSING nodes of `tree`, in document order.
pub fn syntax_errors(tree: &Tree, source: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if let Some(diagnostic) = diagnose(node, source) {
            out.push(diagnostic);
        } else if node.has_error() {
            stack.extend(node.children().rev());
        }
    }
    out
}

fn diagnose(node: Node<'_>, source: &str) -> Option<Diagnostic> {
    let message = if node.is_missing() {
        if node.is_named() {
            format!("missing {}", node.kind())
        } else {
            format!("missing `{}`", node.kind())
        }
    } else if node.is_error() {
        unexpected(node.utf8_text(source).trim())
    } else {
        return None;
    };
    Some(Diagnostic {
        range: node.byte_range(),
        message,
    })
}

fn unexpected(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.is_empty() {
        return "unexpected input".to_owned();
    }
    let mut excerpt: String = line.chars().take(EXCERPT_CHARS).collect();
    if excerpt.len() < text.len() {
        excerpt.push('…');
    }
    format!("unexpected `{excerpt}`")
}

/// A query compile error, pointing into the query text.
pub fn query_error(err: &QueryError) -> Diagnostic {
    Diagnostic {
        range: err.offset..err.offset,
        message: err.kind.to_string(),
    }
}

pub struct Printer<'s> {
    source: &'s str,
    path: Option<&'s str>,
    colored: bool,
}

impl<'s> Printer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            path: None,
            colored: false,
        }
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut out = String::new();
        for (i, diag) in diagnostics.iter().enumerate() {
            let mut snippet = Snippet::source(self.source)
                .line_start(1)
                .annotation(AnnotationKind::Primary.span(adjust_range(&diag.range, self.source)));
            if let Some(path) = self.path {
                snippet = snippet.path(path);
            }
            let report: Vec<Group> = vec![Level::ERROR.primary_title(&diag.message).element(snippet)];

            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "{}", renderer.render(&report));
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Widen an empty span to the following character so it stays visible.
fn adjust_range(range: &Range<usize>, source: &str) -> Range<usize> {
    let start = floor_char_boundary(source, range.start.min(source.len()));
    let end = floor_char_boundary(source, range.end.min(source.len())).max(start);
    if start < end {
        return start..end;
    }
    let width = source[start..].chars().next().map_or(0, char::len_utf8);
    start..start + width
}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spans_cover_the_next_character() {
        assert_eq!(adjust_range(&(2..2), "abcd"), 2..3);
        assert_eq!(adjust_range(&(1..1), "aéb"), 1..3);
        assert_eq!(adjust_range(&(4..4), "abcd"), 4..4);
        assert_eq!(adjust_range(&(2..9), "aéb"), 1..4);
    }

    #[test]
    fn long_excerpts_are_cut() {
        insta::assert_snapshot!(unexpected("x"), @"unexpected `x`");
        insta::assert_snapshot!(unexpected("abc\ndef"), @"unexpected `abc…`");
        insta::assert_snapshot!(
            unexpected("abcdefghijklmnopqrstuvwxyz"),
            @"unexpected `abcdefghijklmnopqrstuvwx…`"
        );
        insta::assert_snapshot!(unexpected(""), @"unexpected input");
    }
}
