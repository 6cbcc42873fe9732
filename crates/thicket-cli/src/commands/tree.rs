use thicket_core::Colors;
use thicket_runtime::{FuelLimits, Language, Node, Parser, Tree};

use super::CliError;
use super::lang_resolver::LanguageChoice;
use super::source::SourceInput;

pub struct TreeArgs {
    pub input: SourceInput,
    pub language: LanguageChoice,
    pub raw: bool,
    pub spans: bool,
    pub max_versions: Option<usize>,
    pub color: bool,
}

pub fn run(args: TreeArgs) -> Result<(), CliError> {
    let source = args.input.load()?;
    let language = args.language.resolve(args.input.file_path())?;
    let mut parser = parser_for(&language, args.max_versions)?;
    let tree = parser.parse(source.as_bytes(), None)?;

    let format = TreeFormat {
        raw: args.raw,
        spans: args.spans,
        colors: Colors::new(args.color),
    };
    print!("{}", format.render(&tree, source.as_bytes()));
    Ok(())
}

pub(crate) fn parser_for(language: &Language, max_versions: Option<usize>) -> Result<Parser, CliError> {
    let mut limits = FuelLimits::new();
    if let Some(count) = max_versions {
        limits = limits.max_versions(count);
    }
    Ok(Parser::new(language)?.with_limits(limits))
}

/// Indented tree printing, one node per line.
#[derive(Clone, Copy, Default)]
pub struct TreeFormat {
    /// Include anonymous nodes.
    pub raw: bool,
    /// Append `[row:col-row:col]` to every node.
    pub spans: bool,
    pub colors: Colors,
}

impl TreeFormat {
    pub fn render(&self, tree: &Tree, source: &[u8]) -> String {
        enum Step<'t> {
            Open(Node<'t>, usize),
            Close,
        }

        let mut out = String::new();
        let mut steps = vec![Step::Open(tree.root_node(), 0)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Close => out.push(')'),
                Step::Open(node, depth) => {
                    let children = self.open_node(node, source, depth, &mut out);
                    if children.is_empty() {
                        out.push(')');
                        continue;
                    }
                    steps.push(Step::Close);
                    steps.extend(children.into_iter().rev().map(|child| Step::Open(child, depth + 1)));
                }
            }
        }
        out.push('\n');
        out
    }

    /// Writes everything up to the closing paren and returns the children
    /// still to print.
    fn open_node<'t>(&self, node: Node<'t>, source: &[u8], depth: usize, out: &mut String) -> Vec<Node<'t>> {
        let c = self.colors;
        if depth > 0 {
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
            if let Some(field) = node.field_name() {
                out.push_str(&format!("{}{field}{}: ", c.dim, c.reset));
            }
        }
        out.push('(');

        if node.is_missing() {
            out.push_str(&format!("{}MISSING{} {}", c.red, c.reset, display_kind(node)));
            self.push_span(node, out);
            return Vec::new();
        }

        let children: Vec<_> = node
            .children()
            .filter(|child| self.raw || child.is_named() || child.is_missing())
            .collect();

        let kind_color = if node.is_error() { c.red } else { c.blue };
        if children.is_empty() {
            let text = node.utf8_text(source);
            if text == node.kind() && !node.is_error() {
                out.push_str(&format!("{}\"{}\"{}", c.green, escape_string(&text), c.reset));
            } else {
                out.push_str(&format!(
                    "{}{}{} {}\"{}\"{}",
                    kind_color,
                    node.kind(),
                    c.reset,
                    c.green,
                    escape_string(&text),
                    c.reset
                ));
            }
            self.push_span(node, out);
            return Vec::new();
        }

        out.push_str(&format!("{kind_color}{}{}", node.kind(), c.reset));
        self.push_span(node, out);
        children
    }

    fn push_span(&self, node: Node<'_>, out: &mut String) {
        if !self.spans {
            return;
        }
        let (start, end) = (node.start_position(), node.end_position());
        out.push_str(&format!(
            " {}[{}-{}]{}",
            self.colors.dim, start, end, self.colors.reset
        ));
    }
}

fn display_kind(node: Node<'_>) -> String {
    if node.is_named() {
        node.kind().to_owned()
    } else {
        format!("\"{}\"", escape_string(node.kind()))
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            c if c.is_control() => result.push_str(&format!("\\u{{{:04x}}}", c as u32)),
            c => result.push(c),
        }
    }
    result
}
