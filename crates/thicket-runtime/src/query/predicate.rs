//! Text predicates attached to patterns.

use regex_automata::meta::Regex;

use super::QueryCapture;
use crate::source::Source;

#[derive(Clone, Debug)]
pub(crate) enum Operand {
    Capture(u32),
    Literal(String),
}

#[derive(Clone, Debug)]
pub(crate) enum Predicate {
    /// `#eq?` / `#not-eq?`
    Eq {
        capture: u32,
        operand: Operand,
        negated: bool,
    },
    /// `#match?` / `#not-match?`
    Match {
        capture: u32,
        regex: Regex,
        negated: bool,
    },
}

impl Predicate {
    /// Predicates over captures absent from the match hold.
    pub fn holds<S: Source + ?Sized>(&self, captures: &[QueryCapture<'_>], source: &S) -> bool {
        let text_of = |index: u32| {
            captures
                .iter()
                .find(|c| c.index == index)
                .map(|c| source.slice(c.node.byte_range()))
        };
        match self {
            Predicate::Eq {
                capture,
                operand,
                negated,
            } => {
                let Some(left) = text_of(*capture) else {
                    return true;
                };
                let equal = match operand {
                    Operand::Literal(text) => *left == *text.as_bytes(),
                    Operand::Capture(other) => match text_of(*other) {
                        Some(right) => left == right,
                        None => return true,
                    },
                };
                equal != *negated
            }
            Predicate::Match {
                capture,
                regex,
                negated,
            } => {
                let Some(text) = text_of(*capture) else {
                    return true;
                };
                regex.is_match(&*text) != *negated
            }
        }
    }
}
