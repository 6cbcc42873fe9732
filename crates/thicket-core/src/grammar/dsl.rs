//! Builders for writing grammars in Rust.
//!
//! Mirrors the `grammar.js` vocabulary: string literals convert into
//! [`Rule::String`], and the [`seq!`](crate::seq) / [`choice!`](crate::choice)
//! macros accept anything that converts into a [`Rule`].
//!
//! ```
//! use thicket_core::dsl::*;
//! use thicket_core::{choice, seq};
//!
//! let grammar = GrammarBuilder::new("tiny")
//!     .rule("source_file", repeat(sym("item")))
//!     .rule("item", choice!["a", seq!["b", sym("item")]])
//!     .extra(pattern(r"\s"))
//!     .build();
//! assert_eq!(grammar.start_rule(), Some("source_file"));
//! ```

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

/// Build a [`Rule::Seq`] from rules or string literals.
#[macro_export]
macro_rules! seq {
    ($($member:expr),+ $(,)?) => {
        $crate::dsl::seq(vec![$($crate::Rule::from($member)),+])
    };
}

/// Build a [`Rule::Choice`] from rules or string literals.
#[macro_export]
macro_rules! choice {
    ($($member:expr),+ $(,)?) => {
        $crate::dsl::choice(vec![$($crate::Rule::from($member)),+])
    };
}

impl From<&str> for Rule {
    fn from(literal: &str) -> Self {
        Rule::String(literal.to_owned())
    }
}

impl From<i32> for Precedence {
    fn from(level: i32) -> Self {
        Precedence::Integer(level)
    }
}

impl From<&str> for Precedence {
    fn from(name: &str) -> Self {
        Precedence::Name(name.to_owned())
    }
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn string(value: impl Into<String>) -> Rule {
    Rule::String(value.into())
}

pub fn pattern(value: impl Into<String>) -> Rule {
    Rule::Pattern {
        value: value.into(),
        flags: None,
    }
}

pub fn pattern_with_flags(value: impl Into<String>, flags: impl Into<String>) -> Rule {
    Rule::Pattern {
        value: value.into(),
        flags: Some(flags.into()),
    }
}

pub fn sym(name: impl Into<String>) -> Rule {
    Rule::Symbol(name.into())
}

/// Sequence. A single member collapses to itself.
pub fn seq(mut members: Vec<Rule>) -> Rule {
    if members.len() == 1 {
        return members.remove(0);
    }
    Rule::Seq(members)
}

/// Alternation. A single member collapses to itself.
pub fn choice(mut members: Vec<Rule>) -> Rule {
    if members.len() == 1 {
        return members.remove(0);
    }
    Rule::Choice(members)
}

pub fn optional(rule: impl Into<Rule>) -> Rule {
    Rule::Choice(vec![rule.into(), Rule::Blank])
}

pub fn repeat(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat(Box::new(rule.into()))
}

pub fn repeat1(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat1(Box::new(rule.into()))
}

pub fn field(name: impl Into<String>, rule: impl Into<Rule>) -> Rule {
    Rule::Field {
        name: name.into(),
        content: Box::new(rule.into()),
    }
}

/// Rename a rule to a named node kind.
pub fn alias(rule: impl Into<Rule>, value: impl Into<String>) -> Rule {
    Rule::Alias {
        content: Box::new(rule.into()),
        value: value.into(),
        named: true,
    }
}

/// Rename a rule to an anonymous node kind.
pub fn alias_anonymous(rule: impl Into<Rule>, value: impl Into<String>) -> Rule {
    Rule::Alias {
        content: Box::new(rule.into()),
        value: value.into(),
        named: false,
    }
}

pub fn token(rule: impl Into<Rule>) -> Rule {
    Rule::Token(Box::new(rule.into()))
}

pub fn immediate_token(rule: impl Into<Rule>) -> Rule {
    Rule::ImmediateToken(Box::new(rule.into()))
}

pub fn prec(value: impl Into<Precedence>, rule: impl Into<Rule>) -> Rule {
    Rule::Prec {
        value: value.into(),
        content: Box::new(rule.into()),
    }
}

pub fn prec_left(value: impl Into<Precedence>, rule: impl Into<Rule>) -> Rule {
    Rule::PrecLeft {
        value: value.into(),
        content: Box::new(rule.into()),
    }
}

pub fn prec_right(value: impl Into<Precedence>, rule: impl Into<Rule>) -> Rule {
    Rule::PrecRight {
        value: value.into(),
        content: Box::new(rule.into()),
    }
}

pub fn prec_dynamic(value: i32, rule: impl Into<Rule>) -> Rule {
    Rule::PrecDynamic {
        value,
        content: Box::new(rule.into()),
    }
}

pub fn reserved(context_name: impl Into<String>, rule: impl Into<Rule>) -> Rule {
    Rule::Reserved {
        context_name: context_name.into(),
        content: Box::new(rule.into()),
    }
}

/// Zero or more `rule`s separated by `sep`, with an optional trailing separator.
pub fn sep_by(sep: impl Into<Rule>, rule: impl Into<Rule>) -> Rule {
    optional(sep_by1(sep, rule))
}

/// One or more `rule`s separated by `sep`, with an optional trailing separator.
pub fn sep_by1(sep: impl Into<Rule>, rule: impl Into<Rule>) -> Rule {
    let sep = sep.into();
    let rule = rule.into();
    Rule::Seq(vec![
        rule.clone(),
        repeat(Rule::Seq(vec![sep.clone(), rule])),
        optional(sep),
    ])
}

/// Incremental [`Grammar`] construction.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    grammar: Grammar,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            grammar: Grammar {
                name: name.into(),
                rules: Vec::new(),
                extras: Vec::new(),
                precedences: Vec::new(),
                conflicts: Vec::new(),
                externals: Vec::new(),
                inline: Vec::new(),
                supertypes: Vec::new(),
                word: None,
                reserved: Vec::new(),
            },
        }
    }

    /// Define a rule. The first rule defined is the start rule.
    /// Redefining a name replaces the earlier body in place.
    pub fn rule(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        let name = name.into();
        let rule = rule.into();
        match self.grammar.rules.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rule,
            None => self.grammar.rules.push((name, rule)),
        }
        self
    }

    pub fn extra(mut self, rule: impl Into<Rule>) -> Self {
        self.grammar.extras.push(rule.into());
        self
    }

    pub fn external(mut self, rule: impl Into<Rule>) -> Self {
        self.grammar.externals.push(rule.into());
        self
    }

    pub fn conflict<S: Into<String>>(mut self, rules: impl IntoIterator<Item = S>) -> Self {
        self.grammar
            .conflicts
            .push(rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn precedence_order(mut self, entries: impl IntoIterator<Item = PrecedenceEntry>) -> Self {
        self.grammar.precedences.push(entries.into_iter().collect());
        self
    }

    pub fn inline(mut self, name: impl Into<String>) -> Self {
        self.grammar.inline.push(name.into());
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.grammar.supertypes.push(name.into());
        self
    }

    pub fn word(mut self, name: impl Into<String>) -> Self {
        self.grammar.word = Some(name.into());
        self
    }

    pub fn reserved_words(
        mut self,
        context: impl Into<String>,
        words: impl IntoIterator<Item = Rule>,
    ) -> Self {
        self.grammar
            .reserved
            .push((context.into(), words.into_iter().collect()));
        self
    }

    pub fn build(self) -> Grammar {
        self.grammar
    }
}
