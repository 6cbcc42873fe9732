//! In-memory form of a grammar, as read from `grammar.json` or built with
//! the [`dsl`](super::dsl).
//!
//! Nothing here is validated. `thicket-generate` resolves names, checks the
//! token rules and reports what is wrong.

use serde::{Deserialize, Serialize};

/// A grammar ready for table generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    /// Language name, stored in the generated table (`ttcn3`, `toy`).
    pub name: String,
    /// Rules in definition order. The parse starts from the first one.
    /// A name starting with `_` makes the rule's nodes hidden.
    pub rules: Vec<(String, Rule)>,
    /// Tokens allowed between any two tokens. Patterns become padding;
    /// named rules such as comments stay in the tree as extra nodes.
    #[serde(default)]
    pub extras: Vec<Rule>,
    /// Groups of named levels, highest first, that `Precedence::Name`
    /// values resolve against.
    #[serde(default)]
    pub precedences: Vec<Vec<PrecedenceEntry>>,
    /// Rule groups whose conflicts are left to the GLR runtime without a
    /// warning.
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,
    /// Tokens produced by the language's external scanner, in the order the
    /// scanner reports them.
    #[serde(default)]
    pub externals: Vec<Rule>,
    /// Rules spliced into their callers instead of producing nodes.
    #[serde(default)]
    pub inline: Vec<String>,
    /// Hidden rules listed as supertypes in the generated table.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Identifier rule; string tokens it also matches are lexed as
    /// keywords after the identifier is read.
    #[serde(default)]
    pub word: Option<String>,
    /// Named keyword sets. Accepted so `grammar.json` files round-trip; the
    /// generator only looks inside the contexts.
    #[serde(default)]
    pub reserved: Vec<(String, Vec<Rule>)>,
}

/// Right-hand side of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// Matches nothing.
    Blank,
    /// Literal text; becomes an anonymous token.
    String(String),
    /// Regular expression token. Of the `flags`, only `i` and `s` apply.
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    /// Another rule, by name.
    Symbol(String),
    Seq(Vec<Rule>),
    /// Alternatives. Unresolved overlaps become GLR forks at parse time.
    Choice(Vec<Rule>),
    Repeat(Box<Rule>),
    Repeat1(Box<Rule>),
    /// Labels the node(s) `content` produces inside the parent.
    Field { name: String, content: Box<Rule> },
    /// Renames the node `content` produces. `named` picks between a named
    /// kind and an anonymous one.
    Alias {
        content: Box<Rule>,
        value: String,
        named: bool,
    },
    /// Lexes `content` as a single token.
    Token(Box<Rule>),
    /// A token that may not follow whitespace or other extras.
    ImmediateToken(Box<Rule>),
    /// Static precedence for shift/reduce and lexical conflicts.
    Prec {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Like `Prec`, reducing on ties.
    PrecLeft {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Like `Prec`, shifting on ties.
    PrecRight {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Added to a version's score each time `content` is reduced. When two
    /// versions survive an ambiguity, the higher total wins.
    PrecDynamic { value: i32, content: Box<Rule> },
    /// `content` parsed with a named keyword set.
    Reserved {
        context_name: String,
        content: Box<Rule>,
    },
}

/// A precedence level: a number, or a name from [`Grammar::precedences`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precedence {
    Integer(i32),
    Name(String),
}

/// One member of a [`Grammar::precedences`] group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecedenceEntry {
    /// A level that `Precedence::Name` can refer to.
    Name(String),
    /// A rule, ranked by its position in the group.
    Symbol(String),
}

impl Grammar {
    pub fn start_rule(&self) -> Option<&str> {
        self.rules.first().map(|(name, _)| name.as_str())
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(rule_name, _)| rule_name == name)
            .map(|(_, rule)| rule)
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }
}

impl Rule {
    /// Strip precedence wrappers, returning the innermost content.
    pub fn without_precedence(&self) -> &Rule {
        match self {
            Rule::Prec { content, .. }
            | Rule::PrecLeft { content, .. }
            | Rule::PrecRight { content, .. }
            | Rule::PrecDynamic { content, .. } => content.without_precedence(),
            other => other,
        }
    }

    /// Visit every symbol this rule references, in source order.
    pub fn for_each_symbol<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Rule::Blank | Rule::String(_) | Rule::Pattern { .. } => {}
            Rule::Symbol(name) => f(name),
            Rule::Seq(members) | Rule::Choice(members) => {
                for member in members {
                    member.for_each_symbol(f);
                }
            }
            Rule::Repeat(content)
            | Rule::Repeat1(content)
            | Rule::Token(content)
            | Rule::ImmediateToken(content)
            | Rule::Field { content, .. }
            | Rule::Alias { content, .. }
            | Rule::Prec { content, .. }
            | Rule::PrecLeft { content, .. }
            | Rule::PrecRight { content, .. }
            | Rule::PrecDynamic { content, .. }
            | Rule::Reserved { content, .. } => content.for_each_symbol(f),
        }
    }
}
