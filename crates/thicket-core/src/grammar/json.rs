//! JSON conversion for `grammar.json` files.
//!
//! The JSON format uses internally-tagged enums with a `type` field.
//! Conversion goes through a raw mirror of that format in both directions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

/// Error during grammar reading or writing.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary decode error: {0}")]
    Binary(#[from] postcard::Error),
}

impl Grammar {
    /// Parse grammar from JSON string.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: RawGrammar = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    /// Render grammar as pretty-printed `grammar.json`.
    pub fn to_json(&self) -> Result<String, GrammarError> {
        let raw = RawGrammar::from(self);
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}

/// Raw grammar structure matching the JSON format.
#[derive(Debug, Serialize, Deserialize)]
struct RawGrammar {
    name: String,
    rules: IndexMap<String, RawRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extras: Vec<RawRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    precedences: Vec<Vec<RawPrecedenceEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    externals: Vec<RawRule>,
    #[serde(default, rename = "inline", skip_serializing_if = "Vec::is_empty")]
    inline_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    supertypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    reserved: IndexMap<String, Vec<RawRule>>,
}

impl From<RawGrammar> for Grammar {
    fn from(raw: RawGrammar) -> Self {
        // IndexMap preserves insertion order; the start rule is always first.
        Self {
            name: raw.name,
            rules: raw.rules.into_iter().map(|(k, v)| (k, v.into())).collect(),
            extras: raw.extras.into_iter().map(Into::into).collect(),
            precedences: raw
                .precedences
                .into_iter()
                .map(|v| v.into_iter().map(Into::into).collect())
                .collect(),
            conflicts: raw.conflicts,
            externals: raw.externals.into_iter().map(Into::into).collect(),
            inline: raw.inline_rules,
            supertypes: raw.supertypes,
            word: raw.word,
            reserved: raw
                .reserved
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }
}

impl From<&Grammar> for RawGrammar {
    fn from(grammar: &Grammar) -> Self {
        Self {
            name: grammar.name.clone(),
            rules: grammar
                .rules
                .iter()
                .map(|(k, v)| (k.clone(), v.into()))
                .collect(),
            extras: grammar.extras.iter().map(Into::into).collect(),
            precedences: grammar
                .precedences
                .iter()
                .map(|v| v.iter().map(Into::into).collect())
                .collect(),
            conflicts: grammar.conflicts.clone(),
            externals: grammar.externals.iter().map(Into::into).collect(),
            inline_rules: grammar.inline.clone(),
            supertypes: grammar.supertypes.clone(),
            word: grammar.word.clone(),
            reserved: grammar
                .reserved
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().map(Into::into).collect()))
                .collect(),
        }
    }
}

/// Raw rule matching the JSON format.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
enum RawRule {
    BLANK,
    STRING {
        value: String,
    },
    PATTERN {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    SYMBOL {
        name: String,
    },
    SEQ {
        members: Vec<RawRule>,
    },
    CHOICE {
        members: Vec<RawRule>,
    },
    REPEAT {
        content: Box<RawRule>,
    },
    REPEAT1 {
        content: Box<RawRule>,
    },
    FIELD {
        name: String,
        content: Box<RawRule>,
    },
    ALIAS {
        content: Box<RawRule>,
        value: String,
        named: bool,
    },
    TOKEN {
        content: Box<RawRule>,
    },
    IMMEDIATE_TOKEN {
        content: Box<RawRule>,
    },
    PREC {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_LEFT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_RIGHT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_DYNAMIC {
        value: i32,
        content: Box<RawRule>,
    },
    RESERVED {
        context_name: String,
        content: Box<RawRule>,
    },
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        #[allow(clippy::boxed_local)] // Fields are Box<RawRule>, output needs Box<Rule>
        fn conv(content: Box<RawRule>) -> Box<Rule> {
            Box::new(Rule::from(*content))
        }

        match raw {
            RawRule::BLANK => Rule::Blank,
            RawRule::STRING { value } => Rule::String(value),
            RawRule::PATTERN { value, flags } => Rule::Pattern { value, flags },
            RawRule::SYMBOL { name } => Rule::Symbol(name),
            RawRule::SEQ { members } => Rule::Seq(members.into_iter().map(Into::into).collect()),
            RawRule::CHOICE { members } => {
                Rule::Choice(members.into_iter().map(Into::into).collect())
            }
            RawRule::REPEAT { content } => Rule::Repeat(conv(content)),
            RawRule::REPEAT1 { content } => Rule::Repeat1(conv(content)),
            RawRule::FIELD { name, content } => Rule::Field {
                name,
                content: conv(content),
            },
            RawRule::ALIAS {
                content,
                value,
                named,
            } => Rule::Alias {
                content: conv(content),
                value,
                named,
            },
            RawRule::TOKEN { content } => Rule::Token(conv(content)),
            RawRule::IMMEDIATE_TOKEN { content } => Rule::ImmediateToken(conv(content)),
            RawRule::PREC { value, content } => Rule::Prec {
                value: value.into(),
                content: conv(content),
            },
            RawRule::PREC_LEFT { value, content } => Rule::PrecLeft {
                value: value.into(),
                content: conv(content),
            },
            RawRule::PREC_RIGHT { value, content } => Rule::PrecRight {
                value: value.into(),
                content: conv(content),
            },
            RawRule::PREC_DYNAMIC { value, content } => Rule::PrecDynamic {
                value,
                content: conv(content),
            },
            RawRule::RESERVED {
                context_name,
                content,
            } => Rule::Reserved {
                context_name,
                content: conv(content),
            },
        }
    }
}

impl From<&Rule> for RawRule {
    fn from(rule: &Rule) -> Self {
        fn conv(content: &Rule) -> Box<RawRule> {
            Box::new(RawRule::from(content))
        }

        match rule {
            Rule::Blank => RawRule::BLANK,
            Rule::String(value) => RawRule::STRING {
                value: value.clone(),
            },
            Rule::Pattern { value, flags } => RawRule::PATTERN {
                value: value.clone(),
                flags: flags.clone(),
            },
            Rule::Symbol(name) => RawRule::SYMBOL { name: name.clone() },
            Rule::Seq(members) => RawRule::SEQ {
                members: members.iter().map(Into::into).collect(),
            },
            Rule::Choice(members) => RawRule::CHOICE {
                members: members.iter().map(Into::into).collect(),
            },
            Rule::Repeat(content) => RawRule::REPEAT {
                content: conv(content),
            },
            Rule::Repeat1(content) => RawRule::REPEAT1 {
                content: conv(content),
            },
            Rule::Field { name, content } => RawRule::FIELD {
                name: name.clone(),
                content: conv(content),
            },
            Rule::Alias {
                content,
                value,
                named,
            } => RawRule::ALIAS {
                content: conv(content),
                value: value.clone(),
                named: *named,
            },
            Rule::Token(content) => RawRule::TOKEN {
                content: conv(content),
            },
            Rule::ImmediateToken(content) => RawRule::IMMEDIATE_TOKEN {
                content: conv(content),
            },
            Rule::Prec { value, content } => RawRule::PREC {
                value: value.into(),
                content: conv(content),
            },
            Rule::PrecLeft { value, content } => RawRule::PREC_LEFT {
                value: value.into(),
                content: conv(content),
            },
            Rule::PrecRight { value, content } => RawRule::PREC_RIGHT {
                value: value.into(),
                content: conv(content),
            },
            Rule::PrecDynamic { value, content } => RawRule::PREC_DYNAMIC {
                value: *value,
                content: conv(content),
            },
            Rule::Reserved {
                context_name,
                content,
            } => RawRule::RESERVED {
                context_name: context_name.clone(),
                content: conv(content),
            },
        }
    }
}

/// Raw precedence value (can be integer or string).
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPrecedence {
    Integer(i32),
    Name(String),
}

impl From<RawPrecedence> for Precedence {
    fn from(raw: RawPrecedence) -> Self {
        match raw {
            RawPrecedence::Integer(n) => Precedence::Integer(n),
            RawPrecedence::Name(s) => Precedence::Name(s),
        }
    }
}

impl From<&Precedence> for RawPrecedence {
    fn from(prec: &Precedence) -> Self {
        match prec {
            Precedence::Integer(n) => RawPrecedence::Integer(*n),
            Precedence::Name(s) => RawPrecedence::Name(s.clone()),
        }
    }
}

/// Raw precedence entry (STRING or SYMBOL).
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms)]
enum RawPrecedenceEntry {
    STRING { value: String },
    SYMBOL { name: String },
}

impl From<RawPrecedenceEntry> for PrecedenceEntry {
    fn from(raw: RawPrecedenceEntry) -> Self {
        match raw {
            RawPrecedenceEntry::STRING { value } => PrecedenceEntry::Name(value),
            RawPrecedenceEntry::SYMBOL { name } => PrecedenceEntry::Symbol(name),
        }
    }
}

impl From<&PrecedenceEntry> for RawPrecedenceEntry {
    fn from(entry: &PrecedenceEntry) -> Self {
        match entry {
            PrecedenceEntry::Name(value) => RawPrecedenceEntry::STRING {
                value: value.clone(),
            },
            PrecedenceEntry::Symbol(name) => RawPrecedenceEntry::SYMBOL { name: name.clone() },
        }
    }
}
