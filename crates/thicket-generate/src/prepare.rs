//! Grammar preparation: reference checks, token extraction, symbol classes.
//!
//! After this pass every lexical construct of the grammar is a token with a
//! regex, and the remaining syntax only refers to tokens, externals and
//! variables by index.

use std::collections::HashMap;

use thicket_core::{Grammar, Precedence, PrecedenceEntry, Rule};
use thicket_table::TokenKind;

use crate::GenerateError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Sym {
    Token(usize),
    External(usize),
    Variable(usize),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// Syntactic rule with tokens extracted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Syntax {
    Blank,
    Symbol(Sym),
    Seq(Vec<Syntax>),
    Choice(Vec<Syntax>),
    Repeat(Box<Syntax>),
    Repeat1(Box<Syntax>),
    Field {
        name: String,
        content: Box<Syntax>,
    },
    Alias {
        value: String,
        named: bool,
        content: Box<Syntax>,
    },
    Prec {
        value: i32,
        assoc: Assoc,
        content: Box<Syntax>,
    },
    PrecDynamic {
        value: i32,
        content: Box<Syntax>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LexicalToken {
    pub name: String,
    pub visible: bool,
    pub named: bool,
    pub regex: String,
    pub kind: TokenKind,
    /// Literal text for strings, regex source otherwise.
    pub source: String,
    pub precedence: i32,
    pub immediate: bool,
    pub extra: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ExternalToken {
    pub name: String,
    pub visible: bool,
    pub named: bool,
    pub extra: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Variable {
    pub name: String,
    pub visible: bool,
    pub supertype: bool,
    pub inline: bool,
    pub rule: Syntax,
}

#[derive(Clone, Debug)]
pub(crate) struct PreparedGrammar {
    pub name: String,
    pub tokens: Vec<LexicalToken>,
    pub externals: Vec<ExternalToken>,
    /// The start rule is variable 0.
    pub variables: Vec<Variable>,
    /// Separator regexes (extras that are not symbols).
    pub separators: Vec<String>,
    pub word: Option<usize>,
    pub conflicts: Vec<Vec<Sym>>,
}

pub(crate) fn prepare(grammar: &Grammar) -> Result<PreparedGrammar, GenerateError> {
    Preparer::new(grammar)?.run()
}

struct Preparer<'g> {
    grammar: &'g Grammar,
    precedences: HashMap<String, i32>,
    /// Rule name to its class.
    classes: HashMap<&'g str, Sym>,
    tokens: Vec<LexicalToken>,
    externals: Vec<ExternalToken>,
    literals: HashMap<(String, bool, i32), usize>,
    patterns: HashMap<(String, bool, i32), usize>,
    token_counters: HashMap<String, usize>,
}

fn is_lexical(rule: &Rule) -> bool {
    matches!(
        rule.without_precedence(),
        Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_) | Rule::ImmediateToken(_)
    )
}

fn undefined(name: &str, rule: &str) -> GenerateError {
    GenerateError::UndefinedSymbol {
        name: name.to_owned(),
        rule: rule.to_owned(),
    }
}

/// Named precedence levels: earlier entries of an ordering bind tighter.
fn precedence_levels(orderings: &[Vec<PrecedenceEntry>]) -> HashMap<String, i32> {
    let mut levels = HashMap::new();
    for ordering in orderings {
        let n = ordering.len() as i32;
        for (i, entry) in ordering.iter().enumerate() {
            if let PrecedenceEntry::Name(name) = entry {
                levels.entry(name.clone()).or_insert(n - i as i32);
            }
        }
    }
    levels
}

impl<'g> Preparer<'g> {
    fn new(grammar: &'g Grammar) -> Result<Self, GenerateError> {
        if grammar.rules.is_empty() {
            return Err(GenerateError::NoRules);
        }
        Ok(Self {
            grammar,
            precedences: precedence_levels(&grammar.precedences),
            classes: HashMap::new(),
            tokens: Vec::new(),
            externals: Vec::new(),
            literals: HashMap::new(),
            patterns: HashMap::new(),
            token_counters: HashMap::new(),
        })
    }

    fn run(mut self) -> Result<PreparedGrammar, GenerateError> {
        let grammar = self.grammar;
        let (start_name, start_rule) = &grammar.rules[0];
        if is_lexical(start_rule) {
            return Err(GenerateError::LexicalStartRule(start_name.clone()));
        }

        self.declare_externals()?;

        // Token rules first so they take the earliest token slots.
        let mut variable_rules = Vec::new();
        for (name, rule) in &grammar.rules {
            if self.classes.contains_key(name.as_str()) {
                continue;
            }
            if is_lexical(rule) {
                let index = self.token_rule(name, rule)?;
                self.classes.insert(name, Sym::Token(index));
            } else {
                self.classes
                    .insert(name, Sym::Variable(variable_rules.len()));
                variable_rules.push((name, rule));
            }
        }

        for name in grammar.supertypes.iter().chain(&grammar.inline) {
            if !self.classes.contains_key(name.as_str()) {
                return Err(undefined(name, name));
            }
        }

        let mut variables = Vec::with_capacity(variable_rules.len());
        for (name, rule) in variable_rules {
            let syntax = self.convert(rule, name)?;
            let supertype = grammar.supertypes.contains(name);
            variables.push(Variable {
                name: name.clone(),
                visible: !name.starts_with('_') && !supertype,
                supertype,
                inline: grammar.inline.contains(name),
                rule: syntax,
            });
        }

        let separators = self.extras()?;
        let word = self.word()?;
        let conflicts = self.conflicts()?;

        Ok(PreparedGrammar {
            name: grammar.name.clone(),
            tokens: self.tokens,
            externals: self.externals,
            variables,
            separators,
            word,
            conflicts,
        })
    }

    fn declare_externals(&mut self) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        for rule in &grammar.externals {
            let token = match rule {
                Rule::Symbol(name) => ExternalToken {
                    name: name.clone(),
                    visible: !name.starts_with('_'),
                    named: true,
                    extra: false,
                },
                Rule::String(text) => ExternalToken {
                    name: text.clone(),
                    visible: true,
                    named: false,
                    extra: false,
                },
                other => return Err(GenerateError::InvalidExternal(format!("{other:?}"))),
            };
            if let Rule::Symbol(name) = rule {
                self.classes
                    .insert(name.as_str(), Sym::External(self.externals.len()));
            }
            self.externals.push(token);
        }
        Ok(())
    }

    fn precedence(&self, value: &Precedence) -> Result<i32, GenerateError> {
        match value {
            Precedence::Integer(n) => Ok(*n),
            Precedence::Name(name) => self
                .precedences
                .get(name)
                .copied()
                .ok_or_else(|| GenerateError::UndefinedPrecedence(name.clone())),
        }
    }

    /// A rule whose whole body is lexical becomes a named token.
    fn token_rule(&mut self, name: &str, rule: &Rule) -> Result<usize, GenerateError> {
        let mut precedence = None;
        let regex = self.regex(rule, name, &mut precedence)?;
        let body = rule.without_precedence();
        let (kind, source) = match body {
            Rule::String(text) => (TokenKind::String, text.clone()),
            _ => (TokenKind::Pattern, regex.clone()),
        };
        self.tokens.push(LexicalToken {
            name: name.to_owned(),
            visible: !name.starts_with('_'),
            named: true,
            regex,
            kind,
            source,
            precedence: precedence.unwrap_or(0),
            immediate: matches!(body, Rule::ImmediateToken(_)),
            extra: false,
        });
        Ok(self.tokens.len() - 1)
    }

    fn literal(&mut self, text: &str, immediate: bool, precedence: i32) -> usize {
        let key = (text.to_owned(), immediate, precedence);
        if let Some(&index) = self.literals.get(&key) {
            return index;
        }
        self.tokens.push(LexicalToken {
            name: text.to_owned(),
            visible: true,
            named: false,
            regex: regex_syntax::escape(text),
            kind: TokenKind::String,
            source: text.to_owned(),
            precedence,
            immediate,
            extra: false,
        });
        let index = self.tokens.len() - 1;
        self.literals.insert(key, index);
        index
    }

    fn pattern(&mut self, regex: String, immediate: bool, precedence: i32, owner: &str) -> usize {
        let key = (regex.clone(), immediate, precedence);
        if let Some(&index) = self.patterns.get(&key) {
            return index;
        }
        let counter = self.token_counters.entry(owner.to_owned()).or_insert(0);
        *counter += 1;
        self.tokens.push(LexicalToken {
            name: format!("{owner}_token{counter}"),
            visible: false,
            named: false,
            source: regex.clone(),
            regex,
            kind: TokenKind::Pattern,
            precedence,
            immediate,
            extra: false,
        });
        let index = self.tokens.len() - 1;
        self.patterns.insert(key, index);
        index
    }

    /// Regex for a lexical rule. The outermost precedence becomes the lexical precedence.
    fn regex(
        &self,
        rule: &Rule,
        owner: &str,
        precedence: &mut Option<i32>,
    ) -> Result<String, GenerateError> {
        Ok(match rule {
            Rule::Blank => String::new(),
            Rule::String(text) => regex_syntax::escape(text),
            Rule::Pattern { value, flags } => {
                let flags: String = flags
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .filter(|c| matches!(c, 'i' | 's'))
                    .collect();
                if flags.is_empty() {
                    format!("(?:{value})")
                } else {
                    format!("(?{flags}:{value})")
                }
            }
            Rule::Seq(members) => {
                let mut out = String::new();
                for member in members {
                    out.push_str(&self.regex(member, owner, precedence)?);
                }
                out
            }
            Rule::Choice(members) => {
                let parts = members
                    .iter()
                    .map(|m| self.regex(m, owner, precedence))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("(?:{})", parts.join("|"))
            }
            Rule::Repeat(content) => format!("(?:{})*", self.regex(content, owner, precedence)?),
            Rule::Repeat1(content) => format!("(?:{})+", self.regex(content, owner, precedence)?),
            Rule::Prec { value, content }
            | Rule::PrecLeft { value, content }
            | Rule::PrecRight { value, content } => {
                if precedence.is_none() {
                    *precedence = Some(self.precedence(value)?);
                }
                self.regex(content, owner, precedence)?
            }
            Rule::PrecDynamic { content, .. }
            | Rule::Token(content)
            | Rule::ImmediateToken(content)
            | Rule::Field { content, .. }
            | Rule::Alias { content, .. }
            | Rule::Reserved { content, .. } => self.regex(content, owner, precedence)?,
            Rule::Symbol(symbol) => {
                return Err(GenerateError::SymbolInToken {
                    symbol: symbol.clone(),
                    rule: owner.to_owned(),
                });
            }
        })
    }

    fn convert(&mut self, rule: &Rule, owner: &str) -> Result<Syntax, GenerateError> {
        let boxed = |this: &mut Self, content: &Rule| -> Result<Box<Syntax>, GenerateError> {
            Ok(Box::new(this.convert(content, owner)?))
        };
        Ok(match rule {
            Rule::Blank => Syntax::Blank,
            Rule::String(text) => Syntax::Symbol(Sym::Token(self.literal(text, false, 0))),
            Rule::Pattern { .. } => {
                let regex = self.regex(rule, owner, &mut None)?;
                Syntax::Symbol(Sym::Token(self.pattern(regex, false, 0, owner)))
            }
            Rule::Symbol(name) => match self.classes.get(name.as_str()) {
                Some(&sym) => Syntax::Symbol(sym),
                None => return Err(undefined(name, owner)),
            },
            Rule::Seq(members) => Syntax::Seq(
                members
                    .iter()
                    .map(|m| self.convert(m, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::Choice(members) => Syntax::Choice(
                members
                    .iter()
                    .map(|m| self.convert(m, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::Repeat(content) => Syntax::Repeat(boxed(self, content)?),
            Rule::Repeat1(content) => Syntax::Repeat1(boxed(self, content)?),
            Rule::Field { name, content } => Syntax::Field {
                name: name.clone(),
                content: boxed(self, content)?,
            },
            Rule::Alias {
                content,
                value,
                named,
            } => Syntax::Alias {
                value: value.clone(),
                named: *named,
                content: boxed(self, content)?,
            },
            Rule::Token(content) | Rule::ImmediateToken(content) => {
                let immediate = matches!(rule, Rule::ImmediateToken(_));
                let mut precedence = None;
                let regex = self.regex(content, owner, &mut precedence)?;
                let index = match content.without_precedence() {
                    Rule::String(text) => self.literal(text, immediate, precedence.unwrap_or(0)),
                    _ => self.pattern(regex, immediate, precedence.unwrap_or(0), owner),
                };
                Syntax::Symbol(Sym::Token(index))
            }
            Rule::Prec { value, content } => Syntax::Prec {
                value: self.precedence(value)?,
                assoc: Assoc::None,
                content: boxed(self, content)?,
            },
            Rule::PrecLeft { value, content } => Syntax::Prec {
                value: self.precedence(value)?,
                assoc: Assoc::Left,
                content: boxed(self, content)?,
            },
            Rule::PrecRight { value, content } => Syntax::Prec {
                value: self.precedence(value)?,
                assoc: Assoc::Right,
                content: boxed(self, content)?,
            },
            Rule::PrecDynamic { value, content } => Syntax::PrecDynamic {
                value: *value,
                content: boxed(self, content)?,
            },
            Rule::Reserved { content, .. } => self.convert(content, owner)?,
        })
    }

    fn extras(&mut self) -> Result<Vec<String>, GenerateError> {
        let grammar = self.grammar;
        let mut separators = Vec::new();
        for extra in &grammar.extras {
            match extra {
                Rule::Symbol(name) => match self.classes.get(name.as_str()) {
                    Some(&Sym::Token(index)) => self.tokens[index].extra = true,
                    Some(&Sym::External(index)) => self.externals[index].extra = true,
                    Some(&Sym::Variable(_)) => {
                        return Err(GenerateError::NonTokenExtra(name.clone()));
                    }
                    None => return Err(undefined(name, "extras")),
                },
                rule if is_lexical(rule) => {
                    separators.push(self.regex(rule, "extras", &mut None)?);
                }
                other => return Err(GenerateError::NonTokenExtra(format!("{other:?}"))),
            }
        }
        Ok(separators)
    }

    fn word(&self) -> Result<Option<usize>, GenerateError> {
        let Some(name) = &self.grammar.word else {
            return Ok(None);
        };
        match self.classes.get(name.as_str()) {
            Some(&Sym::Token(index)) => Ok(Some(index)),
            Some(_) => Err(GenerateError::NonTokenWord(name.clone())),
            None => Err(undefined(name, "word")),
        }
    }

    fn conflicts(&self) -> Result<Vec<Vec<Sym>>, GenerateError> {
        self.grammar
            .conflicts
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        self.classes
                            .get(name.as_str())
                            .copied()
                            .ok_or_else(|| undefined(name, "conflicts"))
                    })
                    .collect()
            })
            .collect()
    }
}
