//! Recursive descent over query tokens.
//!
//! ```text
//! pattern    = expr | "(" expr predicate* ")"
//! expr       = atom capture*
//! atom       = "_" | string | "(" test item* ")" | "[" expr+ "]"
//! test       = "_" | kind | "MISSING" (kind | string)?
//! item       = "." | "!" field | (field ":")? atom quantifier? capture* | predicate
//! predicate  = "(" "#" name (capture | string)* ")"
//! ```

use regex_automata::meta::Regex;
use thicket_table::FieldId;

use super::error::{QueryError, QueryErrorKind};
use super::lexer::{Token, TokenKind, unescape};
use super::predicate::{Operand, Predicate};
use crate::language::Language;

#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    pub expr: Expr,
    pub predicates: Vec<Predicate>,
    pub start_byte: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct Expr {
    pub kind: ExprKind,
    pub captures: Vec<u32>,
}

#[derive(Clone, Debug)]
pub(crate) enum ExprKind {
    Node(NodePattern),
    Alternation(Vec<Expr>),
}

#[derive(Clone, Debug)]
pub(crate) struct NodePattern {
    pub test: NodeTest,
    pub items: Vec<Item>,
    pub negated_fields: Vec<FieldId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeTest {
    /// `_`
    Any,
    /// `(_)`
    AnyNamed,
    Kind { name: String, named: bool },
    /// `(MISSING)`, optionally restricted to one kind.
    Missing(Option<(String, bool)>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Clone, Debug)]
pub(crate) enum Item {
    Child {
        field: Option<FieldId>,
        expr: Expr,
        quantifier: Quantifier,
    },
    Anchor,
}

pub(crate) struct QueryParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    language: &'a Language,
    captures: Vec<String>,
    predicates: Vec<Predicate>,
}

impl<'a> QueryParser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>, language: &'a Language) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            language,
            captures: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// All patterns, plus the capture names they use.
    pub fn parse(mut self) -> Result<(Vec<Pattern>, Vec<String>), QueryError> {
        let mut patterns = Vec::new();
        while self.peek().is_some() {
            let start_byte = self.offset();
            let expr = self.top_level()?;
            patterns.push(Pattern {
                expr,
                predicates: std::mem::take(&mut self.predicates),
                start_byte,
            });
        }
        Ok((patterns, self.captures))
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.span.start)
    }

    fn text(&self) -> &'a str {
        self.tokens
            .get(self.pos)
            .map_or("", |t| &self.source[t.span.clone()])
    }

    fn bump(&mut self) -> &'a str {
        let text = self.text();
        self.pos += 1;
        text
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'a str, QueryError> {
        if self.peek() != Some(kind) {
            return Err(self.unexpected(what));
        }
        Ok(self.bump())
    }

    fn unexpected(&self, what: &str) -> QueryError {
        match self.peek() {
            Some(_) => QueryError::syntax(self.offset(), format!("expected {what}, found `{}`", self.text())),
            None => QueryError::syntax(self.offset(), format!("expected {what}, found end of query")),
        }
    }

    fn top_level(&mut self) -> Result<Expr, QueryError> {
        // `((pattern) @cap (#pred? ...))` groups a pattern with its predicates
        if self.peek() == Some(TokenKind::ParenOpen)
            && matches!(
                self.peek_nth(1),
                Some(TokenKind::ParenOpen | TokenKind::BracketOpen | TokenKind::String)
            )
        {
            let open = self.offset();
            self.bump();
            let mut expr = None;
            while self.peek() != Some(TokenKind::ParenClose) {
                if self.at_predicate() {
                    self.predicate()?;
                    continue;
                }
                if expr.is_some() {
                    return Err(QueryError::syntax(self.offset(), "sibling sequences are not supported"));
                }
                let mut inner = self.atom()?;
                self.captures_into(&mut inner);
                expr = Some(inner);
            }
            self.bump();
            let mut expr = expr.ok_or_else(|| QueryError::syntax(open, "empty pattern group"))?;
            self.captures_into(&mut expr);
            return Ok(expr);
        }

        let mut expr = self.atom()?;
        if matches!(
            self.peek(),
            Some(TokenKind::Question | TokenKind::Star | TokenKind::Plus)
        ) {
            return Err(QueryError::syntax(self.offset(), "quantifiers need an enclosing node"));
        }
        self.captures_into(&mut expr);
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, QueryError> {
        let kind = match self.peek() {
            Some(TokenKind::ParenOpen) => ExprKind::Node(self.node()?),
            Some(TokenKind::BracketOpen) => {
                self.bump();
                let mut alternatives = Vec::new();
                while self.peek() != Some(TokenKind::BracketClose) {
                    if self.peek().is_none() {
                        return Err(self.unexpected("`]`"));
                    }
                    let mut alternative = self.atom()?;
                    self.captures_into(&mut alternative);
                    alternatives.push(alternative);
                }
                self.bump();
                if alternatives.is_empty() {
                    return Err(QueryError::syntax(self.offset(), "empty alternation"));
                }
                ExprKind::Alternation(alternatives)
            }
            Some(TokenKind::String) => {
                let offset = self.offset();
                let name = unescape(self.bump());
                self.check_kind(&name, false, offset)?;
                ExprKind::Node(NodePattern {
                    test: NodeTest::Kind { name, named: false },
                    items: Vec::new(),
                    negated_fields: Vec::new(),
                })
            }
            Some(TokenKind::Id) if self.text() == "_" => {
                self.bump();
                ExprKind::Node(NodePattern {
                    test: NodeTest::Any,
                    items: Vec::new(),
                    negated_fields: Vec::new(),
                })
            }
            _ => return Err(self.unexpected("a pattern")),
        };
        Ok(Expr {
            kind,
            captures: Vec::new(),
        })
    }

    fn node(&mut self) -> Result<NodePattern, QueryError> {
        self.expect(TokenKind::ParenOpen, "`(`")?;
        let offset = self.offset();
        let name = self.expect(TokenKind::Id, "a node kind")?;
        let test = match name {
            "_" => NodeTest::AnyNamed,
            "MISSING" => match self.peek() {
                Some(TokenKind::Id) => {
                    let offset = self.offset();
                    let kind = self.bump().to_owned();
                    self.check_kind(&kind, true, offset)?;
                    NodeTest::Missing(Some((kind, true)))
                }
                Some(TokenKind::String) => {
                    let offset = self.offset();
                    let kind = unescape(self.bump());
                    self.check_kind(&kind, false, offset)?;
                    NodeTest::Missing(Some((kind, false)))
                }
                _ => NodeTest::Missing(None),
            },
            name => {
                self.check_kind(name, true, offset)?;
                NodeTest::Kind {
                    name: name.to_owned(),
                    named: true,
                }
            }
        };

        let mut items = Vec::new();
        let mut negated_fields = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::ParenClose) => {
                    self.bump();
                    break;
                }
                None => return Err(self.unexpected("`)`")),
                Some(TokenKind::Dot) => {
                    self.bump();
                    items.push(Item::Anchor);
                }
                Some(TokenKind::Negation) => {
                    self.bump();
                    let offset = self.offset();
                    let field = self.expect(TokenKind::Id, "a field name")?;
                    negated_fields.push(self.field(field, offset)?);
                }
                _ if self.at_predicate() => self.predicate()?,
                _ => items.push(self.child()?),
            }
        }
        Ok(NodePattern {
            test,
            items,
            negated_fields,
        })
    }

    fn child(&mut self) -> Result<Item, QueryError> {
        let field = if self.peek() == Some(TokenKind::Id) && self.peek_nth(1) == Some(TokenKind::Colon) {
            let offset = self.offset();
            let name = self.bump();
            self.bump();
            Some(self.field(name, offset)?)
        } else {
            None
        };
        let mut expr = self.atom()?;
        let quantifier = match self.peek() {
            Some(TokenKind::Question) => Quantifier::ZeroOrOne,
            Some(TokenKind::Star) => Quantifier::ZeroOrMore,
            Some(TokenKind::Plus) => Quantifier::OneOrMore,
            _ => Quantifier::One,
        };
        if quantifier != Quantifier::One {
            self.bump();
        }
        self.captures_into(&mut expr);
        Ok(Item::Child {
            field,
            expr,
            quantifier,
        })
    }

    fn captures_into(&mut self, expr: &mut Expr) {
        while self.peek() == Some(TokenKind::Capture) {
            let name = &self.bump()[1..];
            expr.captures.push(self.intern_capture(name));
        }
    }

    fn intern_capture(&mut self, name: &str) -> u32 {
        match self.captures.iter().position(|c| c == name) {
            Some(index) => index as u32,
            None => {
                self.captures.push(name.to_owned());
                self.captures.len() as u32 - 1
            }
        }
    }

    fn at_predicate(&self) -> bool {
        self.peek() == Some(TokenKind::ParenOpen) && self.peek_nth(1) == Some(TokenKind::Predicate)
    }

    fn predicate(&mut self) -> Result<(), QueryError> {
        self.bump();
        let offset = self.offset();
        let name = &self.bump()[1..];
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::ParenClose) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::Capture) => {
                    let arg_offset = self.offset();
                    let capture = &self.bump()[1..];
                    let index = self
                        .captures
                        .iter()
                        .position(|c| c == capture)
                        .ok_or_else(|| QueryError::new(arg_offset, QueryErrorKind::Capture(capture.to_owned())))?;
                    args.push(Operand::Capture(index as u32));
                }
                Some(TokenKind::String) => args.push(Operand::Literal(unescape(self.bump()))),
                _ => return Err(self.unexpected("a capture, a string or `)`")),
            }
        }

        let arity = |expected: &'static str| {
            QueryError::new(
                offset,
                QueryErrorKind::PredicateArguments {
                    name: name.to_owned(),
                    expected,
                },
            )
        };
        let predicate = match name {
            "eq?" | "not-eq?" => {
                let [Operand::Capture(capture), operand] = <[Operand; 2]>::try_from(args)
                    .map_err(|_| arity("a capture and a capture or string"))?
                else {
                    return Err(arity("a capture and a capture or string"));
                };
                Predicate::Eq {
                    capture,
                    operand,
                    negated: name == "not-eq?",
                }
            }
            "match?" | "not-match?" => {
                let [Operand::Capture(capture), Operand::Literal(pattern)] =
                    <[Operand; 2]>::try_from(args).map_err(|_| arity("a capture and a regex string"))?
                else {
                    return Err(arity("a capture and a regex string"));
                };
                let regex = Regex::new(&pattern).map_err(|e| {
                    QueryError::new(
                        offset,
                        QueryErrorKind::Regex {
                            pattern: pattern.clone(),
                            message: e.to_string(),
                        },
                    )
                })?;
                Predicate::Match {
                    capture,
                    regex,
                    negated: name == "not-match?",
                }
            }
            _ => return Err(QueryError::new(offset, QueryErrorKind::Predicate(name.to_owned()))),
        };
        self.predicates.push(predicate);
        Ok(())
    }

    fn check_kind(&self, name: &str, named: bool, offset: usize) -> Result<(), QueryError> {
        let table = self.language.table();
        let known = table.symbol_for_name(name, named).is_some()
            || table.aliases.iter().any(|a| a.name == name && a.named == named);
        if known {
            Ok(())
        } else {
            Err(QueryError::new(offset, QueryErrorKind::NodeKind(name.to_owned())))
        }
    }

    fn field(&self, name: &str, offset: usize) -> Result<FieldId, QueryError> {
        self.language
            .field_id(name)
            .ok_or_else(|| QueryError::new(offset, QueryErrorKind::Field(name.to_owned())))
    }
}
