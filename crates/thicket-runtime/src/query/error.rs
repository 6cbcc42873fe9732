/// Query compile error, positioned at a byte offset of the query text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at byte {offset}")]
pub struct QueryError {
    pub offset: usize,
    pub kind: QueryErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryErrorKind {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown node kind `{0}`")]
    NodeKind(String),
    #[error("unknown field `{0}`")]
    Field(String),
    #[error("unknown capture `@{0}`")]
    Capture(String),
    #[error("unknown predicate `#{0}`")]
    Predicate(String),
    #[error("predicate `#{name}` expects {expected}")]
    PredicateArguments { name: String, expected: &'static str },
    #[error("invalid regex `{pattern}`: {message}")]
    Regex { pattern: String, message: String },
}

impl QueryError {
    pub(crate) fn new(offset: usize, kind: QueryErrorKind) -> Self {
        Self { offset, kind }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, QueryErrorKind::Syntax(message.into()))
    }
}
