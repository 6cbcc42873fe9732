/// Grammar compilation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("grammar has no rules")]
    NoRules,
    #[error("undefined symbol `{name}` referenced from `{rule}`")]
    UndefinedSymbol { name: String, rule: String },
    #[error("start rule `{0}` must not be a token")]
    LexicalStartRule(String),
    #[error("extra `{0}` must be a token or a token rule")]
    NonTokenExtra(String),
    #[error("external `{0}` must be a symbol or a string")]
    InvalidExternal(String),
    #[error("word rule `{0}` must be a token rule")]
    NonTokenWord(String),
    #[error("symbol `{symbol}` cannot appear inside a token in `{rule}`")]
    SymbolInToken { symbol: String, rule: String },
    #[error("invalid regex /{pattern}/: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("token `{0}` matches the empty string")]
    EmptyToken(String),
    #[error("undefined precedence `{0}`")]
    UndefinedPrecedence(String),
    #[error("rule `{0}` expands into more than {1} alternatives")]
    TooManyAlternatives(String, usize),
    #[error("inline rule `{0}` is recursive or nested too deeply")]
    RecursiveInline(String),
    #[error("too many {what}: {count}")]
    TooLarge { what: &'static str, count: usize },
    #[error("lexer automaton: {0}")]
    Automaton(String),
    #[error("table encoding: {0}")]
    Table(String),
}
