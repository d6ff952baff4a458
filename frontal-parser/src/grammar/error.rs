use thiserror::Error;

pub type GrammarResult<T> = Result<T, GrammarError>;

/// Errors raised while building a grammar or reading the grammar text format. Line numbers
/// are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("line {line}: expected `->` after the left-hand side")]
    MissingArrow { line: usize },
    #[error("line {line}: `{name}` cannot be used as a left-hand side")]
    InvalidHead { line: usize, name: String },
    #[error("line {line}: `{word}` is not a nonterminal, action or EPSILON")]
    InvalidWord { line: usize, word: String },
    #[error("line {line}: unterminated literal")]
    UnterminatedLiteral { line: usize },
    #[error("line {line}: empty literal")]
    EmptyLiteral { line: usize },
    #[error("line {line}: alternative without a left-hand side")]
    DanglingAlternative { line: usize },
    #[error("grammar has no productions")]
    Empty,
    #[error("start symbol {0} has no productions")]
    UnknownStart(String),
    #[error("nonterminal {0} is used but never defined")]
    Undefined(String),
}
