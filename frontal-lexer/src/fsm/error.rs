use thiserror::Error;

use super::{StateId, TransitionId};

pub type FsmResult<T> = Result<T, FsmError>;

/// Violations of the automaton invariants. These abort construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("automaton already has an initial state ({existing})")]
    SecondInitialState { existing: String },
    #[error("state {0} does not exist")]
    UnknownState(StateId),
    #[error("transition {0} does not exist")]
    UnknownTransition(TransitionId),
    #[error("state {0} is final but carries no token tag")]
    UntaggedFinal(String),
}

/// Errors raised while importing the textual automaton format. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("line {line}: expected `{expected}`")]
    Expected { line: usize, expected: &'static str },
    #[error("line {line}: `{value}` is not a valid {what}")]
    Invalid {
        line: usize,
        what: &'static str,
        value: String,
    },
    #[error("line {line}: state index {index} is out of range (automaton has {states} states)")]
    StateOutOfRange {
        line: usize,
        index: usize,
        states: usize,
    },
    #[error("line {line}: {states} states exceed the limit of {max}")]
    TooManyStates {
        line: usize,
        states: usize,
        max: usize,
    },
    #[error("every printable character is a transition symbol, none is left for lambda")]
    NoLambdaSymbol,
    #[error("unexpected end of input, expected `{0}`")]
    UnexpectedEnd(&'static str),
    #[error(transparent)]
    Automaton(#[from] FsmError),
}
