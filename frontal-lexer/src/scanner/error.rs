use serde::Serialize;
use thiserror::Error;

use crate::fsm::FsmError;

pub type ScanResult<T> = Result<T, ScannerError>;

/// Reasons an automaton cannot be compiled into a dense transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    #[error(transparent)]
    Automaton(#[from] FsmError),
    #[error("automaton has no initial state")]
    NoInitialState,
    #[error("state {state} has a lambda transition")]
    LambdaTransition { state: String },
    #[error("literal {0:?} is always classified as a character class and can never be read")]
    ShadowedLiteral(char),
    #[error("state {state} has more than one transition on {class}")]
    Nondeterministic { state: String, class: String },
    #[error("state {state} is not final and has no `other` transition")]
    MissingOther { state: String },
}

/// A lexical error token rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexError {
    pub tag: String,
    pub lexeme: String,
    pub row: usize,
    pub col: usize,
    pub message: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[ERROR] ({}, {}): {} `{}`",
            self.row, self.col, self.message, self.lexeme
        )
    }
}

impl std::error::Error for LexError {}
