use frontal_lexer::Token;
use serde::Serialize;

/// How the driver got back on track after a [`SyntaxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recovery {
    /// The unmatched terminal was popped.
    PopTerminal,
    /// The unmatched terminal was popped and the offending token skipped.
    PopTerminalAndSkip,
    /// The nonterminal was popped because the token may follow it.
    PopNonTerminal,
    /// The token was skipped and the nonterminal kept.
    SkipToken,
    /// The stack was empty, so the remaining input was dropped.
    DiscardInput,
}

/// A syntax error found by the driver. Parsing continues after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    /// Token received by the parser.
    ///
    /// Note: No token being received is the same as receiving end of input.
    pub received: Option<Token>,
    pub expected: Vec<String>,
    pub recovery: Recovery,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.received {
            Some(token) => write!(
                f,
                "[ERROR] ({}, {}): unexpected {} `{}`",
                token.row, token.col, token.tag, token.lexeme
            )?,
            None => write!(f, "[ERROR] (_, _): unexpected end of input")?,
        }
        match self.expected.as_slice() {
            [] => Ok(()),
            [one] => write!(f, ", expected {}", one),
            many => write!(f, ", expected one of {}", many.join(" ")),
        }
    }
}

impl std::error::Error for SyntaxError {}
