use log::{debug, trace};
use serde::Serialize;

use self::input::{CursorToken, LineCursor};
pub use self::{
    config::{ClassHeader, ScannerConfig},
    error::{LexError, ScanResult, ScannerError},
    table::{Class, Row, TransitionTable, DEAD},
};
use crate::fsm::Automaton;

mod config;
mod error;
mod input;
mod table;

/// Suffix of the tag given to characters the table has no way forward for.
const UNRECOGNIZED: &str = "UNRECOGNIZED";

/// [`Token`] returned by the [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    /// Tag of the final state that recognized the token.
    pub tag: String,
    /// Source representation of the token.
    pub lexeme: String,
    /// 1-based line.
    pub row: usize,
    /// 1-based column of the first character.
    pub col: usize,
}

impl Token {
    pub fn new(tag: impl Into<String>, lexeme: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            tag: tag.into(),
            lexeme: lexeme.into(),
            row,
            col,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) {} `{}`",
            self.row, self.col, self.tag, self.lexeme
        )
    }
}

/// Ordered tokens produced by [`Scanner::tokenize`], including error tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TokenStream {
    tokens: Vec<Token>,
    #[serde(skip)]
    error_prefix: String,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, error_prefix: impl Into<String>) -> Self {
        Self {
            tokens,
            error_prefix: error_prefix.into(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_error(&self, token: &Token) -> bool {
        token.tag.starts_with(&self.error_prefix)
    }

    /// Tokens whose tag does not carry the error prefix.
    pub fn valid(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| !self.is_error(t))
    }

    /// Tokens whose tag carries the error prefix.
    pub fn errors(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| self.is_error(t))
    }

    /// Splits the stream into valid and error tokens, keeping their order.
    pub fn partition(self) -> (Vec<Token>, Vec<Token>) {
        let prefix = self.error_prefix;
        self.tokens
            .into_iter()
            .partition(|t| !t.tag.starts_with(&prefix))
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Table-driven scanner compiled from a deterministic [`Automaton`].
#[derive(Debug, Clone)]
pub struct Scanner {
    table: TransitionTable,
    config: ScannerConfig,
}

impl Scanner {
    /// Compiles `fa` into a dense table using the class markers of `config`.
    pub fn new(fa: &Automaton, config: ScannerConfig) -> ScanResult<Self> {
        let table = TransitionTable::build(fa, &config.classes)?;
        Ok(Self { table, config })
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Next table row after reading `raw` in `row`.
    pub fn lookup(&self, row: usize, raw: char) -> usize {
        self.table.lookup(row, raw)
    }

    /// Splits `text` into tokens, line by line.
    ///
    /// Starting from the initial row, characters are fed through the table until a final
    /// row is reached. A final row with the backtrack flag gives the last character back
    /// before the token is taken. Characters that lead back to the initial row are dropped as
    /// separators. A line ends when everything has been read and no token is pending.
    pub fn tokenize(&self, text: &str) -> TokenStream {
        let start = self.table.start();
        let mut tokens = Vec::new();
        let mut lines = text.split('\n').enumerate().peekable();

        while let Some((index, line)) = lines.next() {
            let row = index + 1;
            let line = line.strip_suffix('\r').unwrap_or(line);
            let terminator = if lines.peek().is_some() { '\n' } else { '\0' };
            let mut cursor = LineCursor::new(line, terminator);
            let mut state = start;

            loop {
                if state == start && cursor.exhausted() {
                    break;
                }

                let Some(ch) = cursor.next() else {
                    // the terminator left a token unfinished
                    if cursor.pending() {
                        tokens.push(self.unrecognized(cursor.consume_token(), row));
                    }
                    break;
                };

                let next = self.table.lookup(state, ch);
                let Some(info) = self.table.row(next).filter(|_| next != DEAD) else {
                    tokens.push(self.unrecognized(cursor.consume_token(), row));
                    state = start;
                    continue;
                };

                if info.fin {
                    if info.backtrack {
                        cursor.push_back();
                    }
                    let tag = info.tag.clone().unwrap_or_default();
                    tokens.push(self.make_token(tag, cursor.consume_token(), row));
                    state = start;
                } else if next == start {
                    cursor.discard();
                    state = start;
                } else {
                    state = next;
                }
            }
        }

        debug!("tokenized {} lines into {} tokens", text.split('\n').count(), tokens.len());
        TokenStream::new(tokens, self.config.error_prefix.clone())
    }

    /// Renders the error tokens of `stream` with the configured messages.
    pub fn lex_errors(&self, stream: &TokenStream) -> Vec<LexError> {
        stream
            .errors()
            .map(|token| LexError {
                tag: token.tag.clone(),
                lexeme: token.lexeme.clone(),
                row: token.row,
                col: token.col,
                message: self
                    .config
                    .messages
                    .get(&token.tag)
                    .cloned()
                    .unwrap_or_else(|| format!("lexical error {}", token.tag)),
            })
            .collect()
    }

    fn make_token(&self, tag: String, CursorToken { lexeme, col }: CursorToken, row: usize) -> Token {
        let tag = match (&self.config.identifier_tag, self.config.keywords.get(&lexeme)) {
            (Some(identifier), Some(keyword)) if *identifier == tag => keyword.clone(),
            _ => tag,
        };

        trace!("token {} `{}` at ({}, {})", tag, lexeme, row, col);
        Token {
            tag,
            lexeme,
            row,
            col,
        }
    }

    fn unrecognized(&self, token: CursorToken, row: usize) -> Token {
        let tag = format!("{}{}", self.config.error_prefix, UNRECOGNIZED);
        self.make_token(tag, token, row)
    }
}
