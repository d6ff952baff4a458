//! End-to-end pipeline: the automaton-driven scanner feeds the LL(1) parser, whose action
//! symbols build the symbol tables.

use frontal_lexer::{
    scanner::{LexError, Scanner, ScannerConfig, ScannerError, Token, TokenStream},
    Automaton, FormatError,
};
use frontal_parser::{
    Forest, Grammar, GrammarError, Ll1, ParseReport, Redeclaration, ScopeBuilder, Vocabulary,
};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::config::FrontalConfig;

pub mod config;

/// Reasons a [`FrontEnd`] cannot be assembled.
#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("invalid automaton")]
    Automaton(#[from] FormatError),
    #[error("automaton cannot drive a scanner")]
    Scanner(#[from] ScannerError),
    #[error("invalid grammar")]
    Grammar(#[from] GrammarError),
}

/// Everything one compilation produced.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    /// Every token, lexical errors included.
    pub tokens: TokenStream,
    pub lex_errors: Vec<LexError>,
    pub report: ParseReport,
    pub tables: Forest,
    pub redeclarations: Vec<Redeclaration>,
}

impl Compilation {
    /// Whether the program was accepted without any lexical, syntax or semantic error.
    pub fn is_clean(&self) -> bool {
        self.report.accepted && self.lex_errors.is_empty() && self.redeclarations.is_empty()
    }
}

/// Scanner and parser for one language, built from an automaton and a grammar.
#[derive(Debug, Clone)]
pub struct FrontEnd {
    automaton: Automaton,
    scanner: Scanner,
    parser: Ll1,
}

impl FrontEnd {
    /// Reads the automaton and grammar text formats and compiles them with `config`.
    pub fn new(automaton: &str, grammar: &str, config: &FrontalConfig) -> Result<Self, FrontEndError> {
        let automaton = automaton.parse::<Automaton>()?;
        let grammar = Grammar::parse(grammar, config.vocabulary())?;
        Self::from_parts(automaton, config.scanner_config(), grammar)
    }

    pub fn from_parts(
        automaton: Automaton,
        scanner: ScannerConfig,
        grammar: Grammar,
    ) -> Result<Self, FrontEndError> {
        let scanner = Scanner::new(&automaton, scanner)?;
        let parser = Ll1::new(grammar);

        if !parser.table().is_ll1() {
            info!(
                "grammar is not LL(1), {} conflicts",
                parser.table().conflicts().len()
            );
        }

        Ok(Self {
            automaton,
            scanner,
            parser,
        })
    }

    /// Same as [`FrontEnd::new`] with the default action names.
    pub fn with_defaults(automaton: &str, grammar: &str, scanner: ScannerConfig) -> Result<Self, FrontEndError> {
        let automaton = automaton.parse::<Automaton>()?;
        let grammar = Grammar::parse(grammar, &Vocabulary::default())?;
        Self::from_parts(automaton, scanner, grammar)
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn parser(&self) -> &Ll1 {
        &self.parser
    }

    pub fn tokenize(&self, text: &str) -> TokenStream {
        self.scanner.tokenize(text)
    }

    /// Scans `text`, then parses the valid tokens with the scope builder attached. Error
    /// tokens are reported but never reach the parser.
    pub fn compile(&self, text: &str) -> Compilation {
        let tokens = self.scanner.tokenize(text);
        let lex_errors = self.scanner.lex_errors(&tokens);
        let valid = tokens.valid().cloned().collect::<Vec<Token>>();

        let mut builder = ScopeBuilder::new();
        let report = self.parser.parse_with(&valid, &mut builder);
        let (tables, redeclarations) = builder.into_parts();

        debug!(
            "compiled {} tokens: {} lexical errors, {} syntax errors, {} redeclarations",
            tokens.len(),
            lex_errors.len(),
            report.errors().count(),
            redeclarations.len()
        );

        Compilation {
            tokens,
            lex_errors,
            report,
            tables,
            redeclarations,
        }
    }
}
