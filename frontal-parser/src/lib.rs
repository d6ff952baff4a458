//! Grammar model, FIRST/FOLLOW sets, the LL(1) driver and the scope builder fed by the
//! driver's action symbols.

use serde::{Deserialize, Serialize};

#[cfg(test)]
use proptest_derive::Arbitrary;

pub use grammar::{Grammar, GrammarBuilder, GrammarError, Production, ProductionId, Sets, Vocabulary};
pub use parser::{
    ll1::{ActionHandler, Ll1},
    report::{ParseReport, Snapshot},
    error::{Recovery, SyntaxError},
    table::{Conflict, ParseTable},
};
pub use semantic::{
    table::{Entry, EntryKind, Forest, SymbolTable, TableId},
    Redeclaration, ScopeBuilder,
};

pub mod grammar;
pub mod parser;
pub mod semantic;

/// Represents a single terminal, nonterminal, epsilon or action in the body of a
/// [`Production`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Symbol {
    /// Matched against the tag of an input token.
    Terminal(String),
    NonTerminal(String),
    Epsilon,
    /// Fires a semantic action when popped. Never matched against input.
    Action(ActionKind),
}

impl Symbol {
    pub fn terminal(value: impl Into<String>) -> Self {
        Self::Terminal(value.into())
    }

    pub fn non_terminal(name: impl Into<String>) -> Self {
        Self::NonTerminal(name.into())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "'{}'", t),
            Symbol::NonTerminal(n) => write!(f, "{}", n),
            Symbol::Epsilon => write!(f, "EPSILON"),
            Symbol::Action(a) => write!(f, "{}", a.name()),
        }
    }
}

/// Element of FIRST and FOLLOW sets, and the lookahead column of the parse table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Lookahead {
    T(String),
    Epsilon,
    /// End of input.
    Eof,
}

impl Lookahead {
    pub fn terminal(value: impl Into<String>) -> Self {
        Self::T(value.into())
    }
}

impl std::fmt::Display for Lookahead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookahead::T(t) => write!(f, "{}", t),
            Lookahead::Epsilon => write!(f, "ε"),
            Lookahead::Eof => write!(f, "$"),
        }
    }
}

/// Semantic actions that can be embedded in grammar productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateGlobalTable,
    CreateClassTableAndEntry,
    CreateFunctionEntryAndTable,
    CreateProgramEntryAndTable,
    /// Leaves the current scope.
    Parent,
    BeginType,
    MoreType,
    CreateVariableEntry,
    CreateParameterEntry,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::CreateGlobalTable,
        ActionKind::CreateClassTableAndEntry,
        ActionKind::CreateFunctionEntryAndTable,
        ActionKind::CreateProgramEntryAndTable,
        ActionKind::Parent,
        ActionKind::BeginType,
        ActionKind::MoreType,
        ActionKind::CreateVariableEntry,
        ActionKind::CreateParameterEntry,
    ];

    /// Name the action is registered under by default.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::CreateGlobalTable => "create_global_table",
            ActionKind::CreateClassTableAndEntry => "create_class_table_and_entry",
            ActionKind::CreateFunctionEntryAndTable => "create_function_entry_and_table",
            ActionKind::CreateProgramEntryAndTable => "create_program_entry_and_table",
            ActionKind::Parent => "parent",
            ActionKind::BeginType => "begin_type",
            ActionKind::MoreType => "more_type",
            ActionKind::CreateVariableEntry => "create_variable_entry",
            ActionKind::CreateParameterEntry => "create_parameter_entry",
        }
    }
}
