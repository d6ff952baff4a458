//! Finite automata and the dense-table scanner compiled from them.
//!
//! An [`Automaton`] is built programmatically or imported from its textual format, then
//! compiled into a [`Scanner`] that splits source text into [`Token`]s.

pub use fsm::{Automaton, FormatError, FsmError, Read, Run, State, StateId, Status, Transition};
pub use scanner::{LexError, Scanner, ScannerConfig, ScannerError, Token, TokenStream};

pub mod fsm;
pub mod scanner;
