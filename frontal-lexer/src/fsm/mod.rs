pub use self::{
    automaton::{Automaton, Read, Run, State, Status, Transition},
    error::{FormatError, FsmError, FsmResult},
    text::{FormatReader, FormatResult, MAX_STATES},
};

/// Stable id of a state within its [`Automaton`].
pub type StateId = usize;
/// Stable id of a transition within its [`Automaton`].
pub type TransitionId = usize;

mod automaton;
mod dot;
mod error;
mod store;
mod text;
