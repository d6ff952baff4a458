use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};
use serde::Serialize;

#[cfg(test)]
use proptest_derive::Arbitrary;

use super::{
    error::{FsmError, FsmResult},
    store::{Edge, Store},
    StateId, TransitionId,
};

/// Role of a [`State`] in its automaton. The initial and final bits are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Status {
    Normal,
    Initial,
    Final,
    InitialFinal,
}

impl Status {
    pub fn is_initial(self) -> bool {
        matches!(self, Status::Initial | Status::InitialFinal)
    }

    pub fn is_final(self) -> bool {
        matches!(self, Status::Final | Status::InitialFinal)
    }

    fn from_bits(initial: bool, fin: bool) -> Self {
        match (initial, fin) {
            (false, false) => Status::Normal,
            (true, false) => Status::Initial,
            (false, true) => Status::Final,
            (true, true) => Status::InitialFinal,
        }
    }

    fn with_initial(self, initial: bool) -> Self {
        Self::from_bits(initial, self.is_final())
    }

    fn with_final(self, fin: bool) -> Self {
        Self::from_bits(self.is_initial(), fin)
    }
}

/// A state of an [`Automaton`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    /// Display name, `<prefix><id>`.
    name: String,
    status: Status,
    /// Token tag emitted by the scanner when this (final) state is reached.
    tag: Option<String>,
    /// Whether the lexeme recognized by this state over-read one lookahead character.
    backtrack: bool,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn backtrack(&self) -> bool {
        self.backtrack
    }

    pub fn is_initial(&self) -> bool {
        self.status.is_initial()
    }

    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }
}

/// What a transition reads from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Read {
    Symbol(char),
    /// Empty-string transition, taken without consuming input.
    Lambda,
}

/// A labeled edge between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub read: Read,
}

impl From<&Edge<Read>> for Transition {
    fn from(edge: &Edge<Read>) -> Self {
        Self {
            from: edge.from,
            to: edge.to,
            read: edge.label,
        }
    }
}

/// Result of simulating an [`Automaton`] on an input string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub accepted: bool,
    /// Transitions taken by the first accepting path. Empty when the input is rejected.
    pub path: Vec<Transition>,
}

/// Finite automaton over characters with optional lambda transitions.
///
/// The automaton owns all of its states and transitions. At most one state carries the
/// initial bit at any time.
#[derive(Debug, Clone)]
pub struct Automaton {
    /// Character prepended to state ids to form display names.
    prefix: char,
    store: Store<State, Read>,
    initial: Option<StateId>,
}

impl Automaton {
    /// Creates an empty automaton whose states are named `<prefix><id>`.
    pub fn new(prefix: char) -> Self {
        Self {
            prefix,
            store: Store::new(),
            initial: None,
        }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Adds a new state with the given status. Final states are made with
    /// [`Automaton::add_final_state`], which tags them.
    ///
    /// # Fails
    ///
    /// When `status` carries the final bit, or carries the initial bit and the automaton
    /// already has an initial state.
    pub fn add_state(&mut self, status: Status) -> FsmResult<StateId> {
        let name = format!("{}{}", self.prefix, self.store.next_vertex_id());
        if status.is_final() {
            return Err(FsmError::UntaggedFinal(name));
        }
        if status.is_initial() {
            if let Some(existing) = self.initial {
                return Err(FsmError::SecondInitialState {
                    existing: self.name_of(existing),
                });
            }
        }

        let id = self.store.add_vertex(State {
            name,
            status,
            tag: None,
            backtrack: false,
        });

        if status.is_initial() {
            self.initial = Some(id);
        }

        Ok(id)
    }

    pub fn add_transition(&mut self, from: StateId, to: StateId, read: Read) -> FsmResult<TransitionId> {
        self.store.add_edge(from, to, read).ok_or_else(|| {
            FsmError::UnknownState(if self.store.contains_vertex(from) { to } else { from })
        })
    }

    /// Removes a state and every transition incident to it.
    pub fn remove_state(&mut self, id: StateId) -> FsmResult<State> {
        let state = self.store.remove_vertex(id).ok_or(FsmError::UnknownState(id))?;
        if self.initial == Some(id) {
            self.initial = None;
        }
        Ok(state)
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> FsmResult<Transition> {
        let transition = self
            .store
            .edge(id)
            .map(Transition::from)
            .ok_or(FsmError::UnknownTransition(id))?;
        self.store.remove_edge(id);
        Ok(transition)
    }

    /// Makes `id` the initial state, demoting the previous one. Does nothing when `id` is
    /// already initial.
    pub fn choose_initial_state(&mut self, id: StateId) -> FsmResult<()> {
        if !self.store.contains_vertex(id) {
            return Err(FsmError::UnknownState(id));
        }
        if self.initial == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.initial.take() {
            if let Some(state) = self.store.vertex_mut(previous) {
                state.status = state.status.with_initial(false);
            }
        }

        let state = self.state_mut(id)?;
        state.status = state.status.with_initial(true);
        self.initial = Some(id);
        Ok(())
    }

    /// Sets the final bit of a state and tags it with the token it recognizes.
    pub fn add_final_state(&mut self, id: StateId, tag: impl Into<String>) -> FsmResult<()> {
        let state = self.state_mut(id)?;
        state.status = state.status.with_final(true);
        state.tag = Some(tag.into());
        Ok(())
    }

    /// Clears the final bit of a state along with its tag and backtrack flag.
    pub fn remove_final_state(&mut self, id: StateId) -> FsmResult<()> {
        let state = self.state_mut(id)?;
        state.status = state.status.with_final(false);
        state.tag = None;
        state.backtrack = false;
        Ok(())
    }

    pub fn set_backtrack(&mut self, id: StateId, backtrack: bool) -> FsmResult<()> {
        self.state_mut(id)?.backtrack = backtrack;
        Ok(())
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.store.vertex(id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<Transition> {
        self.store.edge(id).map(Transition::from)
    }

    /// Iterates over the states in insertion order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.store.vertices()
    }

    /// Iterates over the transitions in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, Transition)> + '_ {
        self.store.edges().map(|(id, e)| (id, e.into()))
    }

    /// Iterates over the transitions leaving `id` in the order they were added.
    pub fn outgoing(&self, id: StateId) -> impl Iterator<Item = (TransitionId, Transition)> + '_ {
        self.store.outgoing(id).map(|(id, e)| (id, e.into()))
    }

    pub fn state_count(&self) -> usize {
        self.store.vertex_count()
    }

    pub fn transition_count(&self) -> usize {
        self.store.edge_count()
    }

    /// Checks that every final state carries a token tag.
    pub fn validate(&self) -> FsmResult<()> {
        match self.states().find(|(_, s)| s.is_final() && s.tag.is_none()) {
            Some((_, state)) => Err(FsmError::UntaggedFinal(state.name.clone())),
            None => Ok(()),
        }
    }

    /// Simulates the automaton on `input` with a depth-first backtracking search from the
    /// initial state.
    ///
    /// Lambda transitions are tried before symbol transitions, each in the order they were
    /// added. The first accepting path found is returned.
    pub fn process(&self, input: &str) -> Run {
        let Some(initial) = self.initial else {
            return Run::default();
        };

        let input = input.chars().collect::<Vec<_>>();
        let mut path = Vec::new();
        let mut on_path = HashSet::new();

        let accepted = self.search(initial, &input, 0, &mut on_path, &mut path);
        debug!(
            "processed {} characters: accepted = {}, path length = {}",
            input.len(),
            accepted,
            path.len()
        );

        Run {
            accepted,
            path: if accepted { path } else { Vec::new() },
        }
    }

    fn search(
        &self,
        state: StateId,
        input: &[char],
        pos: usize,
        on_path: &mut HashSet<(StateId, usize)>,
        path: &mut Vec<Transition>,
    ) -> bool {
        if pos == input.len() && self.state(state).is_some_and(State::is_final) {
            return true;
        }

        // lambda cycles would revisit the same configuration without consuming input
        if !on_path.insert((state, pos)) {
            trace!("lambda cycle through {} at {}", self.name_of(state), pos);
            return false;
        }

        let lambdas = self
            .outgoing(state)
            .filter(|(_, t)| t.read == Read::Lambda);
        let symbols = self
            .outgoing(state)
            .filter(|(_, t)| matches!(t.read, Read::Symbol(c) if input.get(pos) == Some(&c)));

        for (_, transition) in lambdas.chain(symbols) {
            let next = match transition.read {
                Read::Lambda => pos,
                Read::Symbol(_) => pos + 1,
            };

            path.push(transition);
            if self.search(transition.to, input, next, on_path, path) {
                return true;
            }
            path.pop();
        }

        on_path.remove(&(state, pos));
        false
    }

    /// Whether the automaton is deterministic and complete over `alphabet`: no lambda
    /// transitions, exactly one transition per symbol per state and no symbol outside the
    /// alphabet.
    pub fn is_dfa(&self, alphabet: &[char]) -> bool {
        let alphabet = alphabet.iter().copied().collect::<BTreeSet<_>>();

        let symbols_valid = self.transitions().all(|(_, t)| match t.read {
            Read::Lambda => false,
            Read::Symbol(c) => alphabet.contains(&c),
        });

        symbols_valid
            && self.states().all(|(id, _)| {
                alphabet.iter().all(|symbol| {
                    self.outgoing(id)
                        .filter(|(_, t)| t.read == Read::Symbol(*symbol))
                        .count()
                        == 1
                })
            })
    }

    pub(crate) fn name_of(&self, id: StateId) -> String {
        self.state(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("{}{}", self.prefix, id))
    }

    fn state_mut(&mut self, id: StateId) -> FsmResult<&mut State> {
        self.store.vertex_mut(id).ok_or(FsmError::UnknownState(id))
    }
}
