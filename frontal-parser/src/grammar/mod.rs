use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

pub use self::{
    error::{GrammarError, GrammarResult},
    loader::Vocabulary,
};
use crate::{Lookahead, Symbol};

mod error;
mod loader;

/// Right-hand side of a [`Production`].
pub type Body = Vec<Symbol>;

/// Index of a [`Production`] in declaration order.
pub type ProductionId = usize;

/// Set of terminals, epsilon and the end marker as used in FIRST and FOLLOW sets.
pub type SymbolSet = BTreeSet<Lookahead>;

/// One alternative of a nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Production {
    pub head: String,
    pub body: Body,
}

impl std::fmt::Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.head)?;
        for symbol in self.body.iter() {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// FIRST and FOLLOW sets of every nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sets {
    pub first: BTreeMap<String, SymbolSet>,
    pub follow: BTreeMap<String, SymbolSet>,
}

/// A context-free grammar with embedded action symbols.
///
/// Productions keep their declaration order, which is also the order ties are broken in when
/// the LL(1) table is built. FIRST and FOLLOW sets are computed once, when the grammar is
/// built.
#[derive(Debug, Clone)]
pub struct Grammar {
    start: String,
    productions: Vec<Production>,
    rules: BTreeMap<String, Vec<ProductionId>>,
    /// Nonterminals in the order they were first declared.
    heads: Vec<String>,
    sets: Sets,
}

impl Grammar {
    /// Creates a new [`GrammarBuilder`].
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id)
    }

    /// Productions of `head` in declaration order.
    pub fn rules(&self, head: &str) -> &[ProductionId] {
        self.rules.get(head).map(Vec::as_slice).unwrap_or_default()
    }

    /// Nonterminals in declaration order.
    pub fn non_terminals(&self) -> impl Iterator<Item = &str> {
        self.heads.iter().map(String::as_str)
    }

    pub fn sets(&self) -> &Sets {
        &self.sets
    }

    pub fn first(&self, non_terminal: &str) -> Option<&SymbolSet> {
        self.sets.first.get(non_terminal)
    }

    pub fn follow(&self, non_terminal: &str) -> Option<&SymbolSet> {
        self.sets.follow.get(non_terminal)
    }

    /// Whether `non_terminal` derives the empty string.
    pub fn nullable(&self, non_terminal: &str) -> bool {
        self.first(non_terminal)
            .is_some_and(|f| f.contains(&Lookahead::Epsilon))
    }

    /// FIRST set of a sequence of symbols. Contains epsilon if every symbol is nullable,
    /// including when the sequence is empty.
    pub fn first_of(&self, symbols: &[Symbol]) -> SymbolSet {
        sequence_first(&self.sets.first, symbols)
    }

    /// Computes the FIRST and FOLLOW sets from scratch.
    pub fn compute_sets(&self) -> Sets {
        let first = self.compute_first();
        let follow = self.compute_follow(&first);
        Sets { first, follow }
    }

    fn empty_sets(&self) -> BTreeMap<String, SymbolSet> {
        self.heads
            .iter()
            .map(|head| (head.clone(), SymbolSet::new()))
            .collect()
    }

    fn compute_first(&self) -> BTreeMap<String, SymbolSet> {
        let mut first = self.empty_sets();

        loop {
            let mut changed = false;
            for production in self.productions.iter() {
                let set = sequence_first(&first, &production.body);
                if let Some(entry) = first.get_mut(&production.head) {
                    changed |= extend_set(entry, set);
                }
            }

            if !changed {
                break first;
            }
        }
    }

    fn compute_follow(&self, first: &BTreeMap<String, SymbolSet>) -> BTreeMap<String, SymbolSet> {
        let mut follow = self.empty_sets();
        if let Some(start) = follow.get_mut(&self.start) {
            start.insert(Lookahead::Eof);
        }

        loop {
            let mut changed = false;
            for production in self.productions.iter() {
                for (i, symbol) in production.body.iter().enumerate() {
                    let Symbol::NonTerminal(variable) = symbol else {
                        continue;
                    };

                    let rest = sequence_first(first, &production.body[i + 1..]);
                    let mut gained = rest
                        .iter()
                        .filter(|l| **l != Lookahead::Epsilon)
                        .cloned()
                        .collect::<Vec<_>>();
                    if rest.contains(&Lookahead::Epsilon) {
                        // follow[variable] = follow[head]
                        gained.extend(follow.get(&production.head).into_iter().flatten().cloned());
                    }

                    if let Some(entry) = follow.get_mut(variable) {
                        changed |= extend_set(entry, gained);
                    }
                }
            }

            if !changed {
                break follow;
            }
        }
    }
}

/// FIRST of `symbols` given the FIRST sets of the nonterminals. Actions and epsilon are
/// transparent.
fn sequence_first(first: &BTreeMap<String, SymbolSet>, symbols: &[Symbol]) -> SymbolSet {
    let mut result = SymbolSet::new();

    for symbol in symbols {
        match symbol {
            Symbol::Terminal(t) => {
                result.insert(Lookahead::T(t.clone()));
                return result;
            }
            Symbol::NonTerminal(n) => {
                let Some(set) = first.get(n) else {
                    return result;
                };
                result.extend(set.iter().filter(|l| **l != Lookahead::Epsilon).cloned());
                if !set.contains(&Lookahead::Epsilon) {
                    return result;
                }
            }
            Symbol::Epsilon | Symbol::Action(_) => (),
        }
    }

    result.insert(Lookahead::Epsilon);
    result
}

fn extend_set(set: &mut SymbolSet, iter: impl IntoIterator<Item = Lookahead>) -> bool {
    let len = set.len();
    set.extend(iter);
    len != set.len()
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for head in self.heads.iter() {
            write!(f, "{} ->", head)?;
            for (i, id) in self.rules(head).iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                for symbol in self.productions[*id].body.iter() {
                    write!(f, " {}", symbol)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builder struct for the [`Grammar`].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    start: Option<String>,
    productions: Vec<Production>,
}

impl GrammarBuilder {
    /// Sets the start symbol. Defaults to the head of the first rule.
    pub fn with_start(mut self, head: impl Into<String>) -> Self {
        self.set_start(head);
        self
    }

    /// Adds a rule to the [`Grammar`].
    pub fn with_rule(mut self, head: impl Into<String>, body: impl Into<Body>) -> Self {
        self.add_rule(head, body);
        self
    }

    /// Adds a set of [`Bodies`](Body) associated with a nonterminal to the grammar.
    pub fn with_rules<B>(mut self, head: impl Into<String>, bodies: impl IntoIterator<Item = B>) -> Self
    where
        B: Into<Body>,
    {
        self.add_rules(head, bodies);
        self
    }

    pub fn set_start(&mut self, head: impl Into<String>) {
        self.start = Some(head.into());
    }

    /// Adds a rule to the [`Grammar`]. Returns `false` when the exact rule already exists.
    pub fn add_rule(&mut self, head: impl Into<String>, body: impl Into<Body>) -> bool {
        let body = body.into();
        // default empty bodies to `Symbol::Epsilon`
        let body = if !body.is_empty() {
            body
        } else {
            Body::from([Symbol::Epsilon])
        };

        let production = Production {
            head: head.into(),
            body,
        };
        if self.productions.contains(&production) {
            return false;
        }
        self.productions.push(production);
        true
    }

    pub fn add_rules<B>(&mut self, head: impl Into<String>, bodies: impl IntoIterator<Item = B>)
    where
        B: Into<Body>,
    {
        let head = head.into();
        bodies.into_iter().for_each(|b| {
            let _ = self.add_rule(head.clone(), b);
        });
    }

    /// Builds the [`Grammar`] and computes its FIRST and FOLLOW sets.
    ///
    /// # Fails
    ///
    /// When there are no rules, when the start symbol has no rules, or when a nonterminal is
    /// used without being defined.
    pub fn build(self) -> GrammarResult<Grammar> {
        let first_head = self
            .productions
            .first()
            .map(|p| p.head.clone())
            .ok_or(GrammarError::Empty)?;
        let start = self.start.unwrap_or(first_head);

        let mut heads = Vec::new();
        let mut rules: BTreeMap<String, Vec<ProductionId>> = BTreeMap::new();
        for (id, production) in self.productions.iter().enumerate() {
            if !rules.contains_key(&production.head) {
                heads.push(production.head.clone());
            }
            rules.entry(production.head.clone()).or_default().push(id);
        }

        if !rules.contains_key(&start) {
            return Err(GrammarError::UnknownStart(start));
        }
        if let Some(undefined) = self
            .productions
            .iter()
            .flat_map(|p| p.body.iter())
            .find_map(|s| match s {
                Symbol::NonTerminal(n) if !rules.contains_key(n) => Some(n.clone()),
                _ => None,
            })
        {
            return Err(GrammarError::Undefined(undefined));
        }

        let mut grammar = Grammar {
            start,
            productions: self.productions,
            rules,
            heads,
            sets: Sets::default(),
        };
        grammar.sets = grammar.compute_sets();

        debug!(
            "built grammar with {} nonterminals and {} productions, start {}",
            grammar.heads.len(),
            grammar.productions.len(),
            grammar.start
        );

        Ok(grammar)
    }
}
