use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    grammar::{Grammar, ProductionId},
    Lookahead,
};

type Cells = BTreeMap<String, BTreeMap<Lookahead, ProductionId>>;

/// Two productions competing for the same cell. The cell keeps [`Conflict::kept`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub non_terminal: String,
    pub lookahead: Lookahead,
    pub kept: ProductionId,
    pub rejected: ProductionId,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "conflict at ({}, {}): production {} kept, production {} rejected",
            self.non_terminal, self.lookahead, self.kept, self.rejected
        )
    }
}

/// LL(1) parse table mapping `(nonterminal, lookahead)` to a production.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTable {
    cells: Cells,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    /// Builds the table from the FIRST and FOLLOW sets of `grammar`.
    ///
    /// Every production `A -> γ` fills the cells of FIRST(γ), and of FOLLOW(A) when γ is
    /// nullable. A cell that is already taken by another production keeps its first entry and
    /// the collision is recorded as a [`Conflict`].
    pub fn build(grammar: &Grammar) -> Self {
        let mut table = Self::default();

        for (id, production) in grammar.productions().iter().enumerate() {
            let first = grammar.first_of(&production.body);

            let mut lookaheads = first
                .iter()
                .filter(|l| **l != Lookahead::Epsilon)
                .cloned()
                .collect::<Vec<_>>();
            if first.contains(&Lookahead::Epsilon) {
                lookaheads.extend(grammar.follow(&production.head).into_iter().flatten().cloned());
            }

            for lookahead in lookaheads {
                table.insert(&production.head, lookahead, id);
            }
        }

        debug!(
            "built LL(1) table with {} cells and {} conflicts",
            table.len(),
            table.conflicts.len()
        );

        table
    }

    fn insert(&mut self, head: &str, lookahead: Lookahead, id: ProductionId) {
        let row = self.cells.entry(head.to_string()).or_default();
        match row.get(&lookahead) {
            Some(&kept) if kept != id => {
                warn!(
                    "LL(1) conflict at ({}, {}): productions {} and {}",
                    head, lookahead, kept, id
                );
                self.conflicts.push(Conflict {
                    non_terminal: head.to_string(),
                    lookahead,
                    kept,
                    rejected: id,
                });
            }
            Some(_) => (),
            None => {
                row.insert(lookahead, id);
            }
        }
    }

    pub fn get(&self, non_terminal: &str, lookahead: &Lookahead) -> Option<ProductionId> {
        self.cells.get(non_terminal)?.get(lookahead).copied()
    }

    /// Lookaheads with an entry for `non_terminal`, in order.
    pub fn expected(&self, non_terminal: &str) -> impl Iterator<Item = &Lookahead> {
        self.cells.get(non_terminal).into_iter().flat_map(|row| row.keys())
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Whether the table was built without conflicts.
    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Iterates over all cells as `(nonterminal, lookahead, production)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Lookahead, ProductionId)> {
        self.cells.iter().flat_map(|(head, row)| {
            row.iter()
                .map(move |(lookahead, id)| (head.as_str(), lookahead, *id))
        })
    }

    /// Number of filled cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the table with the productions of `grammar` spelled out, followed by the
    /// conflicts.
    pub fn render(&self, grammar: &Grammar) -> String {
        let mut out = String::new();
        for head in grammar.non_terminals() {
            for (lookahead, id) in self.cells.get(head).into_iter().flatten() {
                let production = grammar
                    .production(*id)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                out.push_str(&format!("{}, {} => {}\n", head, lookahead, production));
            }
        }
        for conflict in self.conflicts.iter() {
            out.push_str(&format!("{}\n", conflict));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Conflict, ParseTable};
    use crate::{grammar::Grammar, Lookahead};

    const PARENS: &str = "E -> 'n' | '(' E ')'";

    #[test]
    fn cells_from_first_sets() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = PARENS.parse()?;
        let table = ParseTable::build(&grammar);

        assert_eq!(table.get("E", &Lookahead::terminal("n")), Some(0));
        assert_eq!(table.get("E", &Lookahead::terminal("(")), Some(1));
        assert_eq!(table.get("E", &Lookahead::terminal(")")), None);
        assert_eq!(table.get("E", &Lookahead::Eof), None);
        assert!(table.is_ll1());
        assert_eq!(table.len(), 2);
        Ok(())
    }

    #[test]
    fn nullable_productions_use_follow() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = "\
S -> 'a' L ';'
L -> 'id' L | EPSILON
"
        .parse()?;
        let table = ParseTable::build(&grammar);

        assert_eq!(table.get("L", &Lookahead::terminal("id")), Some(1));
        assert_eq!(table.get("L", &Lookahead::terminal(";")), Some(2));
        assert_eq!(
            table.expected("L").cloned().collect::<Vec<_>>(),
            [Lookahead::terminal(";"), Lookahead::terminal("id")]
        );
        Ok(())
    }

    #[test]
    fn ambiguity_is_a_conflict() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = "S -> 'a' 'b' | 'a' 'c'".parse()?;
        let table = ParseTable::build(&grammar);

        assert!(!table.is_ll1());
        assert_eq!(
            table.conflicts(),
            [Conflict {
                non_terminal: "S".into(),
                lookahead: Lookahead::terminal("a"),
                kept: 0,
                rejected: 1,
            }]
        );
        assert_eq!(table.get("S", &Lookahead::terminal("a")), Some(0));
        Ok(())
    }

    #[test]
    fn render() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = PARENS.parse()?;
        let table = ParseTable::build(&grammar);

        assert_eq!(
            table.render(&grammar),
            "E, ( => E -> '(' E ')'\nE, n => E -> 'n'\n"
        );
        Ok(())
    }

    fn arb_grammar_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            (0u8..3, prop::collection::vec(prop::sample::select(vec!["'a'", "'b'", "S", "A", "B", "EPSILON"]), 0..4)),
            0..8,
        )
        .prop_map(|rules| {
            let mut text = String::from("S -> 'z'\nA -> 'y'\nB -> 'x'\n");
            for (head, body) in rules {
                let head = ["S", "A", "B"][head as usize];
                text.push_str(&format!("{} -> {}\n", head, body.join(" ")));
            }
            text
        })
    }

    proptest! {
        #[test]
        fn building_is_deterministic(text in arb_grammar_text()) {
            let grammar: Grammar = text.parse().expect("generated grammars are well formed");

            prop_assert_eq!(ParseTable::build(&grammar), ParseTable::build(&grammar));
        }

        #[test]
        fn duplicated_first_terminal_conflicts(text in arb_grammar_text()) {
            let text = format!("{}S -> 'q' 'a'\nS -> 'q' 'b'\n", text);
            let grammar: Grammar = text.parse().expect("generated grammars are well formed");

            prop_assert!(!ParseTable::build(&grammar).is_ll1());
        }
    }
}
