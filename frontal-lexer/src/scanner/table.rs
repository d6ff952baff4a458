use std::collections::BTreeMap;

use log::debug;

use super::{
    config::ClassHeader,
    error::{ScanResult, ScannerError},
};
use crate::fsm::{Automaton, Read, StateId};

/// Row index of the dead state. Every cell of the dead row points back to it.
pub const DEAD: usize = 0;

/// Column of the dense transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    Letter,
    Digit,
    Space,
    Newline,
    Eof,
    Literal(char),
    Other,
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Class::Letter => write!(f, "letter"),
            Class::Digit => write!(f, "digit"),
            Class::Space => write!(f, "space"),
            Class::Newline => write!(f, "newline"),
            Class::Eof => write!(f, "eof"),
            Class::Literal(c) => write!(f, "{:?}", c),
            Class::Other => write!(f, "other"),
        }
    }
}

impl ClassHeader {
    /// Class a marker symbol stands for, if it is one.
    pub fn marker(&self, symbol: char) -> Option<Class> {
        [
            (self.letter, Class::Letter),
            (self.digit, Class::Digit),
            (self.space, Class::Space),
            (self.newline, Class::Newline),
            (self.eof, Class::Eof),
            (self.other, Class::Other),
        ]
        .into_iter()
        .find_map(|(marker, class)| (marker == symbol).then_some(class))
    }

    /// Classifies a raw input character. Anything outside the fixed classes is a literal.
    pub fn classify(raw: char) -> Class {
        match raw {
            'a'..='z' | 'A'..='Z' => Class::Letter,
            '1'..='9' => Class::Digit,
            ' ' | '\t' => Class::Space,
            '\n' => Class::Newline,
            '\0' => Class::Eof,
            c => Class::Literal(c),
        }
    }
}

/// Per-row information about the automaton state the row was compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub state: Option<StateId>,
    pub name: String,
    pub tag: Option<String>,
    pub fin: bool,
    pub backtrack: bool,
}

/// Dense `state × class` transition table compiled from an [`Automaton`].
///
/// Row `0` is the dead state; the automaton's states follow in iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    columns: Vec<Class>,
    literals: BTreeMap<char, usize>,
    other: usize,
    rows: Vec<Row>,
    cells: Vec<Vec<usize>>,
    start: usize,
}

impl TransitionTable {
    /// Compiles `fa` into a dense table.
    ///
    /// A state without a direct transition for a class moves to its `other` target, unless
    /// the state is final, in which case the cell is [`DEAD`].
    ///
    /// # Fails
    ///
    /// When the automaton has untagged final states, no initial state, lambda transitions,
    /// literals that can never be classified as themselves, two transitions on the same class
    /// out of one state, or a non-final state without an `other` transition.
    pub fn build(fa: &Automaton, header: &ClassHeader) -> ScanResult<Self> {
        fa.validate()?;
        let initial = fa.initial_state().ok_or(ScannerError::NoInitialState)?;

        let mut row_of = BTreeMap::new();
        let mut rows = Vec::from([Row {
            state: None,
            name: "-".into(),
            tag: None,
            fin: false,
            backtrack: false,
        }]);
        for (id, state) in fa.states() {
            row_of.insert(id, rows.len());
            rows.push(Row {
                state: Some(id),
                name: state.name().into(),
                tag: state.tag().map(String::from),
                fin: state.is_final(),
                backtrack: state.backtrack(),
            });
        }

        // classify every transition once
        let mut edges = Vec::with_capacity(fa.transition_count());
        let mut literal_set = std::collections::BTreeSet::new();
        for (_, t) in fa.transitions() {
            let class = match t.read {
                Read::Lambda => {
                    return Err(ScannerError::LambdaTransition {
                        state: fa.state(t.from).map(|s| s.name().into()).unwrap_or_default(),
                    })
                }
                Read::Symbol(c) => match header.marker(c) {
                    Some(class) => class,
                    None => match ClassHeader::classify(c) {
                        Class::Literal(c) => {
                            literal_set.insert(c);
                            Class::Literal(c)
                        }
                        _ => return Err(ScannerError::ShadowedLiteral(c)),
                    },
                },
            };
            edges.push((row_of[&t.from], class, row_of[&t.to]));
        }

        let mut columns = Vec::from([
            Class::Letter,
            Class::Digit,
            Class::Space,
            Class::Newline,
            Class::Eof,
        ]);
        let mut literals = BTreeMap::new();
        for c in literal_set {
            literals.insert(c, columns.len());
            columns.push(Class::Literal(c));
        }
        let other = columns.len();
        columns.push(Class::Other);

        // direct transitions, checking for duplicates with different targets
        let mut direct: Vec<Vec<Option<usize>>> = vec![vec![None; columns.len()]; rows.len()];
        for (from, class, to) in edges {
            let column = columns.iter().position(|c| *c == class).unwrap_or(other);
            match direct[from][column] {
                Some(existing) if existing != to => {
                    return Err(ScannerError::Nondeterministic {
                        state: rows[from].name.clone(),
                        class: class.to_string(),
                    })
                }
                _ => direct[from][column] = Some(to),
            }
        }

        let mut cells = vec![vec![DEAD; columns.len()]];
        for (row, targets) in rows.iter().zip(direct.iter()).skip(1) {
            let fallback = match (row.fin, targets[other]) {
                (true, _) => DEAD,
                (false, Some(target)) => target,
                (false, None) => {
                    return Err(ScannerError::MissingOther {
                        state: row.name.clone(),
                    })
                }
            };
            cells.push(targets.iter().map(|t| t.unwrap_or(fallback)).collect());
        }

        debug!(
            "compiled transition table with {} rows and {} columns",
            rows.len(),
            columns.len()
        );

        Ok(Self {
            columns,
            literals,
            other,
            rows,
            start: row_of[&initial],
            cells,
        })
    }

    /// Row of the automaton's initial state.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[Class] {
        &self.columns
    }

    /// Column index for a raw character, falling back to the `other` column for literals
    /// without a column of their own.
    pub fn column(&self, raw: char) -> usize {
        match ClassHeader::classify(raw) {
            Class::Letter => 0,
            Class::Digit => 1,
            Class::Space => 2,
            Class::Newline => 3,
            Class::Eof => 4,
            Class::Literal(c) => self.literals.get(&c).copied().unwrap_or(self.other),
            Class::Other => self.other,
        }
    }

    /// Next row after reading `raw` in `row`. Unknown rows lead to [`DEAD`].
    pub fn lookup(&self, row: usize, raw: char) -> usize {
        self.cells
            .get(row)
            .map(|cells| cells[self.column(raw)])
            .unwrap_or(DEAD)
    }
}

impl std::fmt::Display for TransitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max(5);

        write!(f, "{:width$}", "state")?;
        for class in self.columns.iter() {
            write!(f, " {:>7}", class.to_string())?;
        }
        writeln!(f, " | token")?;

        for (row, cells) in self.rows.iter().zip(self.cells.iter()) {
            write!(f, "{:width$}", row.name)?;
            for cell in cells {
                write!(f, " {:>7}", self.rows[*cell].name)?;
            }
            match (&row.tag, row.backtrack) {
                (Some(tag), true) => writeln!(f, " | {} (backtrack)", tag)?,
                (Some(tag), false) => writeln!(f, " | {}", tag)?,
                (None, _) => writeln!(f, " |")?,
            }
        }

        Ok(())
    }
}
