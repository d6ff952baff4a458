use std::{
    collections::{BTreeSet, HashMap},
    fmt::Write,
    str::FromStr,
};

use log::debug;

use super::{
    automaton::{Automaton, Read, Status},
    error::FormatError,
    StateId,
};

/// Preferred lambda sentinels for [`Automaton::to_text`]. When all of them are transition
/// symbols, the private use area and then the rest of the character space are searched.
const LAMBDA_CANDIDATES: [char; 6] = ['~', '#', '$', '%', '&', 'λ'];

/// Upper bound on `states = N`. States are allocated up front.
pub const MAX_STATES: usize = 1 << 16;

pub type FormatResult<T> = Result<T, FormatError>;

/// Reader for the line-oriented automaton format:
///
/// ```text
/// prefix = q
/// states = 2
/// lambda = ~
/// initial = 0
/// final = 1, T_A
/// ;
/// backtrack = 1
/// ;
/// 0,1 : a
/// ;
/// ```
pub struct FormatReader<'a> {
    lines: std::iter::Peekable<Box<dyn Iterator<Item = (usize, &'a str)> + 'a>>,
}

impl<'a> FormatReader<'a> {
    pub fn new(input: &'a str) -> Self {
        let lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a> = Box::new(
            input
                .lines()
                .enumerate()
                .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
                .filter(|(_, line)| !line.trim().is_empty()),
        );

        Self {
            lines: lines.peekable(),
        }
    }

    pub fn parse(mut self) -> FormatResult<Automaton> {
        let prefix = self.char_value("prefix")?;
        let (line, states) = self.value("states")?;
        let states = parse_number(line, "state count", states)?;
        if states > MAX_STATES {
            return Err(FormatError::TooManyStates {
                line,
                states,
                max: MAX_STATES,
            });
        }
        let lambda = self.char_value("lambda")?;

        let mut fa = Automaton::new(prefix);
        let ids = (0..states)
            .map(|_| fa.add_state(Status::Normal))
            .collect::<Result<Vec<_>, _>>()?;
        let resolve = |line: usize, index: &str| -> FormatResult<StateId> {
            let index = parse_number(line, "state index", index)?;
            ids.get(index).copied().ok_or(FormatError::StateOutOfRange {
                line,
                index,
                states,
            })
        };

        if self.peek_key() == Some("initial") {
            let (line, initial) = self.value("initial")?;
            fa.choose_initial_state(resolve(line, initial)?)?;
        }

        for (line, value) in self.section("final")? {
            let (index, tag) = value.split_once(',').ok_or(FormatError::Expected {
                line,
                expected: "final = <state>, <tag>",
            })?;
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(FormatError::Invalid {
                    line,
                    what: "token tag",
                    value: value.into(),
                });
            }
            fa.add_final_state(resolve(line, index)?, tag)?;
        }

        for (line, value) in self.section("backtrack")? {
            fa.set_backtrack(resolve(line, value)?, true)?;
        }

        for (line, text) in self.raw_section()? {
            let (ends, symbol) = text.split_once(':').ok_or(FormatError::Expected {
                line,
                expected: "<from>,<to> : <symbol>",
            })?;
            let (from, to) = ends.split_once(',').ok_or(FormatError::Expected {
                line,
                expected: "<from>,<to> : <symbol>",
            })?;

            let symbol = symbol.strip_prefix(' ').filter(|s| !s.is_empty()).unwrap_or(symbol);
            let mut chars = symbol.chars();
            let read = match (chars.next(), chars.as_str().trim()) {
                (Some(c), "") if c == lambda => Read::Lambda,
                (Some(c), "") => Read::Symbol(c),
                _ => {
                    return Err(FormatError::Invalid {
                        line,
                        what: "transition symbol",
                        value: symbol.into(),
                    })
                }
            };

            fa.add_transition(resolve(line, from)?, resolve(line, to)?, read)?;
        }

        if let Some((line, text)) = self.lines.next() {
            return Err(FormatError::Invalid {
                line,
                what: "trailing line",
                value: text.into(),
            });
        }

        debug!(
            "imported automaton with {} states and {} transitions",
            fa.state_count(),
            fa.transition_count()
        );
        Ok(fa)
    }

    fn peek_key(&mut self) -> Option<&str> {
        self.lines
            .peek()
            .and_then(|(_, line)| line.split_once('='))
            .map(|(key, _)| key.trim())
    }

    /// Reads a `key = value` line and returns the trimmed value with its line number.
    fn value(&mut self, key: &'static str) -> FormatResult<(usize, &'a str)> {
        let (line, text) = self.lines.next().ok_or(FormatError::UnexpectedEnd(key))?;

        match text.split_once('=') {
            Some((k, v)) if k.trim() == key => Ok((line, v.trim())),
            _ => Err(FormatError::Expected { line, expected: key }),
        }
    }

    fn char_value(&mut self, key: &'static str) -> FormatResult<char> {
        let (line, value) = self.value(key)?;
        let mut chars = value.chars();

        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(FormatError::Invalid {
                line,
                what: "character",
                value: value.into(),
            }),
        }
    }

    /// Reads `key = value` lines up to the `;` terminator.
    fn section(&mut self, key: &'static str) -> FormatResult<Vec<(usize, &'a str)>> {
        let mut values = Vec::new();
        while self.lines.peek().is_some_and(|(_, l)| l.trim() != ";") {
            values.push(self.value(key)?);
        }
        self.terminator()?;
        Ok(values)
    }

    /// Reads untrimmed lines up to the `;` terminator.
    fn raw_section(&mut self) -> FormatResult<Vec<(usize, &'a str)>> {
        let mut lines = Vec::new();
        while let Some((line, text)) = self.lines.next_if(|(_, l)| l.trim() != ";") {
            lines.push((line, text));
        }
        self.terminator()?;
        Ok(lines)
    }

    fn terminator(&mut self) -> FormatResult<()> {
        match self.lines.next() {
            Some((_, l)) if l.trim() == ";" => Ok(()),
            Some((line, _)) => Err(FormatError::Expected {
                line,
                expected: ";",
            }),
            None => Err(FormatError::UnexpectedEnd(";")),
        }
    }
}

fn parse_number(line: usize, what: &'static str, value: &str) -> FormatResult<usize> {
    value.trim().parse().map_err(|_| FormatError::Invalid {
        line,
        what,
        value: value.trim().into(),
    })
}

impl FromStr for Automaton {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatReader::new(s).parse()
    }
}

impl Automaton {
    /// Writes the automaton in the textual format read by [`FormatReader`]. States are numbered
    /// by their position in iteration order.
    ///
    /// # Fails
    ///
    /// When every printable character is already a transition symbol, leaving none for lambda.
    pub fn to_text(&self) -> FormatResult<String> {
        let index = self
            .states()
            .enumerate()
            .map(|(i, (id, _))| (id, i))
            .collect::<HashMap<_, _>>();

        let symbols = self
            .transitions()
            .filter_map(|(_, t)| match t.read {
                Read::Symbol(c) => Some(c),
                Read::Lambda => None,
            })
            .collect::<BTreeSet<_>>();
        let lambda = LAMBDA_CANDIDATES
            .into_iter()
            .chain('\u{e000}'..='\u{f8ff}')
            .chain('\0'..=char::MAX)
            .find(|c| !c.is_whitespace() && !c.is_control() && !symbols.contains(c))
            .ok_or(FormatError::NoLambdaSymbol)?;

        let mut out = String::new();
        // writing to a `String` cannot fail
        let _ = writeln!(out, "prefix = {}", self.prefix());
        let _ = writeln!(out, "states = {}", self.state_count());
        let _ = writeln!(out, "lambda = {}", lambda);
        if let Some(initial) = self.initial_state() {
            let _ = writeln!(out, "initial = {}", index[&initial]);
        }

        for (id, state) in self.states() {
            if let (true, Some(tag)) = (state.is_final(), state.tag()) {
                let _ = writeln!(out, "final = {}, {}", index[&id], tag);
            }
        }
        out.push_str(";\n");

        for (id, state) in self.states().filter(|(_, s)| s.backtrack()) {
            let _ = writeln!(out, "backtrack = {}", index[&id]);
        }
        out.push_str(";\n");

        for (_, t) in self.transitions() {
            let symbol = match t.read {
                Read::Symbol(c) => c,
                Read::Lambda => lambda,
            };
            let _ = writeln!(out, "{},{} : {}", index[&t.from], index[&t.to], symbol);
        }
        out.push_str(";\n");

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Automaton, FormatError, Read, Status, MAX_STATES};

    const IDENT: &str = "\
prefix = q
states = 4
lambda = ~
initial = 0
final = 2, IDENT
final = 3, ERR_INVALID
;
backtrack = 2
;
0,0 : S
0,1 : L
0,3 : O
1,1 : L
1,2 : O
;
";

    #[test]
    fn import() -> Result<(), Box<dyn std::error::Error>> {
        let fa: Automaton = IDENT.parse()?;

        assert_eq!(fa.prefix(), 'q');
        assert_eq!(fa.state_count(), 4);
        assert_eq!(fa.transition_count(), 5);
        assert_eq!(fa.initial_state(), Some(0));

        let ident = fa.state(2).expect("state exists");
        assert_eq!(ident.status(), Status::Final);
        assert_eq!(ident.tag(), Some("IDENT"));
        assert!(ident.backtrack());
        assert!(!fa.state(3).expect("state exists").backtrack());
        Ok(())
    }

    #[test]
    fn lambda_and_space_symbols() -> Result<(), Box<dyn std::error::Error>> {
        let fa: Automaton = "prefix = s\nstates = 2\nlambda = ~\ninitial = 0\nfinal = 1, T\n;\n;\n0,1 : ~\n1,1 :  \n0,0 : :\n;\n"
            .parse()?;

        let reads = fa.transitions().map(|(_, t)| t.read).collect::<Vec<_>>();
        assert_eq!(reads, [Read::Lambda, Read::Symbol(' '), Read::Symbol(':')]);
        Ok(())
    }

    #[test]
    fn export_matches_format() -> Result<(), Box<dyn std::error::Error>> {
        let fa: Automaton = IDENT.parse()?;
        assert_eq!(fa.to_text()?, IDENT);
        Ok(())
    }

    #[test]
    fn export_renumbers_states() -> Result<(), Box<dyn std::error::Error>> {
        let mut fa = Automaton::new('p');
        let gone = fa.add_state(Status::Normal)?;
        let a = fa.add_state(Status::Initial)?;
        let b = fa.add_state(Status::Normal)?;
        fa.add_final_state(b, "T_B")?;
        fa.add_transition(a, b, Read::Symbol('~'))?;
        fa.add_transition(b, a, Read::Lambda)?;
        fa.remove_state(gone)?;

        assert_eq!(
            fa.to_text()?,
            "prefix = p\nstates = 2\nlambda = #\ninitial = 0\nfinal = 1, T_B\n;\n;\n0,1 : ~\n1,0 : #\n;\n"
        );
        Ok(())
    }

    #[test]
    fn built_automata_keep_their_final_states() -> Result<(), Box<dyn std::error::Error>> {
        let mut fa = Automaton::new('q');
        let q0 = fa.add_state(Status::Initial)?;
        let q1 = fa.add_state(Status::Normal)?;
        fa.add_final_state(q1, "T_A")?;
        fa.add_transition(q0, q1, Read::Symbol('a'))?;

        let again: Automaton = fa.to_text()?.parse()?;
        assert!(again.process("a").accepted);
        assert_eq!(again.state(1).map(|s| s.status()), Some(Status::Final));
        assert_eq!(again.state(1).and_then(|s| s.tag()), Some("T_A"));
        Ok(())
    }

    #[test]
    fn lambda_avoids_every_used_symbol() -> Result<(), Box<dyn std::error::Error>> {
        let mut fa = Automaton::new('q');
        let q0 = fa.add_state(Status::Initial)?;
        let q1 = fa.add_state(Status::Normal)?;
        fa.add_final_state(q1, "T")?;
        for c in ['~', '#', '$', '%', '&', 'λ', '\u{e000}'] {
            fa.add_transition(q0, q1, Read::Symbol(c))?;
        }

        let text = fa.to_text()?;
        assert!(text.contains("lambda = \u{e001}\n"));

        let again: Automaton = text.parse()?;
        assert!(again.transitions().all(|(_, t)| t.read != Read::Lambda));
        assert!(!again.process("").accepted);
        assert!(again.process("~").accepted);
        Ok(())
    }

    #[test]
    fn oversized_state_counts_are_rejected() {
        let text = format!("prefix = q\nstates = {}\nlambda = ~\n;\n;\n;\n", usize::MAX);
        assert_eq!(
            text.parse::<Automaton>().err(),
            Some(FormatError::TooManyStates {
                line: 2,
                states: usize::MAX,
                max: MAX_STATES
            })
        );
    }

    #[test]
    fn malformed_files_report_their_line() {
        let missing_terminator = "prefix = q\nstates = 1\nlambda = ~\ninitial = 0\nfinal = 0, T\n";
        assert_eq!(
            missing_terminator.parse::<Automaton>().err(),
            Some(FormatError::UnexpectedEnd(";"))
        );

        let out_of_range = "prefix = q\nstates = 1\nlambda = ~\ninitial = 3\n;\n;\n;\n";
        assert_eq!(
            out_of_range.parse::<Automaton>().err(),
            Some(FormatError::StateOutOfRange {
                line: 4,
                index: 3,
                states: 1
            })
        );

        let bad_key = "prefix = q\nstate = 1\n";
        assert_eq!(
            bad_key.parse::<Automaton>().err(),
            Some(FormatError::Expected {
                line: 2,
                expected: "states"
            })
        );

        let long_symbol = "prefix = q\nstates = 1\nlambda = ~\ninitial = 0\n;\n;\n0,0 : ab\n;\n";
        assert!(matches!(
            long_symbol.parse::<Automaton>(),
            Err(FormatError::Invalid { line: 7, .. })
        ));
    }

    fn arb_text() -> impl Strategy<Value = String> {
        (1usize..6)
            .prop_flat_map(|states| {
                (
                    Just(states),
                    0..states,
                    prop::collection::btree_set(0..states, 0..=states),
                    prop::collection::vec((0..states, 0..states, "[a-e~]"), 0..12),
                )
            })
            .prop_map(|(states, initial, finals, transitions)| {
                let mut text = format!("prefix = q\nstates = {states}\nlambda = ~\ninitial = {initial}\n");
                for f in finals.iter() {
                    text.push_str(&format!("final = {f}, T{f}\n"));
                }
                text.push_str(";\n");
                for f in finals.iter().filter(|f| *f % 2 == 0) {
                    text.push_str(&format!("backtrack = {f}\n"));
                }
                text.push_str(";\n");
                for (from, to, symbol) in transitions {
                    text.push_str(&format!("{from},{to} : {symbol}\n"));
                }
                text.push_str(";\n");
                text
            })
    }

    proptest! {
        #[test]
        fn export_then_import_preserves_structure(text in arb_text()) {
            let fa: Automaton = text.parse().expect("generated automata are valid");
            let again: Automaton = fa
                .to_text()
                .expect("generated automata can be exported")
                .parse()
                .expect("exported automata are valid");

            prop_assert_eq!(fa.state_count(), again.state_count());
            prop_assert_eq!(fa.transition_count(), again.transition_count());

            let flags = |fa: &Automaton| {
                fa.states()
                    .map(|(_, s)| (s.status(), s.tag().map(String::from), s.backtrack()))
                    .collect::<Vec<_>>()
            };
            prop_assert_eq!(flags(&fa), flags(&again));
        }
    }
}
