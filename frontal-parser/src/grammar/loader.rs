use std::collections::BTreeMap;

use serde::Deserialize;

use super::{
    error::{GrammarError, GrammarResult},
    Body, Grammar,
};
use crate::{ActionKind, Symbol};

/// Reserved word for the empty alternative.
const EPSILON: &str = "EPSILON";

/// Registered action names. Bare words of a grammar found here become [`Symbol::Action`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, ActionKind>")]
pub struct Vocabulary {
    names: BTreeMap<String, ActionKind>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            names: ActionKind::ALL
                .into_iter()
                .map(|action| (action.name().to_string(), action))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, ActionKind>> for Vocabulary {
    /// Default names extended with `aliases`.
    fn from(aliases: BTreeMap<String, ActionKind>) -> Self {
        let mut vocabulary = Self::default();
        vocabulary.names.extend(aliases);
        vocabulary
    }
}

impl Vocabulary {
    /// Registers `name` as another spelling of `action`.
    pub fn with_alias(mut self, name: impl Into<String>, action: ActionKind) -> Self {
        self.names.insert(name.into(), action);
        self
    }

    pub fn resolve(&self, word: &str) -> Option<ActionKind> {
        self.names.get(word).copied()
    }
}

impl Grammar {
    /// Reads the grammar text format.
    ///
    /// Every statement is `LHS -> alt1 | alt2 | ...`. A line starting with `|` continues the
    /// previous statement and lines starting with `#` are comments. Terminals are single-quoted,
    /// `EPSILON` is the empty alternative, words registered in `vocabulary` are actions and
    /// every other word is a nonterminal. Repeated left-hand sides add alternatives and the
    /// first left-hand side is the start symbol.
    pub fn parse(text: &str, vocabulary: &Vocabulary) -> GrammarResult<Self> {
        let mut builder = Grammar::builder();
        let mut current: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let line_nr = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (head, rest) = match line.strip_prefix('|') {
                Some(rest) => (
                    current
                        .clone()
                        .ok_or(GrammarError::DanglingAlternative { line: line_nr })?,
                    rest,
                ),
                None => {
                    let (head, rest) = line
                        .split_once("->")
                        .ok_or(GrammarError::MissingArrow { line: line_nr })?;
                    let head = head.trim();
                    if !is_identifier(head) || head == EPSILON || vocabulary.resolve(head).is_some() {
                        return Err(GrammarError::InvalidHead {
                            line: line_nr,
                            name: head.into(),
                        });
                    }
                    (head.to_string(), rest)
                }
            };

            for body in read_alternatives(rest, line_nr, vocabulary)? {
                builder.add_rule(head.clone(), body);
            }
            current = Some(head);
        }

        builder.build()
    }
}

impl std::str::FromStr for Grammar {
    type Err = GrammarError;

    /// Reads the grammar text format with the default [`Vocabulary`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grammar::parse(s, &Vocabulary::default())
    }
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits the right-hand side of a statement into bodies.
fn read_alternatives(rest: &str, line: usize, vocabulary: &Vocabulary) -> GrammarResult<Vec<Body>> {
    let mut bodies = Vec::new();
    let mut body = Body::new();
    let mut chars = rest.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '|' => {
                chars.next();
                bodies.push(std::mem::take(&mut body));
            }
            '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => literal.push(c),
                        None => return Err(GrammarError::UnterminatedLiteral { line }),
                    }
                }
                if literal.is_empty() {
                    return Err(GrammarError::EmptyLiteral { line });
                }
                body.push(Symbol::Terminal(literal));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '|' || c == '\'' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }

                let symbol = if word == EPSILON {
                    Symbol::Epsilon
                } else if let Some(action) = vocabulary.resolve(&word) {
                    Symbol::Action(action)
                } else if is_identifier(&word) {
                    Symbol::NonTerminal(word)
                } else {
                    return Err(GrammarError::InvalidWord { line, word });
                };
                body.push(symbol);
            }
        }
    }
    bodies.push(body);

    Ok(bodies)
}

#[cfg(test)]
mod tests {
    use super::{Grammar, GrammarError, Vocabulary};
    use crate::{ActionKind, Symbol};

    #[test]
    fn statements_and_continuations() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = "\
# expressions
E -> 'n'
   | '(' E ')'
S -> E ';' | EPSILON
"
        .parse()?;

        assert_eq!(grammar.start(), "E");
        assert_eq!(grammar.rules("E").len(), 2);
        assert_eq!(
            grammar.productions()[1].body,
            [
                Symbol::terminal("("),
                Symbol::non_terminal("E"),
                Symbol::terminal(")")
            ]
        );
        assert_eq!(grammar.productions()[3].body, [Symbol::Epsilon]);
        Ok(())
    }

    #[test]
    fn repeated_heads_add_alternatives() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = "S -> 'a' S\nS -> EPSILON\n".parse()?;

        assert_eq!(grammar.rules("S"), [0, 1]);
        assert_eq!(grammar.non_terminals().collect::<Vec<_>>(), ["S"]);
        Ok(())
    }

    #[test]
    fn literals_may_hold_operators() -> Result<(), Box<dyn std::error::Error>> {
        let grammar: Grammar = "S -> '|' '->' 'a b'".parse()?;

        assert_eq!(
            grammar.productions()[0].body,
            [
                Symbol::terminal("|"),
                Symbol::terminal("->"),
                Symbol::terminal("a b")
            ]
        );
        Ok(())
    }

    #[test]
    fn actions_resolve_through_vocabulary() -> Result<(), Box<dyn std::error::Error>> {
        let vocabulary = Vocabulary::default().with_alias("pop_scope", ActionKind::Parent);
        let grammar = Grammar::parse(
            "Prog -> create_global_table 'id' begin_type pop_scope",
            &vocabulary,
        )?;

        assert_eq!(
            grammar.productions()[0].body,
            [
                Symbol::Action(ActionKind::CreateGlobalTable),
                Symbol::terminal("id"),
                Symbol::Action(ActionKind::BeginType),
                Symbol::Action(ActionKind::Parent),
            ]
        );

        // unknown to the default vocabulary, so a nonterminal without rules
        assert_eq!(
            "Prog -> pop_scope".parse::<Grammar>().err(),
            Some(GrammarError::Undefined("pop_scope".into()))
        );
        Ok(())
    }

    #[test]
    fn malformed_lines() {
        let cases = [
            ("S 'a'", GrammarError::MissingArrow { line: 1 }),
            ("| 'a'", GrammarError::DanglingAlternative { line: 1 }),
            ("S -> 'a\n", GrammarError::UnterminatedLiteral { line: 1 }),
            ("S -> ''", GrammarError::EmptyLiteral { line: 1 }),
            (
                "S -> 'a'\nparent -> 'b'",
                GrammarError::InvalidHead {
                    line: 2,
                    name: "parent".into(),
                },
            ),
            (
                "S -> a-b",
                GrammarError::InvalidWord {
                    line: 1,
                    word: "a-b".into(),
                },
            ),
            ("# nothing\n", GrammarError::Empty),
        ];

        for (text, expected) in cases {
            assert_eq!(text.parse::<Grammar>().err(), Some(expected), "{:?}", text);
        }
    }

    #[test]
    fn display_round_trips() -> Result<(), Box<dyn std::error::Error>> {
        let text = "\
Prog -> create_global_table Decl parent
Decl -> 'id' create_variable_entry Decl | EPSILON
";
        let grammar: Grammar = text.parse()?;

        assert_eq!(grammar.to_string(), text);
        Ok(())
    }
}
