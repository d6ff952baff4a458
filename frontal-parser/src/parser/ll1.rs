use frontal_lexer::Token;
use log::{debug, trace};

use super::{
    error::{Recovery, SyntaxError},
    report::{ParseReport, Snapshot},
    table::ParseTable,
};
use crate::{
    grammar::{Grammar, ProductionId},
    ActionKind, Lookahead, Symbol,
};

/// Receives the action symbols popped by the [`Ll1`] driver.
pub trait ActionHandler {
    /// Called when `action` is popped. `consumed` holds every token before `index`, so its last
    /// element is the most recently matched one.
    fn on_action(&mut self, action: ActionKind, consumed: &[Token], index: usize);
}

impl ActionHandler for () {
    fn on_action(&mut self, _: ActionKind, _: &[Token], _: usize) {}
}

/// Table-driven LL(1) parser.
///
/// Syntax errors never stop a run. The driver recovers with the following rule and keeps
/// going, so one run reports every error it can find:
///
/// - a terminal on top that does not match is popped, and the offending token is skipped
///   unless the input is exhausted;
/// - a nonterminal on top without an entry for the lookahead is popped when the lookahead
///   may follow it (or the input is exhausted), otherwise the token is skipped;
/// - input left over once the stack is empty is discarded as a whole.
#[derive(Debug, Clone)]
pub struct Ll1 {
    grammar: Grammar,
    table: ParseTable,
}

impl Ll1 {
    /// Builds the parse table of `grammar`. Conflicts are kept in the table, see
    /// [`ParseTable::conflicts`].
    pub fn new(grammar: Grammar) -> Self {
        let table = ParseTable::build(&grammar);
        Self { grammar, table }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Parses `tokens`, ignoring action symbols.
    pub fn parse(&self, tokens: &[Token]) -> ParseReport {
        self.parse_with(tokens, &mut ())
    }

    /// Parses `tokens`, handing every action symbol to `handler`.
    pub fn parse_with<H>(&self, tokens: &[Token], handler: &mut H) -> ParseReport
    where
        H: ActionHandler + ?Sized,
    {
        let mut stack = Vec::from([Symbol::NonTerminal(self.grammar.start().to_string())]);
        let mut index = 0;
        let mut report = ParseReport {
            accepted: true,
            snapshots: Vec::new(),
        };

        loop {
            let token = tokens.get(index);
            let lookahead = token.map_or(Lookahead::Eof, |t| Lookahead::T(t.tag.clone()));
            let Some(top) = stack.last().cloned() else {
                match token {
                    None => {
                        let derivation = if report.accepted { "accept" } else { "reject" };
                        record(&mut report, &stack, &tokens[index..], None, derivation.into(), None);
                        break;
                    }
                    Some(token) => {
                        let error = SyntaxError {
                            received: Some(token.clone()),
                            expected: vec![Lookahead::Eof.to_string()],
                            recovery: Recovery::DiscardInput,
                        };
                        record(
                            &mut report,
                            &stack,
                            &tokens[index..],
                            None,
                            "error: discard remaining input".into(),
                            Some(error),
                        );
                        index = tokens.len();
                        continue;
                    }
                }
            };

            match top {
                Symbol::Action(action) => {
                    stack.pop();
                    trace!("action {} at token {}", action.name(), index);
                    handler.on_action(action, &tokens[..index], index);
                }
                Symbol::Epsilon => {
                    stack.pop();
                }
                Symbol::Terminal(ref terminal) if lookahead == Lookahead::T(terminal.clone()) => {
                    record(&mut report, &stack, &tokens[index..], None, format!("match {}", top), None);
                    stack.pop();
                    index += 1;
                }
                Symbol::Terminal(ref terminal) => {
                    let (recovery, derivation) = match token {
                        Some(token) => (
                            Recovery::PopTerminalAndSkip,
                            format!("error: pop {} and skip {}", top, token.tag),
                        ),
                        None => (Recovery::PopTerminal, format!("error: pop {}", top)),
                    };
                    let error = SyntaxError {
                        received: token.cloned(),
                        expected: vec![terminal.clone()],
                        recovery,
                    };
                    record(&mut report, &stack, &tokens[index..], None, derivation, Some(error));

                    stack.pop();
                    if token.is_some() {
                        index += 1;
                    }
                }
                Symbol::NonTerminal(ref variable) => {
                    match self.table.get(variable, &lookahead) {
                        Some(id) => {
                            let derivation = self
                                .grammar
                                .production(id)
                                .map(ToString::to_string)
                                .unwrap_or_default();
                            record(&mut report, &stack, &tokens[index..], Some(id), derivation, None);

                            stack.pop();
                            if let Some(production) = self.grammar.production(id) {
                                stack.extend(
                                    production
                                        .body
                                        .iter()
                                        .rev()
                                        .filter(|s| **s != Symbol::Epsilon)
                                        .cloned(),
                                );
                            }
                        }
                        None => {
                            let may_follow = self
                                .grammar
                                .follow(variable)
                                .is_some_and(|f| f.contains(&lookahead));
                            let (recovery, derivation) = match token {
                                Some(token) if !may_follow => (
                                    Recovery::SkipToken,
                                    format!("error: skip {}", token.tag),
                                ),
                                _ => (Recovery::PopNonTerminal, format!("error: pop {}", variable)),
                            };
                            let error = SyntaxError {
                                received: token.cloned(),
                                expected: self
                                    .table
                                    .expected(variable)
                                    .map(ToString::to_string)
                                    .collect(),
                                recovery,
                            };
                            record(&mut report, &stack, &tokens[index..], None, derivation, Some(error));

                            match recovery {
                                Recovery::SkipToken => index += 1,
                                _ => {
                                    stack.pop();
                                }
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "parsed {} tokens in {} steps, accepted: {}",
            tokens.len(),
            report.snapshots.len(),
            report.accepted
        );

        report
    }
}

/// Appends a snapshot of the state before the current step.
fn record(
    report: &mut ParseReport,
    stack: &[Symbol],
    rest: &[Token],
    production: Option<ProductionId>,
    derivation: String,
    error: Option<SyntaxError>,
) {
    let snapshot = Snapshot {
        step: report.snapshots.len() + 1,
        stack: render_stack(stack),
        input: render_input(rest),
        production,
        derivation,
        error,
    };
    trace!("{}", snapshot);
    if snapshot.is_error() {
        report.accepted = false;
    }
    report.snapshots.push(snapshot);
}

fn render_stack(stack: &[Symbol]) -> Vec<String> {
    std::iter::once(Lookahead::Eof.to_string())
        .chain(stack.iter().map(ToString::to_string))
        .collect()
}

fn render_input(rest: &[Token]) -> Vec<String> {
    rest.iter()
        .map(|t| t.tag.clone())
        .chain(std::iter::once(Lookahead::Eof.to_string()))
        .collect()
}
