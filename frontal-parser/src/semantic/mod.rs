//! Symbol tables built from the action symbols of a parse run.

use frontal_lexer::Token;
use log::{debug, warn};
use serde::Serialize;

use self::table::{Entry, EntryKind, Forest, TableId};
use crate::{parser::ll1::ActionHandler, ActionKind};

pub mod table;

/// A name declared again where it is already bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redeclaration {
    pub name: String,
    pub kind: EntryKind,
    pub token: Token,
    /// Token of the earlier declaration.
    pub previous: Token,
}

impl std::fmt::Display for Redeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[ERROR] ({}, {}): {} `{}` redeclared, previously declared at ({}, {})",
            self.token.row,
            self.token.col,
            self.kind,
            self.name,
            self.previous.row,
            self.previous.col
        )
    }
}

impl std::error::Error for Redeclaration {}

/// Where a new declaration is looked for before it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Skip,
    /// Only the current table.
    Local,
    /// The current table and every enclosing one.
    Chain,
}

/// Maintains the stack of open scopes while the parser pops action symbols.
///
/// Classes, functions and parameters must be unique within their own table. Variables are
/// looked up through the whole scope chain: a clash inside the current table is always a
/// redeclaration, while a clash with an enclosing table only counts when the earlier entry is
/// not a variable, so variables may shadow variables. Program entries are never checked.
/// Redeclared names still get their entry, the clash is only recorded.
#[derive(Debug, Clone, Default)]
pub struct ScopeBuilder {
    forest: Forest,
    stack: Vec<TableId>,
    pending_type: Vec<Token>,
    diagnostics: Vec<Redeclaration>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `action` with the tokens consumed so far.
    pub fn apply(&mut self, action: ActionKind, consumed: &[Token]) {
        match action {
            ActionKind::CreateGlobalTable => {
                let id = self.forest.add_table("global", true);
                self.stack.push(id);
            }
            ActionKind::CreateClassTableAndEntry => {
                self.open_scope(EntryKind::Class, consumed, Check::Local)
            }
            ActionKind::CreateFunctionEntryAndTable => {
                self.open_scope(EntryKind::Function, consumed, Check::Local)
            }
            ActionKind::CreateProgramEntryAndTable => {
                self.open_scope(EntryKind::Program, consumed, Check::Skip)
            }
            ActionKind::Parent => {
                if self.stack.pop().is_none() {
                    warn!("`{}` with no open scope", action.name());
                }
            }
            ActionKind::BeginType => {
                self.pending_type = consumed.last().cloned().into_iter().collect();
            }
            ActionKind::MoreType => self.pending_type.extend(consumed.last().cloned()),
            ActionKind::CreateVariableEntry => {
                self.declare(EntryKind::Variable, consumed, Check::Chain);
            }
            ActionKind::CreateParameterEntry => {
                self.declare(EntryKind::Parameter, consumed, Check::Local);
            }
        }
    }

    /// Table on top of the scope stack.
    pub fn current(&self) -> Option<TableId> {
        self.stack.last().copied()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn pending_type(&self) -> &[Token] {
        &self.pending_type
    }

    /// Looks `name` up in the current table only.
    pub fn search_entry_locally(&self, name: &str) -> Option<&Entry> {
        self.current()
            .and_then(|id| self.forest.table(id))
            .and_then(|table| table.find(name))
    }

    /// Looks `name` up from the current table outwards and returns the first match along
    /// with the table it was found in. The scope stack is left as it was.
    pub fn search_entry(&self, name: &str) -> Option<(TableId, &Entry)> {
        self.stack.iter().rev().find_map(|&id| {
            self.forest
                .table(id)
                .and_then(|table| table.find(name))
                .map(|entry| (id, entry))
        })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn diagnostics(&self) -> &[Redeclaration] {
        &self.diagnostics
    }

    /// Pre-order listing of every table.
    pub fn render(&self) -> String {
        self.forest.render()
    }

    pub fn into_parts(self) -> (Forest, Vec<Redeclaration>) {
        (self.forest, self.diagnostics)
    }

    /// Adds an entry named after the last consumed token to the current table, then opens its
    /// nested table.
    fn open_scope(&mut self, kind: EntryKind, consumed: &[Token], check: Check) {
        let Some((current, index)) = self.declare(kind, consumed, check) else {
            return;
        };

        let Some(table) = self.forest.table(current) else {
            return;
        };
        let name = table.entries[index].name.clone();
        let nested = self.forest.add_table(name, false);
        if let Some(table) = self.forest.table_mut(current) {
            table.entries[index].link = Some(nested);
        }
        self.stack.push(nested);
    }

    /// Adds an entry named after the last consumed token to the current table. Returns the
    /// table and the index of the new entry.
    fn declare(&mut self, kind: EntryKind, consumed: &[Token], check: Check) -> Option<(TableId, usize)> {
        let Some(token) = consumed.last() else {
            warn!("{} declared before any token was read", kind);
            return None;
        };
        let Some(current) = self.current() else {
            warn!("{} `{}` declared outside of any scope", kind, token.lexeme);
            return None;
        };

        let previous = match check {
            Check::Skip => None,
            Check::Local => self.search_entry_locally(&token.lexeme),
            Check::Chain => self
                .search_entry(&token.lexeme)
                .filter(|(table, entry)| *table == current || entry.kind != EntryKind::Variable)
                .map(|(_, entry)| entry),
        }
        .map(|entry| entry.token.clone());

        if let Some(previous) = previous {
            let redeclaration = Redeclaration {
                name: token.lexeme.clone(),
                kind,
                token: token.clone(),
                previous,
            };
            warn!("{}", redeclaration);
            self.diagnostics.push(redeclaration);
        }

        let type_tokens = match kind {
            EntryKind::Variable | EntryKind::Parameter => self.pending_type.clone(),
            _ => Vec::new(),
        };
        let table = self.forest.table_mut(current)?;
        table.entries.push(Entry {
            name: token.lexeme.clone(),
            kind,
            type_tokens,
            link: None,
            token: token.clone(),
        });
        debug!("{} `{}` added to table {}", kind, token.lexeme, table.name);

        Some((current, table.entries.len() - 1))
    }
}

impl ActionHandler for ScopeBuilder {
    fn on_action(&mut self, action: ActionKind, consumed: &[Token], _: usize) {
        self.apply(action, consumed);
    }
}

#[cfg(test)]
mod tests {
    use frontal_lexer::Token;

    use super::{EntryKind, ScopeBuilder};
    use crate::{ActionKind, Ll1};

    fn token(lexeme: &str, row: usize, col: usize) -> Token {
        Token::new("id", lexeme, row, col)
    }

    /// Applies `actions`, each with the tokens read so far.
    fn run(actions: &[(ActionKind, Option<Token>)]) -> ScopeBuilder {
        let mut builder = ScopeBuilder::new();
        let mut consumed = Vec::new();
        for (action, token) in actions {
            consumed.extend(token.clone());
            builder.apply(*action, &consumed);
        }
        builder
    }

    #[test]
    fn variable_redeclared_in_same_table() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (BeginType, Some(token("int", 1, 1))),
            (CreateVariableEntry, Some(token("x", 1, 5))),
            (BeginType, Some(token("float", 2, 1))),
            (CreateVariableEntry, Some(token("x", 2, 7))),
        ]);

        let diagnostics = builder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!((diagnostics[0].token.row, diagnostics[0].token.col), (2, 7));
        assert_eq!((diagnostics[0].previous.row, diagnostics[0].previous.col), (1, 5));
        assert_eq!(
            diagnostics[0].to_string(),
            "[ERROR] (2, 7): variable `x` redeclared, previously declared at (1, 5)"
        );
        // the entry is still added
        assert_eq!(builder.forest().tables()[0].entries.len(), 2);
    }

    #[test]
    fn variables_shadow_enclosing_variables() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (BeginType, Some(token("int", 1, 1))),
            (CreateVariableEntry, Some(token("x", 1, 5))),
            (CreateFunctionEntryAndTable, Some(token("f", 2, 1))),
            (BeginType, Some(token("int", 3, 1))),
            (CreateVariableEntry, Some(token("x", 3, 5))),
            (Parent, None),
        ]);

        assert!(builder.diagnostics().is_empty());
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn variables_clash_with_enclosing_functions() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (CreateFunctionEntryAndTable, Some(token("f", 1, 1))),
            (BeginType, Some(token("int", 2, 1))),
            (CreateVariableEntry, Some(token("f", 2, 5))),
        ]);

        assert_eq!(builder.diagnostics().len(), 1);
        assert_eq!(builder.diagnostics()[0].previous.col, 1);
    }

    #[test]
    fn classes_functions_and_parameters_are_checked_locally() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (CreateClassTableAndEntry, Some(token("A", 1, 1))),
            (CreateFunctionEntryAndTable, Some(token("A", 2, 1))),
            (BeginType, Some(token("int", 2, 5))),
            (CreateParameterEntry, Some(token("a", 2, 9))),
            (CreateParameterEntry, Some(token("a", 2, 12))),
            (Parent, None),
            (CreateFunctionEntryAndTable, Some(token("A", 4, 1))),
            (Parent, None),
            (Parent, None),
            (CreateClassTableAndEntry, Some(token("A", 6, 1))),
        ]);

        let clashes = builder
            .diagnostics()
            .iter()
            .map(|d| (d.kind, d.token.row))
            .collect::<Vec<_>>();
        assert_eq!(
            clashes,
            [
                (EntryKind::Parameter, 2),
                (EntryKind::Function, 4),
                (EntryKind::Class, 6)
            ]
        );
    }

    #[test]
    fn programs_are_not_checked() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (CreateProgramEntryAndTable, Some(token("main", 1, 1))),
            (Parent, None),
            (CreateProgramEntryAndTable, Some(token("main", 2, 1))),
        ]);

        assert!(builder.diagnostics().is_empty());
    }

    #[test]
    fn types_collect_consumed_tokens() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (BeginType, Some(token("unsigned", 1, 1))),
            (MoreType, Some(token("long", 1, 10))),
            (CreateVariableEntry, Some(token("n", 1, 15))),
        ]);

        let entry = builder.search_entry_locally("n").expect("n was declared");
        assert_eq!(entry.type_text(), "unsigned long");
        assert_eq!(entry.kind, EntryKind::Variable);
    }

    #[test]
    fn search_leaves_the_stack_alone() {
        use ActionKind::*;

        let builder = run(&[
            (CreateGlobalTable, None),
            (BeginType, Some(token("int", 1, 1))),
            (CreateVariableEntry, Some(token("g", 1, 5))),
            (CreateClassTableAndEntry, Some(token("C", 2, 1))),
        ]);
        let current = builder.current();

        assert_eq!(builder.search_entry("g").map(|(table, _)| table), Some(0));
        assert!(builder.search_entry_locally("g").is_none());
        assert_eq!(builder.current(), current);
        assert_eq!(builder.depth(), 2);
    }

    #[test]
    fn unbalanced_parent_is_ignored() {
        let builder = run(&[(ActionKind::Parent, None), (ActionKind::CreateVariableEntry, None)]);

        assert_eq!(builder.depth(), 0);
        assert!(builder.forest().is_empty());
    }

    #[test]
    fn render_is_preorder() -> Result<(), Box<dyn std::error::Error>> {
        let grammar = "\
Prog -> create_global_table Decls parent
Decls -> Decl Decls | EPSILON
Decl -> 'class' 'id' create_class_table_and_entry '{' Members '}' parent
      | 'func' 'id' create_function_entry_and_table '(' ')' Body parent
      | Type 'id' create_variable_entry ';'
Members -> Member Members | EPSILON
Member -> Type 'id' create_variable_entry ';'
Body -> '{' Members '}'
Type -> 'int' begin_type
";
        let tags = [
            "int", "id", ";", "class", "id", "{", "int", "id", ";", "}", "func", "id", "(", ")",
            "{", "int", "id", ";", "}",
        ];
        let lexemes = [
            "int", "x", ";", "class", "A", "{", "int", "y", ";", "}", "func", "f", "(", ")", "{",
            "int", "x", ";", "}",
        ];
        let tokens = tags
            .iter()
            .zip(lexemes.iter())
            .enumerate()
            .map(|(i, (tag, lexeme))| Token::new(*tag, *lexeme, 1, i + 1))
            .collect::<Vec<_>>();

        let mut builder = ScopeBuilder::new();
        let report = Ll1::new(grammar.parse()?).parse_with(&tokens, &mut builder);

        assert!(report.accepted);
        assert!(builder.diagnostics().is_empty());
        assert_eq!(
            builder.render(),
            "\
table global
  variable x: int
  class A -> A
  function f -> f
table A
  variable y: int
table f
  variable x: int
"
        );
        assert_eq!(builder.forest().roots(), [0]);
        assert_eq!(builder.depth(), 0);
        Ok(())
    }
}
