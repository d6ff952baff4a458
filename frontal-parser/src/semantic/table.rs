use frontal_lexer::Token;
use serde::Serialize;

/// Index of a [`SymbolTable`] in its [`Forest`].
pub type TableId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Variable,
    Parameter,
    Function,
    Class,
    Program,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryKind::Variable => "variable",
            EntryKind::Parameter => "parameter",
            EntryKind::Function => "function",
            EntryKind::Class => "class",
            EntryKind::Program => "program",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Tokens spelling the declared type, for variables and parameters.
    pub type_tokens: Vec<Token>,
    /// Nested table of a function, class or program.
    pub link: Option<TableId>,
    /// Token the entry was declared with.
    pub token: Token,
}

impl Entry {
    /// Lexemes of the type tokens separated by spaces.
    pub fn type_text(&self) -> String {
        self.type_tokens
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    pub name: String,
    pub entries: Vec<Entry>,
}

impl SymbolTable {
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Every table created during a run. Tables form trees through [`Entry::link`], rooted at the
/// tables opened without an enclosing entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Forest {
    tables: Vec<SymbolTable>,
    roots: Vec<TableId>,
}

impl Forest {
    pub(super) fn add_table(&mut self, name: impl Into<String>, root: bool) -> TableId {
        let id = self.tables.len();
        self.tables.push(SymbolTable {
            name: name.into(),
            entries: Vec::new(),
        });
        if root {
            self.roots.push(id);
        }
        id
    }

    pub(super) fn table_mut(&mut self, id: TableId) -> Option<&mut SymbolTable> {
        self.tables.get_mut(id)
    }

    pub fn table(&self, id: TableId) -> Option<&SymbolTable> {
        self.tables.get(id)
    }

    pub fn tables(&self) -> &[SymbolTable] {
        &self.tables
    }

    pub fn roots(&self) -> &[TableId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in pre-order: each table followed by the tables linked from its entries, in
    /// entry order.
    pub fn preorder(&self) -> Vec<TableId> {
        let mut order = Vec::with_capacity(self.tables.len());
        let mut pending = self.roots.iter().rev().copied().collect::<Vec<_>>();

        while let Some(id) = pending.pop() {
            let Some(table) = self.tables.get(id) else {
                continue;
            };
            order.push(id);
            pending.extend(table.entries.iter().rev().filter_map(|e| e.link));
        }

        order
    }

    /// Text listing of every table in pre-order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in self.preorder() {
            let table = &self.tables[id];
            out.push_str(&format!("table {}\n", table.name));
            for entry in table.entries.iter() {
                out.push_str(&format!("  {} {}", entry.kind, entry.name));
                if !entry.type_tokens.is_empty() {
                    out.push_str(&format!(": {}", entry.type_text()));
                }
                if let Some(link) = entry.link.and_then(|l| self.tables.get(l)) {
                    out.push_str(&format!(" -> {}", link.name));
                }
                out.push('\n');
            }
        }
        out
    }
}
