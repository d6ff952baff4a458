use std::collections::BTreeMap;

use serde::Deserialize;

/// Lookup tables handed to a [`Scanner`](super::Scanner) at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Marker symbols standing for character classes on automaton transitions.
    pub classes: ClassHeader,
    /// Tags starting with this prefix denote lexical errors.
    pub error_prefix: String,
    /// Tag of identifier tokens eligible for keyword re-tagging.
    pub identifier_tag: Option<String>,
    /// Reserved words: lexeme to token tag.
    pub keywords: BTreeMap<String, String>,
    /// Human-readable message per error tag.
    pub messages: BTreeMap<String, String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            classes: ClassHeader::default(),
            error_prefix: "ERR_".into(),
            identifier_tag: None,
            keywords: BTreeMap::new(),
            messages: BTreeMap::new(),
        }
    }
}

impl ScannerConfig {
    pub fn with_identifier_tag(mut self, tag: impl Into<String>) -> Self {
        self.identifier_tag = Some(tag.into());
        self
    }

    pub fn with_keyword(mut self, lexeme: impl Into<String>, tag: impl Into<String>) -> Self {
        self.keywords.insert(lexeme.into(), tag.into());
        self
    }

    pub fn with_message(mut self, tag: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(tag.into(), message.into());
        self
    }
}

/// Transition symbols that stand for a whole character class rather than a literal.
///
/// Letters and nonzero digits are always classified by class, so literal transitions on them
/// could never fire. Using capital letters as markers is therefore unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassHeader {
    pub letter: char,
    /// Digits `1` to `9`. `0` is an ordinary literal symbol.
    pub digit: char,
    /// Space and tab.
    pub space: char,
    pub newline: char,
    /// End of input.
    pub eof: char,
    /// Wildcard taken for anything without a direct transition.
    pub other: char,
}

impl Default for ClassHeader {
    fn default() -> Self {
        Self {
            letter: 'L',
            digit: 'D',
            space: 'S',
            newline: 'N',
            eof: 'E',
            other: 'O',
        }
    }
}
