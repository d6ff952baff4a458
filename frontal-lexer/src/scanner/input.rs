/// Cursor over a single input line.
///
/// It keeps track of where the token being built started and how far the scanner has read.
/// The line is followed by a terminator character (newline, or end of file for the last
/// line) that acts as the final lookahead.
pub(super) struct LineCursor {
    chars: Vec<char>,
    /// Number of characters belonging to the line itself, excluding the terminator.
    len: usize,
    token_start: usize,
    pos: usize,
}

/// Token returned by the [`LineCursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CursorToken {
    pub(super) lexeme: String,
    /// 1-based column of the first character.
    pub(super) col: usize,
}

impl LineCursor {
    pub(super) fn new(line: &str, terminator: char) -> Self {
        let mut chars = line.chars().collect::<Vec<_>>();
        let len = chars.len();
        chars.push(terminator);

        Self {
            chars,
            len,
            token_start: 0,
            pos: 0,
        }
    }

    /// Whether every character of the line itself has been read.
    pub(super) fn exhausted(&self) -> bool {
        self.pos >= self.len
    }

    /// Whether characters have been read since the last token was taken.
    pub(super) fn pending(&self) -> bool {
        self.pos > self.token_start
    }

    /// Gives the last read character back, as long as the token keeps at least one character.
    pub(super) fn push_back(&mut self) {
        if self.pos > self.token_start + 1 {
            self.pos -= 1;
        }
    }

    /// Drops the characters read since the last token, e.g. separators.
    pub(super) fn discard(&mut self) {
        self.token_start = self.pos;
    }

    /// Takes the token spanning from the token start to the read position. The terminator is
    /// never part of the lexeme.
    pub(super) fn consume_token(&mut self) -> CursorToken {
        let end = self.pos.min(self.len);
        let token = CursorToken {
            lexeme: self.chars[self.token_start.min(end)..end].iter().collect(),
            col: self.token_start + 1,
        };
        self.token_start = self.pos;
        token
    }
}

impl Iterator for LineCursor {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorToken, LineCursor};

    #[test]
    fn push_back_keeps_one_character() {
        let mut cursor = LineCursor::new("ab", '\n');
        cursor.next();
        cursor.push_back();
        assert!(cursor.pending());

        cursor.next();
        cursor.push_back();
        assert_eq!(
            cursor.consume_token(),
            CursorToken {
                lexeme: "a".into(),
                col: 1
            }
        );
        assert!(!cursor.exhausted());
    }

    #[test]
    fn terminator_is_not_part_of_the_lexeme() {
        let mut cursor = LineCursor::new("x", '\0');
        assert_eq!(cursor.by_ref().collect::<String>(), "x\0");
        assert!(cursor.exhausted());
        assert_eq!(cursor.consume_token().lexeme, "x");
    }
}
