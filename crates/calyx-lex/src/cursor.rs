//! Character cursor for source traversal.

/// A cursor over source text with line/column tracking.
///
/// The source is required to be valid UTF-8; the language surface itself is
/// ASCII, so the cursor walks bytes and only falls back to char decoding
/// for error reporting.
pub struct Cursor<'a> {
    source: &'a str,
    /// Current byte position.
    position: usize,
    /// Current line (1-based).
    line: u32,
    /// Current column (1-based).
    column: u32,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// The full source text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current line (1-based).
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column (1-based).
    pub fn column(&self) -> u32 {
        self.column
    }

    /// True when the cursor has consumed all input.
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// The character at the cursor, or `'\0'` at end of input.
    pub fn current_char(&self) -> char {
        self.source[self.position..].chars().next().unwrap_or('\0')
    }

    /// The character `n` positions ahead of the cursor, or `'\0'`.
    pub fn peek_char(&self, n: usize) -> char {
        self.source[self.position..].chars().nth(n).unwrap_or('\0')
    }

    /// Advance past the current character, updating line/column counters.
    pub fn advance(&mut self) {
        if let Some(c) = self.source[self.position..].chars().next() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Slice of the source from `start` up to the cursor.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines() {
        let mut cursor = Cursor::new("ab\nc");
        assert_eq!(cursor.current_char(), 'a');
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.line(), 1);
        cursor.advance();
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 1);
        assert_eq!(cursor.current_char(), 'c');
    }

    #[test]
    fn test_end_of_input() {
        let mut cursor = Cursor::new("x");
        cursor.advance();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.current_char(), '\0');
        cursor.advance();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_slice_from() {
        let mut cursor = Cursor::new("hello world");
        let start = cursor.position();
        for _ in 0..5 {
            cursor.advance();
        }
        assert_eq!(cursor.slice_from(start), "hello");
    }
}
