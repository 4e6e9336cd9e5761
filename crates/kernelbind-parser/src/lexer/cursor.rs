/// A cursor over a declaration string that tracks the byte offset.
///
/// Declarations are single lines, so only the offset is tracked.
pub struct Cursor<'src> {
    source: &'src str,
    /// Remaining text starting at the current position.
    rest: &'src str,
    offset: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume the current character.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.rest.chars().next()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        Some(ch)
    }

    /// Consume `n` bytes; `n` must land on a character boundary.
    pub fn advance_bytes(&mut self, n: usize) {
        debug_assert!(self.rest.is_char_boundary(n));
        self.rest = &self.rest[n..];
        self.offset += n as u32;
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches, returning the slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Source text from `start` to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("int n");
        assert_eq!(cursor.peek(), Some('i'));
        assert_eq!(cursor.advance(), Some('i'));
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.eat_while(is_ident_continue), "nt");
        assert!(cursor.eat(' '));
        assert_eq!(cursor.peek_nth(0), Some('n'));
        cursor.advance_bytes(1);
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn slice_tracks_offsets() {
        let mut cursor = Cursor::new("c3d::string_t s");
        cursor.eat_while(is_ident_continue);
        assert!(cursor.check_str("::"));
        cursor.advance_bytes(2);
        cursor.eat_while(is_ident_continue);
        assert_eq!(cursor.slice_from(0), "c3d::string_t");
    }
}
