//! Tokenizer for native signature declarations.
//!
//! Qualified names (`c3d::string_t`, `MbCube::Foo`) are produced as a single
//! [`TokenKind::Identifier`] so the parser never has to reassemble them.

use std::collections::VecDeque;

use kernelbind_core::{ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer with arbitrary lookahead.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    lookahead: VecDeque<Token<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            lookahead: VecDeque::with_capacity(2),
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token<'src>, ParseError> {
        if let Some(token) = self.lookahead.pop_front() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token<'src>, ParseError> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> Result<Token<'src>, ParseError> {
        while self.lookahead.len() <= n {
            let token = self.scan_token()?;
            self.lookahead.push_back(token);
        }
        Ok(self.lookahead[n])
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Result<Token<'src>, ParseError> {
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.offset();
        let Some(ch) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::point(start)));
        };

        match ch {
            c if is_ident_start(c) => Ok(self.scan_identifier(start)),
            c if c.is_ascii_digit() => Ok(self.scan_number(start)),
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.scan_number(start))
            }
            _ => self.scan_punct(start, ch),
        }
    }

    fn scan_identifier(&mut self, start: u32) -> Token<'src> {
        self.cursor.eat_while(is_ident_continue);
        // Join `a::b::c` into one name.
        while self.cursor.check_str("::") && self.cursor.peek_nth(2).is_some_and(is_ident_start) {
            self.cursor.advance_bytes(2);
            self.cursor.eat_while(is_ident_continue);
        }
        let lexeme = self.cursor.slice_from(start);
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    fn scan_number(&mut self, start: u32) -> Token<'src> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.eat('.') {
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        if self.cursor.check(|c| c == 'e' || c == 'E') {
            let signed = matches!(self.cursor.peek_nth(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.advance_bytes(digit_at);
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }
        // Literal suffixes: 1.0f, 10u, 5L
        self.cursor.eat_while(|c| matches!(c, 'f' | 'F' | 'u' | 'U' | 'l' | 'L'));
        self.make_token(TokenKind::Number, start)
    }

    fn scan_punct(&mut self, start: u32, ch: char) -> Result<Token<'src>, ParseError> {
        let kind = match ch {
            '*' => TokenKind::Star,
            '&' => TokenKind::Amp,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '=' => TokenKind::Equal,
            '-' => TokenKind::Minus,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    Span::new(start, other.len_utf8() as u32),
                    format!("'{other}'"),
                ));
            }
        };
        self.cursor.advance();
        Ok(self.make_token(kind, start))
    }

    fn make_token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let lexeme = self.cursor.slice_from(start);
        Token::new(kind, lexeme, Span::new(start, self.cursor.offset() - start))
    }
}
