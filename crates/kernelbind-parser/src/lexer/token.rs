//! Tokens of native signature declarations.

use std::fmt;

use kernelbind_core::Span;

/// A token borrowed from the declaration string.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A possibly qualified name: `MbSolid`, `c3d::string_t`, `MbCube::Foo`.
    Identifier,
    /// Numeric literal: `0`, `1.5`, `1e-6`.
    Number,

    // Keywords
    Const,
    Static,
    Virtual,

    // Punctuation
    Star,
    Amp,
    Less,
    Greater,
    Comma,
    LeftParen,
    RightParen,
    Equal,
    Minus,

    Eof,
}

impl TokenKind {
    /// Human-readable form for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Const => "'const'",
            TokenKind::Static => "'static'",
            TokenKind::Virtual => "'virtual'",
            TokenKind::Star => "'*'",
            TokenKind::Amp => "'&'",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::Comma => "','",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Equal => "'='",
            TokenKind::Minus => "'-'",
            TokenKind::Eof => "end of declaration",
        }
    }
}

/// Map reserved words to their token kinds.
pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
    match word {
        "const" => Some(TokenKind::Const),
        "static" => Some(TokenKind::Static),
        "virtual" => Some(TokenKind::Virtual),
        _ => None,
    }
}
