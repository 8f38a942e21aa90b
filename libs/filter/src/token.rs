//! Token types for the filter lexer
//!
//! Tokens represent the lexical elements of filter expressions. Every token
//! carries the raw source text it was scanned from.

use std::fmt;

/// Location of a token in the source: byte offset plus 1-based line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (byte {})", self.line, self.column, self.offset)
    }
}

/// Token types for the filter lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Text,
    String,
    Int,
    Numeric,
    Hex,
    Oct,
    Duration,
    Timestamp,
    Bool,
    Null,

    // Keywords
    And,
    Or,
    Not,
    In,

    // Comparators
    Equals,        // =
    NotEquals,     // !=
    LessThan,      // <
    LessEquals,    // <=
    GreaterThan,   // >
    GreaterEquals, // >=
    Has,           // :

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
    Comma,        // ,
    Dot,          // .
    Minus,        // -

    Whitespace,

    // End of input
    Eof,

    // Malformed input
    Illegal,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::In
        )
    }

    /// Comparators spelled with punctuation (`IN` is a keyword and handled separately).
    pub fn is_comparator(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::LessThan
                | TokenKind::LessEquals
                | TokenKind::GreaterThan
                | TokenKind::GreaterEquals
                | TokenKind::Has
        )
    }

    /// Literal tokens that form unquoted text leaves.
    pub fn is_text_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::Int
                | TokenKind::Numeric
                | TokenKind::Hex
                | TokenKind::Oct
                | TokenKind::Duration
                | TokenKind::Timestamp
                | TokenKind::Bool
                | TokenKind::Null
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Hex | TokenKind::Oct)
    }

    pub fn is_number(self) -> bool {
        self.is_integer() || self == TokenKind::Numeric
    }

    /// Any token that can be a value, field or name leaf.
    pub fn is_leaf(self) -> bool {
        self.is_text_literal() || self.is_keyword() || self == TokenKind::String
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::String => "string",
            TokenKind::Int => "integer",
            TokenKind::Numeric => "number",
            TokenKind::Hex => "hex literal",
            TokenKind::Oct => "octal literal",
            TokenKind::Duration => "duration",
            TokenKind::Timestamp => "timestamp",
            TokenKind::Bool => "boolean",
            TokenKind::Null => "null",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::In => "IN",
            TokenKind::Equals => "'='",
            TokenKind::NotEquals => "'!='",
            TokenKind::LessThan => "'<'",
            TokenKind::LessEquals => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterEquals => "'>='",
            TokenKind::Has => "':'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Minus => "'-'",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Eof => "end of input",
            TokenKind::Illegal => "illegal token",
        }
    }
}

/// A token in the filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    pub fn eof(pos: Position) -> Self {
        Self::new(TokenKind::Eof, String::new(), pos)
    }

    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.pos.offset + self.text.len()
    }
}
