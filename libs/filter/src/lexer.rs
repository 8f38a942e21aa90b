//! Filter lexer - tokenizes filter strings
//!
//! Converts filter text into a stream of tokens. Whitespace is kept as a token
//! because the parser enforces whitespace rules between operators. The lexer
//! never fails: malformed literals come back as [`TokenKind::Illegal`] tokens,
//! are counted, and are reported once through the error callback.

use crate::error::{report, ErrorCallback};
use crate::temporal::{self, SECOND_ORDER};
use crate::token::{Position, Token, TokenKind};

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "AND" => TokenKind::And,
    "OR" => TokenKind::Or,
    "NOT" => TokenKind::Not,
    "IN" => TokenKind::In,
    "true" => TokenKind::Bool,
    "false" => TokenKind::Bool,
    "null" => TokenKind::Null,
};

/// Saved lexer position; see [`Lexer::breakpoint`] and [`Lexer::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Breakpoint(Position);

impl Breakpoint {
    pub fn position(&self) -> Position {
        self.0
    }
}

/// The filter lexer
pub struct Lexer<'a> {
    input: &'a str,
    cursor: Position,
    /// Token scanned ahead of the cursor, with the cursor just past it.
    peeked: Option<(Token, Position)>,
    error_count: usize,
    /// Illegal tokens starting before this offset were already reported.
    reported_until: usize,
    on_error: Option<ErrorCallback>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: Position::START,
            peeked: None,
            error_count: 0,
            reported_until: 0,
            on_error: None,
        }
    }

    pub fn with_error_callback(mut self, callback: Option<ErrorCallback>) -> Self {
        self.on_error = callback;
        self
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Number of illegal tokens reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Position of the next token to be returned by [`scan`](Self::scan).
    pub fn position(&self) -> Position {
        self.cursor
    }

    /// Return the next token and advance past it.
    pub fn scan(&mut self) -> Token {
        if let Some((token, after)) = self.peeked.take() {
            self.cursor = after;
            return token;
        }
        self.next_token()
    }

    /// Look at the next token; it is consumed only when `consume` returns true.
    pub fn peek(&mut self, consume: impl FnOnce(&Token) -> bool) -> Token {
        let (token, after) = match self.peeked.take() {
            Some(peeked) => peeked,
            None => {
                let start = self.cursor;
                let token = self.next_token();
                let after = self.cursor;
                self.cursor = start;
                (token, after)
            }
        };
        if consume(&token) {
            self.cursor = after;
            token
        } else {
            self.peeked = Some((token.clone(), after));
            token
        }
    }

    pub fn breakpoint(&self) -> Breakpoint {
        Breakpoint(self.cursor)
    }

    /// Rewind to a breakpoint, discarding any peeked token.
    pub fn restore(&mut self, breakpoint: Breakpoint) {
        self.cursor = breakpoint.0;
        self.peeked = None;
    }

    /// Tokenize the entire input (including the trailing EOF token).
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.cursor.offset..]
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.cursor.offset += c.len_utf8();
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.current_char().is_some_and(&predicate) {
            self.advance();
            count += 1;
        }
        count
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token {
        Token::new(kind, &self.input[start.offset..self.cursor.offset], start)
    }

    /// Consume the rest of a malformed word and produce an illegal token.
    fn illegal(&mut self, start: Position, message: &str) -> Token {
        self.advance_while(is_text_char);
        if start.offset >= self.reported_until {
            self.error_count += 1;
            self.reported_until = start.offset + 1;
            tracing::trace!(offset = start.offset, message, "illegal token");
            report(self.on_error.as_ref(), start, message);
        }
        if self.cursor.offset == start.offset {
            // Always make progress.
            self.advance();
        }
        self.token(TokenKind::Illegal, start)
    }

    fn next_token(&mut self) -> Token {
        let start = self.cursor;
        let Some(c) = self.current_char() else {
            return Token::eof(start);
        };

        if c.is_whitespace() {
            self.advance_while(char::is_whitespace);
            return self.token(TokenKind::Whitespace, start);
        }
        if c.is_ascii_digit() {
            return self.read_number(start);
        }
        if c == '-' && self.peek_char(1).is_some_and(|n| n.is_ascii_digit()) {
            self.advance();
            return self.read_number(start);
        }
        if c == '"' || c == '\'' {
            return self.read_string(start, c);
        }
        if c.is_alphabetic() || c == '_' {
            self.advance_while(is_text_char);
            let text = &self.input[start.offset..self.cursor.offset];
            let kind = KEYWORDS.get(text).copied().unwrap_or(TokenKind::Text);
            return self.token(kind, start);
        }

        self.advance();
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            ':' => TokenKind::Has,
            '=' => TokenKind::Equals,
            '<' => self.followed_by('=', TokenKind::LessEquals, TokenKind::LessThan),
            '>' => self.followed_by('=', TokenKind::GreaterEquals, TokenKind::GreaterThan),
            '!' if self.current_char() == Some('=') => {
                self.advance();
                TokenKind::NotEquals
            }
            _ => {
                self.cursor = start;
                return self.illegal(start, &format!("unexpected character '{c}'"));
            }
        };
        self.token(kind, start)
    }

    fn followed_by(&mut self, next: char, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.current_char() == Some(next) {
            self.advance();
            then
        } else {
            otherwise
        }
    }

    fn read_string(&mut self, start: Position, quote: char) -> Token {
        self.advance();
        loop {
            match self.current_char() {
                None => {
                    self.reported_illegal(start, "unterminated string literal");
                    return self.token(TokenKind::Illegal, start);
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(c) if c == quote => {
                    self.advance();
                    return self.token(TokenKind::String, start);
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// Report without consuming further input (the string already reached EOF).
    fn reported_illegal(&mut self, start: Position, message: &str) {
        if start.offset >= self.reported_until {
            self.error_count += 1;
            self.reported_until = start.offset + 1;
            tracing::trace!(offset = start.offset, message, "illegal token");
            report(self.on_error.as_ref(), start, message);
        }
    }

    /// Read a number, an optional sign has already been consumed.
    ///
    /// Classification order: radix prefix, timestamp, decimal/exponent and finally a
    /// duration unit suffix (which wins over everything before it, so `0500m` is a
    /// duration).
    fn read_number(&mut self, start: Position) -> Token {
        let negative = self.cursor.offset != start.offset;

        if self.current_char() == Some('0') {
            match self.peek_char(1) {
                Some('x' | 'X') => {
                    self.advance();
                    self.advance();
                    return self.read_radix(start, TokenKind::Hex, |c| c.is_ascii_hexdigit());
                }
                Some('o' | 'O') => {
                    self.advance();
                    self.advance();
                    return self.read_radix(start, TokenKind::Oct, |c| ('0'..='7').contains(&c));
                }
                _ => {}
            }
        }

        let digits_start = self.cursor.offset;
        let digit_count = self.advance_while(|c| c.is_ascii_digit());
        let digits = &self.input[digits_start..self.cursor.offset];

        if !negative && digit_count == 4 && self.current_char() == Some('-') {
            return self.read_timestamp(start);
        }

        let mut kind = if digit_count > 1
            && digits.starts_with('0')
            && digits.bytes().all(|b| (b'0'..=b'7').contains(&b))
        {
            TokenKind::Oct
        } else {
            TokenKind::Int
        };

        let mut fractional = false;
        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
            kind = TokenKind::Numeric;
            fractional = true;
        }

        let mut exponent = false;
        if matches!(self.current_char(), Some('e' | 'E')) {
            let digit_at = match self.peek_char(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
                kind = TokenKind::Numeric;
                exponent = true;
            }
        }

        if let Some((unit, order)) = temporal::match_unit(self.rest()) {
            if exponent {
                return self.illegal(start, "duration components cannot use exponents");
            }
            return self.read_duration(start, unit, order, fractional);
        }

        if self.current_char().is_some_and(is_text_char) {
            return self.illegal(start, "malformed numeric literal");
        }
        self.token(kind, start)
    }

    fn read_radix(&mut self, start: Position, kind: TokenKind, is_digit: fn(char) -> bool) -> Token {
        if self.advance_while(is_digit) == 0 {
            return self.illegal(start, "radix prefix requires at least one digit");
        }
        if self.current_char().is_some_and(is_text_char) {
            return self.illegal(start, "malformed numeric literal");
        }
        self.token(kind, start)
    }

    /// Continue a duration once the first numeric component has been read and the
    /// cursor sits on its unit.
    fn read_duration(
        &mut self,
        start: Position,
        mut unit: &'static str,
        mut order: u8,
        mut fractional: bool,
    ) -> Token {
        let mut previous: Option<u8> = None;
        loop {
            if previous.is_some_and(|p| order >= p) {
                return self.illegal(start, "duration units must be in descending order");
            }
            if fractional && previous.is_some_and(|p| p < SECOND_ORDER) {
                return self.illegal(start, "fractional duration component after a sub-second unit");
            }
            for _ in unit.chars() {
                self.advance();
            }
            previous = Some(order);

            match self.current_char() {
                Some(c) if c.is_ascii_digit() => {
                    self.advance_while(|c| c.is_ascii_digit());
                    fractional = false;
                    if self.current_char() == Some('.')
                        && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
                    {
                        self.advance();
                        self.advance_while(|c| c.is_ascii_digit());
                        fractional = true;
                    }
                    match temporal::match_unit(self.rest()) {
                        Some((next_unit, next_order)) => {
                            unit = next_unit;
                            order = next_order;
                        }
                        None => return self.illegal(start, "duration component is missing a unit"),
                    }
                }
                Some(c) if is_text_char(c) => {
                    return self.illegal(start, "unknown duration unit");
                }
                _ => return self.token(TokenKind::Duration, start),
            }
        }
    }

    /// Read an RFC 3339 timestamp; the year has been consumed.
    fn read_timestamp(&mut self, start: Position) -> Token {
        match self.timestamp_tail() {
            Ok(()) if !self.current_char().is_some_and(is_text_char) => {
                self.token(TokenKind::Timestamp, start)
            }
            Ok(()) => self.illegal(start, "unexpected characters after timestamp"),
            Err(message) => self.illegal(start, message),
        }
    }

    fn timestamp_tail(&mut self) -> Result<(), &'static str> {
        let year: u32 = self.input[self.cursor.offset - 4..self.cursor.offset]
            .parse()
            .map_err(|_| "invalid year")?;

        self.expect_char(|c| c == '-', "expected '-' after year")?;
        let month = self.two_digits("invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month out of range");
        }
        self.expect_char(|c| c == '-', "expected '-' after month")?;
        let day = self.two_digits("invalid day")?;
        if day == 0 || day > temporal::days_in_month(year, month) {
            return Err("day out of range");
        }
        self.expect_char(|c| c == 'T' || c == 't', "expected 'T' between date and time")?;
        if self.two_digits("invalid hour")? > 23 {
            return Err("hour out of range");
        }
        self.expect_char(|c| c == ':', "expected ':' after hour")?;
        if self.two_digits("invalid minute")? > 59 {
            return Err("minute out of range");
        }
        self.expect_char(|c| c == ':', "expected ':' after minute")?;
        if self.two_digits("invalid second")? > 59 {
            return Err("second out of range");
        }
        if self.current_char() == Some('.') {
            self.advance();
            let count = self.advance_while(|c| c.is_ascii_digit());
            if count == 0 || count > 9 {
                return Err("invalid fractional seconds");
            }
        }
        match self.current_char() {
            Some('Z' | 'z') => {
                self.advance();
                Ok(())
            }
            Some('+' | '-') => {
                self.advance();
                if self.two_digits("invalid offset hour")? > 23 {
                    return Err("offset hour out of range");
                }
                self.expect_char(|c| c == ':', "expected ':' in offset")?;
                if self.two_digits("invalid offset minute")? > 59 {
                    return Err("offset minute out of range");
                }
                Ok(())
            }
            _ => Err("timestamp requires a time zone"),
        }
    }

    fn expect_char(&mut self, accept: fn(char) -> bool, message: &'static str) -> Result<(), &'static str> {
        match self.current_char() {
            Some(c) if accept(c) => {
                self.advance();
                Ok(())
            }
            _ => Err(message),
        }
    }

    fn two_digits(&mut self, message: &'static str) -> Result<u32, &'static str> {
        let mut value = 0;
        for _ in 0..2 {
            match self.current_char().and_then(|c| c.to_digit(10)) {
                Some(d) => {
                    value = value * 10 + d;
                    self.advance();
                }
                None => return Err(message),
            }
        }
        Ok(value)
    }
}

fn is_text_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
