//! Filter parser - converts filter strings to a [`SyntaxTree`]
//!
//! Recursive descent over the token stream with one token of lookahead plus
//! breakpoint based backtracking. Backtracking is needed in two places: deciding
//! whether whitespace is followed by another factor, and deciding whether a
//! keyword is an operator or an ordinary identifier. A keyword acts as an
//! identifier when the next non-space token is `.`, a comparator, a closing
//! delimiter, `,` or the end of input (so `NOT = 1` compares a field named `NOT`).
//!
//! Precedence (lowest to highest):
//! 1. AND
//! 2. sequence (whitespace separated factors)
//! 3. OR
//! 4. NOT / `-`
//! 5. restriction (comparable, comparator, arg)

use crate::arena::Idx;
use crate::ast::*;
use crate::error::{report, Error, Result};
use crate::lexer::{Breakpoint, Lexer};
use crate::options::ParserOptions;
use crate::token::{Position, Token, TokenKind};

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    breakpoint: Breakpoint,
    last_end: usize,
}

/// Parser for filter expressions.
///
/// A parser handles exactly one input; [`Parser::parse`] consumes it.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParserOptions,
    tree: SyntaxTree,
    depth: usize,
    /// End offset of the last consumed non-whitespace token.
    last_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    pub fn with_options(input: &'a str, options: ParserOptions) -> Self {
        let lexer = Lexer::new(input).with_error_callback(options.error_callback.clone());
        Self {
            lexer,
            options,
            tree: SyntaxTree::default(),
            depth: 0,
            last_end: 0,
        }
    }

    /// Build into the storage of a previously parsed tree, which is released first.
    pub fn reuse(mut self, mut tree: SyntaxTree) -> Self {
        tree.release();
        self.tree = tree;
        self
    }

    /// Parse the entire input. Empty (or all whitespace) input yields an empty tree.
    pub fn parse(mut self) -> Result<SyntaxTree> {
        self.skip_ws();
        if self.peek().kind == TokenKind::Eof {
            return Ok(self.tree);
        }

        let root = self.parse_expression()?;
        self.skip_ws();
        let token = self.next();
        if token.kind != TokenKind::Eof {
            return Err(self.unexpected(&token, "end of filter"));
        }
        if self.lexer.error_count() > 0 {
            return Err(Error::InvalidSyntax {
                pos: self.lexer.position(),
            });
        }

        self.tree.set_root(root);
        tracing::trace!(nodes = self.tree.node_count(), "parsed filter");
        Ok(self.tree)
    }

    // ============================================
    // Token handling
    // ============================================

    fn next(&mut self) -> Token {
        let token = self.lexer.scan();
        if !matches!(token.kind, TokenKind::Whitespace | TokenKind::Eof) {
            self.last_end = token.end();
        }
        token
    }

    fn peek(&mut self) -> Token {
        self.lexer.peek(|_| false)
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.lexer.peek(|t| t.kind == kind);
        if token.kind != kind {
            return None;
        }
        if kind != TokenKind::Whitespace {
            self.last_end = token.end();
        }
        Some(token)
    }

    fn skip_ws(&mut self) -> Option<Token> {
        self.eat(TokenKind::Whitespace)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        let token = self.next();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(&token, expected))
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            breakpoint: self.lexer.breakpoint(),
            last_end: self.last_end,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.lexer.restore(checkpoint.breakpoint);
        self.last_end = checkpoint.last_end;
    }

    fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.last_end.max(start.offset),
        }
    }

    // ============================================
    // Errors
    // ============================================

    fn fail(&self, pos: Position, message: &str) -> Error {
        tracing::debug!(offset = pos.offset, message, "filter syntax error");
        report(self.options.error_callback.as_ref(), pos, message);
        Error::InvalidSyntax { pos }
    }

    fn unexpected(&self, token: &Token, expected: &str) -> Error {
        if token.kind == TokenKind::Illegal {
            // The lexer has already reported it.
            return Error::InvalidSyntax { pos: token.pos };
        }
        let found = if token.text.is_empty() || token.kind == TokenKind::Whitespace {
            token.kind.describe().to_string()
        } else {
            format!("'{}'", token.text)
        };
        self.fail(token.pos, &format!("expected {expected}, found {found}"))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            let pos = self.lexer.position();
            return Err(self.fail(
                pos,
                &format!("filter too deeply nested (max depth: {})", self.options.max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ============================================
    // Whitespace rules
    // ============================================

    /// Strict mode: exactly one whitespace character must appear at this point.
    fn require_single_space(&mut self, ws: Option<&Token>, what: &str) -> Result<()> {
        if !self.options.strict_whitespace {
            return Ok(());
        }
        match ws {
            Some(token) if token.text.chars().count() == 1 => Ok(()),
            Some(token) => Err(self.fail(token.pos, &format!("expected a single space {what}"))),
            None => {
                let pos = self.peek().pos;
                Err(self.fail(pos, &format!("expected whitespace {what}")))
            }
        }
    }

    /// Skip whitespace inside delimiters; strict mode rejects it.
    fn inner_ws(&mut self, what: &str) -> Result<()> {
        if let Some(ws) = self.skip_ws() {
            if self.options.strict_whitespace {
                return Err(self.fail(ws.pos, &format!("whitespace is not allowed {what}")));
            }
        }
        Ok(())
    }

    /// Decide whether the peeked keyword is an operator or an identifier.
    fn keyword_is_operator(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        self.next();
        self.skip_ws();
        let following = self.peek_kind();
        self.restore(checkpoint);

        !(following.is_comparator()
            || matches!(
                following,
                TokenKind::Dot
                    | TokenKind::Comma
                    | TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::RightBrace
                    | TokenKind::Eof
            ))
    }

    fn starts_factor(&mut self) -> bool {
        match self.peek_kind() {
            TokenKind::And | TokenKind::Or => !self.keyword_is_operator(),
            TokenKind::Minus | TokenKind::LeftParen | TokenKind::Illegal => true,
            TokenKind::LeftBracket => self.options.enable_arrays,
            TokenKind::LeftBrace => self.options.enable_structs,
            kind => kind.is_leaf(),
        }
    }

    // ============================================
    // Grammar
    // ============================================

    /// expression : sequence {WS AND WS sequence}
    fn parse_expression(&mut self) -> Result<Idx<Expression>> {
        self.enter()?;
        let start = self.peek().pos;
        let mut sequences = vec![self.parse_sequence()?];

        loop {
            let checkpoint = self.checkpoint();
            let before = self.skip_ws();
            if self.peek_kind() == TokenKind::And && self.keyword_is_operator() {
                self.require_single_space(before.as_ref(), "before AND")?;
                self.next();
                let after = self.skip_ws();
                self.require_single_space(after.as_ref(), "after AND")?;
                sequences.push(self.parse_sequence()?);
            } else {
                self.restore(checkpoint);
                break;
            }
        }

        self.leave();
        let span = self.span_from(start);
        Ok(self.tree.alloc(Expression { span, sequences }))
    }

    /// sequence : factor {WS factor}
    fn parse_sequence(&mut self) -> Result<Idx<Sequence>> {
        let start = self.peek().pos;
        let mut factors = vec![self.parse_factor()?];

        loop {
            let checkpoint = self.checkpoint();
            let Some(ws) = self.skip_ws() else {
                break;
            };
            if !self.starts_factor() {
                self.restore(checkpoint);
                break;
            }
            self.require_single_space(Some(&ws), "between factors")?;
            factors.push(self.parse_factor()?);
        }

        let span = self.span_from(start);
        Ok(self.tree.alloc(Sequence { span, factors }))
    }

    /// factor : term {WS OR WS term}
    fn parse_factor(&mut self) -> Result<Idx<Factor>> {
        let start = self.peek().pos;
        let mut terms = vec![self.parse_term()?];

        loop {
            let checkpoint = self.checkpoint();
            let before = self.skip_ws();
            if self.peek_kind() == TokenKind::Or && self.keyword_is_operator() {
                self.require_single_space(before.as_ref(), "before OR")?;
                let or = self.next();
                if let Some(term) = terms.last().and_then(|&t| self.tree.get_mut(t)) {
                    term.or_pos = Some(or.pos);
                }
                let after = self.skip_ws();
                self.require_single_space(after.as_ref(), "after OR")?;
                terms.push(self.parse_term()?);
            } else {
                self.restore(checkpoint);
                break;
            }
        }

        let span = self.span_from(start);
        Ok(self.tree.alloc(Factor { span, terms }))
    }

    /// term : [(NOT WS | MINUS)] simple
    fn parse_term(&mut self) -> Result<Idx<Term>> {
        let start = self.peek().pos;
        let unary = match self.peek_kind() {
            TokenKind::Not if self.keyword_is_operator() => {
                self.next();
                let ws = self.skip_ws();
                self.require_single_space(ws.as_ref(), "after NOT")?;
                Some(UnaryOp::Not)
            }
            TokenKind::Minus => {
                self.next();
                self.inner_ws("after '-'")?;
                Some(UnaryOp::Minus)
            }
            _ => None,
        };

        let simple = if self.peek_kind() == TokenKind::LeftParen {
            Simple::Composite(self.parse_composite()?)
        } else {
            Simple::Restriction(self.parse_restriction()?)
        };

        let span = self.span_from(start);
        Ok(self.tree.alloc(Term {
            span,
            unary,
            simple,
            or_pos: None,
        }))
    }

    /// composite : LPAREN expression RPAREN
    fn parse_composite(&mut self) -> Result<Idx<Composite>> {
        let open = self.expect(TokenKind::LeftParen, "'('")?;
        self.skip_ws();
        let expression = self.parse_expression()?;
        self.skip_ws();
        self.expect(TokenKind::RightParen, "')'")?;

        let span = self.span_from(open.pos);
        Ok(self.tree.alloc(Composite { span, expression }))
    }

    /// restriction : comparable [comparator arg]
    fn parse_restriction(&mut self) -> Result<Idx<Restriction>> {
        let start = self.peek().pos;
        let comparable = self.parse_comparable()?;

        let checkpoint = self.checkpoint();
        self.skip_ws();
        let token = self.peek();
        let comparator = match token.kind {
            TokenKind::In if self.options.enable_in && self.keyword_is_operator() => {
                Some(Comparator::In)
            }
            TokenKind::In => None,
            kind => Comparator::from_kind(kind),
        };

        let comparison = match comparator {
            Some(comparator) => {
                self.next();
                self.skip_ws();
                let arg = self.parse_arg()?;
                Some(Comparison {
                    comparator,
                    pos: token.pos,
                    arg,
                })
            }
            None => {
                self.restore(checkpoint);
                None
            }
        };

        let span = self.span_from(start);
        Ok(self.tree.alloc(Restriction {
            span,
            comparable,
            comparison,
        }))
    }

    /// arg : comparable | composite
    fn parse_arg(&mut self) -> Result<Arg> {
        if self.peek_kind() == TokenKind::LeftParen {
            Ok(Arg::Composite(self.parse_composite()?))
        } else {
            Ok(Arg::Comparable(self.parse_comparable()?))
        }
    }

    /// comparable : member | function | struct | array
    fn parse_comparable(&mut self) -> Result<Comparable> {
        self.enter()?;
        let token = self.peek();
        let result = match token.kind {
            TokenKind::LeftBracket if self.options.enable_arrays => {
                self.parse_array().map(Comparable::Array)
            }
            TokenKind::LeftBrace if self.options.enable_structs => self
                .parse_struct(Path::new(), token.pos)
                .map(Comparable::Struct),
            kind if kind.is_leaf() => self.parse_name_run(),
            _ => {
                self.next();
                Err(self.unexpected(&token, "a value"))
            }
        };
        self.leave();
        result
    }

    fn leaf(&mut self, token: Token, expected: &str) -> Result<Leaf> {
        Leaf::from_token(token).map_err(|token| self.unexpected(&token, expected))
    }

    /// A dotted run of leaves, then decide between member, function and struct.
    fn parse_name_run(&mut self) -> Result<Comparable> {
        let first = self.next();
        let start = first.pos;
        let mut path = Path::new();
        path.push(self.leaf(first, "a value")?);

        while self.peek_kind() == TokenKind::Dot {
            self.next();
            let token = self.next();
            path.push(self.leaf(token, "a field name after '.'")?);
        }

        // A call needs `(` directly after the name: `a (b OR c)` is a member
        // followed by a composite in the same sequence.
        match self.peek_kind() {
            TokenKind::LeftParen => {
                self.check_name(&path, "function name")?;
                Ok(Comparable::Function(self.parse_function(path, start)?))
            }
            TokenKind::LeftBrace if self.options.enable_structs => {
                self.check_name(&path, "struct type name")?;
                Ok(Comparable::Struct(self.parse_struct(path, start)?))
            }
            _ => {
                let value = path.remove(0);
                let span = self.span_from(start);
                Ok(Comparable::Member(self.tree.alloc(Member {
                    span,
                    value,
                    fields: path,
                })))
            }
        }
    }

    fn check_name(&self, path: &[Leaf], what: &str) -> Result<()> {
        match path.iter().find(|leaf| !leaf.is_identifier()) {
            Some(leaf) => Err(self.fail(
                leaf.pos(),
                &format!("{what} must be an identifier, found '{}'", leaf.raw()),
            )),
            None => Ok(()),
        }
    }

    /// function : name {DOT name} LPAREN [arg {COMMA arg}] RPAREN
    fn parse_function(&mut self, name: Path, start: Position) -> Result<Idx<Function>> {
        self.expect(TokenKind::LeftParen, "'('")?;
        let mut args = Vec::new();
        self.inner_ws("inside an argument list")?;
        if self.eat(TokenKind::RightParen).is_none() {
            loop {
                args.push(self.parse_arg()?);
                self.inner_ws("inside an argument list")?;
                let token = self.next();
                match token.kind {
                    TokenKind::Comma => self.inner_ws("inside an argument list")?,
                    TokenKind::RightParen => break,
                    _ => return Err(self.unexpected(&token, "',' or ')'")),
                }
            }
        }

        let span = self.span_from(start);
        Ok(self.tree.alloc(Function { span, name, args }))
    }

    /// array : LBRACKET [comparable {COMMA comparable}] RBRACKET
    fn parse_array(&mut self) -> Result<Idx<Array>> {
        let open = self.expect(TokenKind::LeftBracket, "'['")?;
        let mut elements = Vec::new();
        self.inner_ws("inside an array")?;
        if self.eat(TokenKind::RightBracket).is_none() {
            loop {
                elements.push(self.parse_comparable()?);
                self.inner_ws("inside an array")?;
                let token = self.next();
                match token.kind {
                    TokenKind::Comma => self.inner_ws("inside an array")?,
                    TokenKind::RightBracket => break,
                    _ => return Err(self.unexpected(&token, "',' or ']'")),
                }
            }
        }

        let span = self.span_from(open.pos);
        Ok(self.tree.alloc(Array { span, elements }))
    }

    /// struct : [name {DOT name}] LBRACE [field COLON comparable {COMMA ...}] RBRACE
    fn parse_struct(&mut self, name: Path, start: Position) -> Result<Idx<Struct>> {
        self.expect(TokenKind::LeftBrace, "'{'")?;
        let mut fields = Vec::new();
        self.inner_ws("inside a struct")?;
        if self.eat(TokenKind::RightBrace).is_none() {
            loop {
                let token = self.next();
                let field_name = self.leaf(token, "a field name")?;
                self.inner_ws("inside a struct")?;
                self.expect(TokenKind::Has, "':'")?;
                self.inner_ws("inside a struct")?;
                let value = self.parse_comparable()?;
                fields.push(StructField {
                    name: field_name,
                    value,
                });
                self.inner_ws("inside a struct")?;
                let token = self.next();
                match token.kind {
                    TokenKind::Comma => self.inner_ws("inside a struct")?,
                    TokenKind::RightBrace => break,
                    _ => return Err(self.unexpected(&token, "',' or '}'")),
                }
            }
        }

        let span = self.span_from(start);
        Ok(self.tree.alloc(Struct { span, name, fields }))
    }
}
