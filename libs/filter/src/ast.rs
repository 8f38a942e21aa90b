//! Syntax tree representation
//!
//! The tree mirrors the filter grammar directly, without semantic analysis:
//!
//! ```text
//! filter      : [expression]
//! expression  : sequence {WS AND WS sequence}
//! sequence    : factor {WS factor}
//! factor      : term {WS OR WS term}
//! term        : [(NOT WS | MINUS)] simple
//! simple      : restriction | composite
//! restriction : comparable [comparator arg]
//! comparable  : member | function | struct | array
//! member      : value {DOT field}
//! function    : name {DOT name} LPAREN [arg {COMMA arg}] RPAREN
//! struct      : [name {DOT name}] LBRACE [field COLON comparable {COMMA ...}] RBRACE
//! array       : LBRACKET [comparable {COMMA comparable}] RBRACKET
//! composite   : LPAREN expression RPAREN
//! arg         : comparable | composite
//! ```
//!
//! Nodes are stored in per-kind arenas owned by the [`SyntaxTree`] and link to
//! each other through [`Idx`] handles. Leaves (text, strings, keywords) are kept
//! inline in their parent.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{self, Write};
use std::ops::Index;

use crate::arena::{Arena, Idx};
use crate::token::{Position, Token, TokenKind};

/// Source range of a node: start position and end byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dotted names (members, functions, struct types) rarely exceed two parts.
pub type Path = SmallVec<[Leaf; 2]>;

// ============================================
// Leaves
// ============================================

/// Unquoted literal: identifiers, numbers, durations, timestamps, booleans, null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLiteral {
    pub pos: Position,
    pub kind: TokenKind,
    pub text: String,
}

/// Quoted literal. `raw` keeps the quotes and escapes as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub pos: Position,
    pub raw: String,
}

impl StringLiteral {
    pub fn quote(&self) -> char {
        self.raw.chars().next().unwrap_or('"')
    }

    /// Content between the quotes with `\<quote>` and `\\` unescaped.
    pub fn value(&self) -> Cow<'_, str> {
        let quote = self.quote();
        let inner = self
            .raw
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
            .unwrap_or(&self.raw);
        if !inner.contains('\\') {
            return Cow::Borrowed(inner);
        }

        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some(next) if next == quote || next == '\\' => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        }
        Cow::Owned(out)
    }
}

/// A keyword (`AND`, `OR`, `NOT`, `IN`) standing where a name or value is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordLiteral {
    pub pos: Position,
    pub kind: TokenKind,
    pub text: String,
}

/// Value, field and name leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Text(TextLiteral),
    String(StringLiteral),
    Keyword(KeywordLiteral),
}

impl Leaf {
    /// Convert a leaf token; other tokens are handed back unchanged.
    pub fn from_token(token: Token) -> Result<Leaf, Token> {
        let kind = token.kind;
        if kind == TokenKind::String {
            return Ok(Leaf::String(StringLiteral {
                pos: token.pos,
                raw: token.text,
            }));
        }
        if kind.is_keyword() {
            return Ok(Leaf::Keyword(KeywordLiteral {
                pos: token.pos,
                kind,
                text: token.text,
            }));
        }
        if kind.is_text_literal() {
            return Ok(Leaf::Text(TextLiteral {
                pos: token.pos,
                kind,
                text: token.text,
            }));
        }
        Err(token)
    }

    pub fn pos(&self) -> Position {
        match self {
            Leaf::Text(t) => t.pos,
            Leaf::String(s) => s.pos,
            Leaf::Keyword(k) => k.pos,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Leaf::Text(t) => t.kind,
            Leaf::String(_) => TokenKind::String,
            Leaf::Keyword(k) => k.kind,
        }
    }

    /// Source text as written, quotes included.
    pub fn raw(&self) -> &str {
        match self {
            Leaf::Text(t) => &t.text,
            Leaf::String(s) => &s.raw,
            Leaf::Keyword(k) => &k.text,
        }
    }

    /// Text with string quoting removed.
    pub fn unquoted(&self) -> Cow<'_, str> {
        match self {
            Leaf::String(s) => s.value(),
            other => Cow::Borrowed(other.raw()),
        }
    }

    /// True for bare words that can name a field (identifiers and keywords).
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind(), TokenKind::Text) || self.kind().is_keyword()
    }

    pub fn end(&self) -> usize {
        self.pos().offset + self.raw().len()
    }
}

// ============================================
// Operators
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equals,
    NotEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    Has,
    In,
}

impl Comparator {
    pub fn from_kind(kind: TokenKind) -> Option<Comparator> {
        Some(match kind {
            TokenKind::Equals => Comparator::Equals,
            TokenKind::NotEquals => Comparator::NotEquals,
            TokenKind::LessThan => Comparator::LessThan,
            TokenKind::LessEquals => Comparator::LessEquals,
            TokenKind::GreaterThan => Comparator::GreaterThan,
            TokenKind::GreaterEquals => Comparator::GreaterEquals,
            TokenKind::Has => Comparator::Has,
            TokenKind::In => Comparator::In,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Equals => "=",
            Comparator::NotEquals => "!=",
            Comparator::LessThan => "<",
            Comparator::LessEquals => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterEquals => ">=",
            Comparator::Has => ":",
            Comparator::In => "IN",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Not,
}

// ============================================
// Nodes
// ============================================

/// Sequences joined by `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub span: Span,
    pub sequences: Vec<Idx<Sequence>>,
}

/// Factors separated by whitespace (implicit AND).
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub span: Span,
    pub factors: Vec<Idx<Factor>>,
}

/// Terms joined by `OR`.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub span: Span,
    pub terms: Vec<Idx<Term>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub span: Span,
    pub unary: Option<UnaryOp>,
    pub simple: Simple,
    /// Position of the `OR` that follows this term, if any.
    pub or_pos: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simple {
    Restriction(Idx<Restriction>),
    Composite(Idx<Composite>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    pub span: Span,
    pub comparable: Comparable,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub comparator: Comparator,
    pub pos: Position,
    pub arg: Arg,
}

/// Parenthesized expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub span: Span,
    pub expression: Idx<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparable {
    Member(Idx<Member>),
    Function(Idx<Function>),
    Struct(Idx<Struct>),
    Array(Idx<Array>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Composite(Idx<Composite>),
    Comparable(Comparable),
}

/// `value.field.field`
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub span: Span,
    pub value: Leaf,
    pub fields: Path,
}

impl Member {
    /// Iterate over the value and all field leaves.
    pub fn path(&self) -> impl Iterator<Item = &Leaf> {
        std::iter::once(&self.value).chain(self.fields.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub span: Span,
    pub name: Path,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: Leaf,
    pub value: Comparable,
}

/// `type.Name{field: value, ...}`; an empty name is a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub span: Span,
    pub name: Path,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub span: Span,
    pub elements: Vec<Comparable>,
}

/// Dotted rendering of a name path.
pub fn join_path(path: &[Leaf], quoting: Quoting) -> String {
    let mut out = String::new();
    for (i, leaf) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match quoting {
            Quoting::Quoted => out.push_str(leaf.raw()),
            Quoting::Unquoted => out.push_str(&leaf.unquoted()),
        }
    }
    out
}

// ============================================
// Tree
// ============================================

/// Node kinds stored in a [`SyntaxTree`].
pub trait Node: Sized {
    fn arena(tree: &SyntaxTree) -> &Arena<Self>;
    fn arena_mut(tree: &mut SyntaxTree) -> &mut Arena<Self>;
}

macro_rules! syntax_tree {
    ($($field:ident: $node:ty),* $(,)?) => {
        /// Owner of all nodes produced by one parse.
        #[derive(Debug, Default)]
        pub struct SyntaxTree {
            root: Option<Idx<Expression>>,
            $($field: Arena<$node>,)*
        }

        impl SyntaxTree {
            /// Total number of nodes across all arenas.
            pub fn node_count(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            fn clear_arenas(&mut self) {
                $(self.$field.clear();)*
            }
        }

        $(
            impl Node for $node {
                fn arena(tree: &SyntaxTree) -> &Arena<Self> {
                    &tree.$field
                }

                fn arena_mut(tree: &mut SyntaxTree) -> &mut Arena<Self> {
                    &mut tree.$field
                }
            }
        )*
    };
}

syntax_tree! {
    expressions: Expression,
    sequences: Sequence,
    factors: Factor,
    terms: Term,
    restrictions: Restriction,
    composites: Composite,
    members: Member,
    functions: Function,
    structs: Struct,
    arrays: Array,
}

/// How leaves are written when rendering a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    /// Strings keep their quotes and escapes.
    #[default]
    Quoted,
    /// Strings are written as their unescaped content.
    Unquoted,
}

impl SyntaxTree {
    /// Root expression, `None` for an empty filter or a released tree.
    pub fn root(&self) -> Option<Idx<Expression>> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn set_root(&mut self, root: Idx<Expression>) {
        self.root = Some(root);
    }

    pub fn get<T: Node>(&self, id: Idx<T>) -> Option<&T> {
        T::arena(self).get(id)
    }

    pub(crate) fn get_mut<T: Node>(&mut self, id: Idx<T>) -> Option<&mut T> {
        T::arena_mut(self).get_mut(id)
    }

    pub(crate) fn alloc<T: Node>(&mut self, node: T) -> Idx<T> {
        T::arena_mut(self).alloc(node)
    }

    /// Source range of the whole filter.
    pub fn span(&self) -> Option<Span> {
        self.root.and_then(|root| self.get(root)).map(|e| e.span)
    }

    /// Drop every node, keeping allocations for reuse. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.root.is_none() && self.node_count() == 0 {
            return;
        }
        self.root = None;
        self.clear_arenas();
    }

    /// Render the tree, writing strings as unescaped text.
    pub fn unquoted(&self) -> String {
        self.render(Quoting::Unquoted)
    }

    pub fn render(&self, quoting: Quoting) -> String {
        let mut renderer = Renderer::new(self, quoting);
        if let Some(root) = self.root {
            renderer.expression(root);
        }
        renderer.out
    }

    pub fn render_comparable(&self, comparable: Comparable, quoting: Quoting) -> String {
        let mut renderer = Renderer::new(self, quoting);
        renderer.comparable(comparable);
        renderer.out
    }

    pub fn render_arg(&self, arg: Arg, quoting: Quoting) -> String {
        let mut renderer = Renderer::new(self, quoting);
        renderer.arg(arg);
        renderer.out
    }

    /// All leaves in source order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_expression(root, &mut out);
        }
        out
    }

    fn collect_expression<'t>(&'t self, id: Idx<Expression>, out: &mut Vec<&'t Leaf>) {
        for &seq in &self[id].sequences {
            for &factor in &self[seq].factors {
                for &term in &self[factor].terms {
                    match self[term].simple {
                        Simple::Composite(c) => self.collect_expression(self[c].expression, out),
                        Simple::Restriction(r) => {
                            let restriction = &self[r];
                            self.collect_comparable(restriction.comparable, out);
                            if let Some(comparison) = &restriction.comparison {
                                self.collect_arg(comparison.arg, out);
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect_arg<'t>(&'t self, arg: Arg, out: &mut Vec<&'t Leaf>) {
        match arg {
            Arg::Composite(c) => self.collect_expression(self[c].expression, out),
            Arg::Comparable(c) => self.collect_comparable(c, out),
        }
    }

    fn collect_comparable<'t>(&'t self, comparable: Comparable, out: &mut Vec<&'t Leaf>) {
        match comparable {
            Comparable::Member(m) => out.extend(self[m].path()),
            Comparable::Function(f) => {
                let function = &self[f];
                out.extend(function.name.iter());
                for &arg in &function.args {
                    self.collect_arg(arg, out);
                }
            }
            Comparable::Struct(s) => {
                let literal = &self[s];
                out.extend(literal.name.iter());
                for field in &literal.fields {
                    out.push(&field.name);
                    self.collect_comparable(field.value, out);
                }
            }
            Comparable::Array(a) => {
                for &element in &self[a].elements {
                    self.collect_comparable(element, out);
                }
            }
        }
    }
}

impl<T: Node> Index<Idx<T>> for SyntaxTree {
    type Output = T;

    /// Panics when the handle does not belong to this tree's current generation.
    fn index(&self, id: Idx<T>) -> &T {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale syntax tree handle {id:?}"),
        }
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Quoting::Quoted))
    }
}

struct Renderer<'t> {
    tree: &'t SyntaxTree,
    quoting: Quoting,
    out: String,
}

impl<'t> Renderer<'t> {
    fn new(tree: &'t SyntaxTree, quoting: Quoting) -> Self {
        Self {
            tree,
            quoting,
            out: String::new(),
        }
    }

    fn leaf(&mut self, leaf: &Leaf) {
        match self.quoting {
            Quoting::Quoted => self.out.push_str(leaf.raw()),
            Quoting::Unquoted => self.out.push_str(&leaf.unquoted()),
        }
    }

    fn path(&mut self, path: &[Leaf]) {
        for (i, leaf) in path.iter().enumerate() {
            if i > 0 {
                self.out.push('.');
            }
            self.leaf(leaf);
        }
    }

    fn expression(&mut self, id: Idx<Expression>) {
        let tree = self.tree;
        for (i, &seq) in tree[id].sequences.iter().enumerate() {
            if i > 0 {
                self.out.push_str(" AND ");
            }
            for (j, &factor) in tree[seq].factors.iter().enumerate() {
                if j > 0 {
                    self.out.push(' ');
                }
                for (k, &term) in tree[factor].terms.iter().enumerate() {
                    if k > 0 {
                        self.out.push_str(" OR ");
                    }
                    self.term(&tree[term]);
                }
            }
        }
    }

    fn term(&mut self, term: &Term) {
        match term.unary {
            Some(UnaryOp::Minus) => self.out.push('-'),
            Some(UnaryOp::Not) => self.out.push_str("NOT "),
            None => {}
        }
        match term.simple {
            Simple::Composite(c) => self.composite(c),
            Simple::Restriction(r) => {
                let tree = self.tree;
                let restriction = &tree[r];
                self.comparable(restriction.comparable);
                if let Some(comparison) = &restriction.comparison {
                    if comparison.comparator == Comparator::Has {
                        self.out.push(':');
                    } else {
                        let _ = write!(self.out, " {} ", comparison.comparator);
                    }
                    self.arg(comparison.arg);
                }
            }
        }
    }

    fn composite(&mut self, id: Idx<Composite>) {
        self.out.push('(');
        self.expression(self.tree[id].expression);
        self.out.push(')');
    }

    fn arg(&mut self, arg: Arg) {
        match arg {
            Arg::Composite(c) => self.composite(c),
            Arg::Comparable(c) => self.comparable(c),
        }
    }

    fn comparable(&mut self, comparable: Comparable) {
        let tree = self.tree;
        match comparable {
            Comparable::Member(m) => {
                let member = &tree[m];
                self.leaf(&member.value);
                for field in &member.fields {
                    self.out.push('.');
                    self.leaf(field);
                }
            }
            Comparable::Function(f) => {
                let function = &tree[f];
                self.path(&function.name);
                self.out.push('(');
                for (i, &arg) in function.args.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.arg(arg);
                }
                self.out.push(')');
            }
            Comparable::Struct(s) => {
                let literal = &tree[s];
                self.path(&literal.name);
                self.out.push('{');
                for (i, field) in literal.fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.leaf(&field.name);
                    self.out.push(':');
                    self.comparable(field.value);
                }
                self.out.push('}');
            }
            Comparable::Array(a) => {
                self.out.push('[');
                for (i, &element) in tree[a].elements.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.comparable(element);
                }
                self.out.push(']');
            }
        }
    }
}
