//! AIP-160 style filter language
//!
//! This crate parses filter strings such as
//! `author = "Ann" AND (rating >= 4 OR NOT archived)` and resolves them against a
//! message schema into typed expressions:
//!
//! ```text
//! Filter String
//!      |
//!   Lexer -> tokens (whitespace kept, illegal tokens reported)
//!      |
//!   Parser -> SyntaxTree (arena backed, untyped)
//!      |
//!   Resolver + MessageDescriptor -> Expr (typed, schema checked)
//! ```
//!
//! ```ignore
//! let tree = aip_filter::parse("rating >= 4")?;
//! let resolved = aip_filter::Resolver::new(book).resolve(&tree)?;
//! ```

pub mod arena;
pub mod ast;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod resolver;
mod temporal;
pub mod token;
pub mod value;

// Re-export main types
pub use arena::Idx;
pub use ast::{Comparator, Quoting, SyntaxTree};
pub use error::{Error, ErrorCallback, Result};
pub use expr::{Compare, Expr, FieldSelector, FunctionCall, MapEntry, ResolvedFilter, Traversal};
pub use lexer::Lexer;
pub use options::{ParserOptions, ResolverOptions};
pub use parser::Parser;
pub use resolver::{
    FieldHook, FieldHookContext, FunctionHook, FunctionHookContext, FunctionSignature, Resolver,
    ScalarField,
};
pub use temporal::{format_duration, parse_duration, parse_timestamp};
pub use token::{Position, Token, TokenKind};
pub use value::{MessageValue, Value, ValueKind};

/// Parse with default options (lenient whitespace, no extensions).
pub fn parse(input: &str) -> Result<SyntaxTree> {
    Parser::new(input).parse()
}

pub fn parse_with_options(input: &str, options: ParserOptions) -> Result<SyntaxTree> {
    Parser::with_options(input, options).parse()
}
