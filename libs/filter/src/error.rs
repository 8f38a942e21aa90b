//! Error types for filter parsing and resolution
//!
//! Errors carry positions only. Human readable detail is delivered through the
//! optional [`ErrorCallback`] (and `tracing` at debug level) so callers can match
//! on stable variants without parsing messages.

use std::sync::Arc;
use thiserror::Error;

use crate::token::Position;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Receives a position and a human readable message for every reported problem.
pub type ErrorCallback = Arc<dyn Fn(Position, &str) + Send + Sync>;

/// Filter errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Lexing or grammar failure.
    #[error("invalid filter syntax at byte {}", pos.offset)]
    InvalidSyntax { pos: Position },

    /// The tree is well formed but a value does not fit its schema field.
    #[error("invalid filter value at byte {}", pos.offset)]
    InvalidValue { pos: Position },

    /// Node handles do not belong to the tree (for example after `release`).
    #[error("invalid filter syntax tree")]
    InvalidSyntaxTree,

    /// A required input was missing.
    #[error("internal filter error: {0}")]
    Internal(&'static str),
}

impl Error {
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::InvalidSyntax { pos } | Error::InvalidValue { pos } => Some(*pos),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::InvalidSyntax { .. })
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Error::InvalidValue { .. })
    }
}

/// Deliver a message to the callback, if any.
pub(crate) fn report(callback: Option<&ErrorCallback>, pos: Position, message: &str) {
    if let Some(callback) = callback {
        callback(pos, message);
    }
}
