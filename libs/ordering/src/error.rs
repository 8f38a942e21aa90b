//! Error types for sort clauses

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid order_by at byte {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("Unknown field '{path}' in {message}")]
    UnknownField { path: String, message: String },

    #[error("Cannot order by '{path}': '{segment}' is not a singular message field")]
    NotTraversable { path: String, segment: String },
}

impl Error {
    pub(crate) fn syntax(pos: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            pos,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
