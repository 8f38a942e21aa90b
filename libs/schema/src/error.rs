//! Error types for schema construction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Duplicate message type: {0}")]
    DuplicateMessage(String),

    #[error("Duplicate enum type: {0}")]
    DuplicateEnum(String),

    #[error("Duplicate field '{field}' in message {message}")]
    DuplicateField { message: String, field: String },

    #[error("Field '{field}' in {message} references unknown type '{type_name}'")]
    UnknownType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("Field '{field}' in {message} requires a type name")]
    MissingTypeName { message: String, field: String },

    #[error("Invalid map field '{field}' in {message}: {reason}")]
    InvalidMapField {
        message: String,
        field: String,
        reason: &'static str,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
