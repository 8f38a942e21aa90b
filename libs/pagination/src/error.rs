//! Error types for page token handling

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Malformed page token: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Page token was issued for a different request")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("Page token has a negative offset: {0}")]
    NegativeOffset(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
