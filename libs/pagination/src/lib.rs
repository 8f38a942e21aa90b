//! Page tokens for list requests
//!
//! Tokens are opaque to clients: any serializable cursor is written as JSON,
//! deflated and encoded as unpadded URL-safe base64. [`PageToken`] is the common
//! offset cursor, bound to its request by a checksum so a token cannot be replayed
//! against a request with different filters.

pub mod codec;
pub mod error;
pub mod token;

pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use token::{request_checksum, PageToken};
