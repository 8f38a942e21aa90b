//! Offset page tokens bound to the request that produced them

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec;
use crate::error::{Error, Result};

/// Position of the next page plus a checksum of the originating request.
///
/// The request passed to [`PageToken::for_request`] and [`PageToken::parse`] should
/// exclude the paging fields themselves (`page_token`, and usually `page_size`), so
/// that following a token does not change the checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub offset: i64,
    pub request_checksum: u32,
}

impl PageToken {
    /// The first page of `request`.
    pub fn for_request<R: Serialize>(request: &R) -> Result<Self> {
        Ok(Self {
            offset: 0,
            request_checksum: request_checksum(request)?,
        })
    }

    /// Token for the page after one of `page_size` items.
    pub fn next(&self, page_size: usize) -> Self {
        let step = i64::try_from(page_size).unwrap_or(i64::MAX);
        Self {
            offset: self.offset.saturating_add(step),
            request_checksum: self.request_checksum,
        }
    }

    pub fn encode(&self) -> Result<String> {
        codec::encode(self)
    }

    /// Decode `token` and check that it was minted for `request`. An empty token is
    /// the first page.
    pub fn parse<R: Serialize>(token: &str, request: &R) -> Result<Self> {
        let expected = request_checksum(request)?;
        if token.is_empty() {
            return Ok(Self {
                offset: 0,
                request_checksum: expected,
            });
        }

        let parsed: PageToken = codec::decode(token)?;
        if parsed.request_checksum != expected {
            tracing::debug!(
                expected,
                found = parsed.request_checksum,
                "page token checksum mismatch"
            );
            return Err(Error::ChecksumMismatch {
                expected,
                found: parsed.request_checksum,
            });
        }
        if parsed.offset < 0 {
            return Err(Error::NegativeOffset(parsed.offset));
        }
        Ok(parsed)
    }
}

/// First four bytes (big endian) of the SHA-256 of the request's JSON form.
pub fn request_checksum<R: Serialize>(request: &R) -> Result<u32> {
    let json = serde_json::to_vec(request)?;
    let digest = Sha256::digest(&json);
    Ok(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}
