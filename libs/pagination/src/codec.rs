//! Token codec: JSON, then deflate, then unpadded URL-safe base64.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

use crate::error::Result;

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T> {
    let compressed = URL_SAFE_NO_PAD.decode(token).inspect_err(|error| {
        tracing::debug!(%error, "page token is not valid base64");
    })?;
    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .inspect_err(|error| tracing::debug!(%error, "page token is not a deflate stream"))?;
    let value = serde_json::from_slice(&json)
        .inspect_err(|error| tracing::debug!(%error, "page token payload is not valid JSON"))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        last_id: String,
        seen: Vec<u32>,
    }

    #[test]
    fn round_trip() {
        let cursor = Cursor {
            last_id: "books/42".to_string(),
            seen: vec![1, 2, 3],
        };
        let token = encode(&cursor).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode::<Cursor>(&token).unwrap(), cursor);
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(decode::<Cursor>("not base64!"), Err(Error::Base64(_))));
    }

    #[test]
    fn rejects_uncompressed_payload() {
        let token = URL_SAFE_NO_PAD.encode(br#"{"last_id":"x","seen":[]}"#);
        assert!(decode::<Cursor>(&token).is_err());
    }

    #[test]
    fn rejects_wrong_shape() {
        let token = encode(&42).unwrap();
        assert!(matches!(decode::<Cursor>(&token), Err(Error::Json(_))));
    }
}
