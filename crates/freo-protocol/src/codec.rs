//! Codec trait and the JSON implementation.
//!
//! Stores that deal in JSON values (browser storage, `freo-store`'s
//! `MemoryStore`) never touch bytes. Stores that write files or blobs need
//! something to turn a document into bytes and back; that's what a
//! [`Codec`] is for.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs live inside stores, which are
/// shared for the lifetime of the application.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses pretty-printed JSON (via `serde_json`).
///
/// Pretty output keeps session files readable when someone opens them
/// by hand.
///
/// ## Example
///
/// ```rust
/// use freo_protocol::{Codec, JsonCodec, SessionTable};
///
/// let codec = JsonCodec;
/// let table = SessionTable::default();
///
/// let bytes = codec.encode(&table).unwrap();
/// let decoded: SessionTable = codec.decode(&bytes).unwrap();
/// assert_eq!(table, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_decode_truncated_input_returns_decode_error() {
        let result: Result<BTreeMap<String, u64>, _> =
            JsonCodec.decode(br#"{"a": 1"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_map_is_readable_json() {
        let mut map = BTreeMap::new();
        map.insert("freo_wallet_sessions".to_string(), 1u64);

        let bytes = JsonCodec.encode(&map).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\"freo_wallet_sessions\": 1"));
    }
}
