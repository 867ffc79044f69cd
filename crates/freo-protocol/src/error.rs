//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding session documents.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a document into bytes or a JSON value).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed.
    ///
    /// Common causes: the stored value was written by something else,
    /// was truncated, or matches neither the current table layout nor
    /// the legacy per-account layout.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
