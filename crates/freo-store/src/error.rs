/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing medium holds something that isn't a key-value document.
    #[error("storage is corrupt: {0}")]
    Corrupt(#[source] freo_protocol::ProtocolError),

    /// A document couldn't be turned into bytes for writing.
    #[error("could not encode storage document: {0}")]
    Encode(#[source] freo_protocol::ProtocolError),

    /// The backend refused the operation (quota exceeded, storage
    /// disabled by the browser, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
