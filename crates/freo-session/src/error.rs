//! Error types for the session layer.

use freo_protocol::{Address, ProtocolError};
use freo_store::StoreError;

/// Failures reported by a [`WalletConnector`](crate::WalletConnector).
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// No wallet provider is injected into the page.
    #[error("no wallet provider found")]
    NoProvider,

    /// The user dismissed or rejected the wallet prompt.
    #[error("user rejected the request")]
    UserRejected,

    /// The provider answered with an RPC error.
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The provider answered with something we can't interpret.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur inside the session manager.
///
/// These never reach callers of the public operations; the manager logs
/// them and degrades (empty result, no-op, or `false`). They are public
/// so composing crates can wrap them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Loading or saving the session table failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored session table couldn't be decoded or encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The wallet connector failed during reconnection.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The wallet reconnected with a different account than the one the
    /// session was granted to.
    #[error("wallet returned {actual}, session belongs to {expected}")]
    AddressMismatch { expected: Address, actual: Address },
}
