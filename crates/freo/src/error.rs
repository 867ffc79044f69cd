//! Unified error type for Freo.

use freo_protocol::ProtocolError;
use freo_provider::ProviderError;
use freo_session::{ConnectorError, SessionError};
use freo_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only the manual connect path ([`WalletSessions::authorize`]) and direct
/// provider calls surface errors; the session operations themselves log
/// and degrade instead.
///
/// [`WalletSessions::authorize`]: crate::WalletSessions::authorize
#[derive(Debug, thiserror::Error)]
pub enum FreoError {
    /// The persistent store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored table couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The wallet refused or failed a connect.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
