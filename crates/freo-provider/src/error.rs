//! Error types for the provider adapter.

use freo_session::ConnectorError;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED: i64 = 4001;

/// EIP-1193: the provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;

/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Errors raised by a [`Provider`](crate::Provider).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a JSON-RPC error object.
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The provider went away before answering.
    #[error("provider closed")]
    Closed,
}

impl ProviderError {
    /// Builds an [`Rpc`](Self::Rpc) error.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Returns `true` if the user declined the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED)
    }
}

impl From<ProviderError> for ConnectorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rpc { code, .. } if code == USER_REJECTED => {
                ConnectorError::UserRejected
            }
            ProviderError::Rpc { code, message } => ConnectorError::Rpc { code, message },
            ProviderError::Closed => ConnectorError::NoProvider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_maps_to_user_rejected() {
        let err: ConnectorError = ProviderError::rpc(USER_REJECTED, "User denied").into();
        assert!(matches!(err, ConnectorError::UserRejected));
    }

    #[test]
    fn test_other_rpc_codes_keep_code_and_message() {
        let err: ConnectorError = ProviderError::rpc(UNRECOGNIZED_CHAIN, "unknown chain").into();
        match err {
            ConnectorError::Rpc { code, message } => {
                assert_eq!(code, UNRECOGNIZED_CHAIN);
                assert_eq!(message, "unknown chain");
            }
            other => panic!("expected Rpc, got {other:?}"),
        }
    }

    #[test]
    fn test_closed_maps_to_no_provider() {
        let err: ConnectorError = ProviderError::Closed.into();
        assert!(matches!(err, ConnectorError::NoProvider));
    }

    #[test]
    fn test_is_user_rejection() {
        assert!(ProviderError::rpc(4001, "no").is_user_rejection());
        assert!(!ProviderError::rpc(-32603, "internal").is_user_rejection());
        assert!(!ProviderError::Closed.is_user_rejection());
    }
}
