//! Request side of an injected wallet provider.
//!
//! A page's wallet exposes one entry point, `request({ method, params })`.
//! [`Provider`] models that call; [`ProviderConnector`] turns it into the
//! three operations the session manager needs.

use std::future::Future;
use std::sync::Arc;

use freo_protocol::{Address, ChainId};
use freo_session::{ConnectorError, WalletConnector};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ProviderError;

/// One JSON-RPC call to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// A call with no parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// An injected EIP-1193 provider.
pub trait Provider: Send + Sync + 'static {
    /// Sends `request` and waits for the wallet's answer.
    fn request(
        &self,
        request: RpcRequest,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send;
}

impl<P: Provider> Provider for Arc<P> {
    fn request(
        &self,
        request: RpcRequest,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send {
        P::request(self, request)
    }
}

// ---------------------------------------------------------------------------
// ProviderConnector
// ---------------------------------------------------------------------------

/// A [`WalletConnector`] that speaks to a [`Provider`].
///
/// | Operation        | RPC method                   |
/// |------------------|------------------------------|
/// | `connect`        | `eth_requestAccounts`        |
/// | `get_address`    | `eth_accounts` (first entry) |
/// | `switch_network` | `wallet_switchEthereumChain` |
#[derive(Debug, Clone)]
pub struct ProviderConnector<P> {
    provider: P,
}

impl<P: Provider> ProviderConnector<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn accounts(&self, method: &str) -> Result<Vec<Address>, ConnectorError> {
        let value = self.provider.request(RpcRequest::new(method)).await?;
        serde_json::from_value(value)
            .map_err(|e| ConnectorError::InvalidResponse(format!("{method}: {e}")))
    }
}

impl<P: Provider> WalletConnector for ProviderConnector<P> {
    async fn connect(&self) -> Result<(), ConnectorError> {
        let accounts = self.accounts("eth_requestAccounts").await?;
        if accounts.is_empty() {
            return Err(ConnectorError::InvalidResponse(
                "eth_requestAccounts returned no accounts".into(),
            ));
        }
        tracing::debug!(accounts = accounts.len(), "wallet connected");
        Ok(())
    }

    async fn get_address(&self) -> Result<Address, ConnectorError> {
        self.accounts("eth_accounts")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ConnectorError::InvalidResponse("eth_accounts returned no accounts".into())
            })
    }

    async fn switch_network(&self, chain_id: &ChainId) -> Result<(), ConnectorError> {
        let request = RpcRequest::with_params(
            "wallet_switchEthereumChain",
            vec![json!({ "chainId": chain_id })],
        );
        self.provider.request(request).await?;
        tracing::debug!(%chain_id, "wallet switched network");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OptionalProvider
// ---------------------------------------------------------------------------

/// A connector for pages that may have no wallet installed.
///
/// With no provider, every operation fails with
/// [`ConnectorError::NoProvider`], which the session manager treats like
/// any other failed reconnect.
#[derive(Debug, Clone)]
pub struct OptionalProvider<P> {
    inner: Option<ProviderConnector<P>>,
}

impl<P: Provider> OptionalProvider<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self {
            inner: provider.map(ProviderConnector::new),
        }
    }

    /// A connector for a page without a wallet.
    pub fn absent() -> Self {
        Self { inner: None }
    }

    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    fn connector(&self) -> Result<&ProviderConnector<P>, ConnectorError> {
        self.inner.as_ref().ok_or(ConnectorError::NoProvider)
    }
}

impl<P: Provider> WalletConnector for OptionalProvider<P> {
    async fn connect(&self) -> Result<(), ConnectorError> {
        self.connector()?.connect().await
    }

    async fn get_address(&self) -> Result<Address, ConnectorError> {
        self.connector()?.get_address().await
    }

    async fn switch_network(&self, chain_id: &ChainId) -> Result<(), ConnectorError> {
        self.connector()?.switch_network(chain_id).await
    }
}
