//! In-process wallet for tests and demos.
//!
//! [`MemoryProvider`] answers the handful of RPC methods Freo uses and
//! emits the matching events on its [`EventBus`], the way a browser
//! extension wallet would. Test code flips its state with
//! [`set_accounts`](MemoryProvider::set_accounts),
//! [`lock`](MemoryProvider::lock) and
//! [`reject_requests`](MemoryProvider::reject_requests).
//!
//! ```text
//! request() ──→ MemoryProvider ──emit()──→ EventBus ──→ Subscription
//!                    ↑
//!          set_accounts() / lock()  (test side)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use freo_protocol::{Address, ChainId};
use serde_json::{Value, json};

use crate::{EventBus, Provider, ProviderError, ProviderEvent, RpcRequest, USER_REJECTED};

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    chain_id: ChainId,
    /// Whether the page was granted access via `eth_requestAccounts`.
    authorized: bool,
    rejecting: bool,
    requests: Vec<RpcRequest>,
}

/// A scripted wallet. Clones share state and event bus.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    state: Arc<Mutex<WalletState>>,
    events: EventBus,
}

impl MemoryProvider {
    /// A wallet unlocked on `accounts`, currently on `chain_id`. The page
    /// has not been authorized yet.
    pub fn new(accounts: Vec<Address>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState {
                accounts,
                chain_id: chain_id.into(),
                authorized: false,
                rejecting: false,
                requests: Vec::new(),
            })),
            events: EventBus::new(),
        }
    }

    /// A wallet that has already granted the page access, as after a
    /// reload within the wallet's own permission window.
    pub fn authorized(accounts: Vec<Address>, chain_id: impl Into<ChainId>) -> Self {
        let provider = Self::new(accounts, chain_id);
        provider.state().authorized = true;
        provider
    }

    fn state(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The bus this wallet emits on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn chain_id(&self) -> ChainId {
        self.state().chain_id.clone()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.state().requests.clone()
    }

    /// Makes every `eth_requestAccounts` fail with a user rejection.
    pub fn reject_requests(&self, rejecting: bool) {
        self.state().rejecting = rejecting;
    }

    /// Switches the selected accounts and emits `accountsChanged`.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let visible = {
            let mut state = self.state();
            state.accounts = accounts;
            state.authorized.then(|| state.accounts.clone())
        };
        if let Some(accounts) = visible {
            self.events.emit(ProviderEvent::AccountsChanged(accounts));
        }
    }

    /// Revokes the page's access and emits `accountsChanged` with no
    /// accounts.
    pub fn lock(&self) {
        self.state().authorized = false;
        self.events.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }

    /// Drops the connection and emits `disconnect`.
    pub fn disconnect(&self, message: impl Into<String>) {
        self.state().authorized = false;
        self.events.emit(ProviderEvent::Disconnect {
            code: crate::DISCONNECTED,
            message: message.into(),
        });
    }

    fn handle(
        &self,
        request: &RpcRequest,
    ) -> Result<(Value, Option<ProviderEvent>), ProviderError> {
        let mut state = self.state();
        match request.method.as_str() {
            "eth_requestAccounts" => {
                if state.rejecting {
                    return Err(ProviderError::rpc(USER_REJECTED, "User rejected the request."));
                }
                let first_grant = !state.authorized;
                state.authorized = true;
                let event = first_grant.then(|| ProviderEvent::Connect {
                    chain_id: state.chain_id.clone(),
                });
                Ok((json!(state.accounts), event))
            }
            "eth_accounts" => {
                let visible: &[Address] = if state.authorized { &state.accounts } else { &[] };
                Ok((json!(visible), None))
            }
            "eth_chainId" => Ok((json!(state.chain_id), None)),
            "wallet_switchEthereumChain" => {
                let chain_id = request
                    .params
                    .first()
                    .and_then(|p| p.get("chainId"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::rpc(-32602, "missing chainId"))?;
                let chain_id = ChainId::from(chain_id);
                if state.chain_id == chain_id {
                    return Ok((Value::Null, None));
                }
                state.chain_id = chain_id.clone();
                Ok((Value::Null, Some(ProviderEvent::ChainChanged(chain_id))))
            }
            other => Err(ProviderError::rpc(-32601, format!("method {other} not supported"))),
        }
    }
}

impl Provider for MemoryProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        let outcome = self.handle(&request);
        self.state().requests.push(request);

        let (value, event) = outcome?;
        if let Some(event) = event {
            self.events.emit(event);
        }
        Ok(value)
    }
}
