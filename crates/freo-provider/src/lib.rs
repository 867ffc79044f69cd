//! Wallet provider adapter for Freo.
//!
//! Connects the session layer to an injected EIP-1193 provider:
//!
//! - [`ProviderConnector`] implements
//!   [`WalletConnector`](freo_session::WalletConnector) with
//!   `eth_requestAccounts`, `eth_accounts` and `wallet_switchEthereumChain`
//! - [`OptionalProvider`] covers pages where no wallet is installed
//! - [`EventBus`] and [`Subscription`] carry the provider's
//!   `accountsChanged`, `chainChanged`, `connect` and `disconnect`
//!   notifications
//! - [`MemoryProvider`] is an in-process wallet for tests and demos

mod error;
mod events;
mod memory;
mod provider;

pub use error::{DISCONNECTED, ProviderError, UNRECOGNIZED_CHAIN, USER_REJECTED};
pub use events::{EventBus, ProviderEvent, Subscription};
pub use memory::MemoryProvider;
pub use provider::{OptionalProvider, Provider, ProviderConnector, RpcRequest};
