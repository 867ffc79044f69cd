//! # Freo
//!
//! Wallet session persistence and silent reconnect for dapps.
//!
//! Freo remembers which sites a user's wallet authorized, for how long,
//! and on which network, so a returning visitor is reconnected without a
//! prompt. The application picks a store and a wallet connector; Freo
//! does the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use freo::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), FreoError> {
//! freo::telemetry::init();
//!
//! let wallet = MemoryProvider::new(vec!["0xABC".into()], "0x1");
//! let sessions = WalletSessions::builder()
//!     .build(FileStore::new("sessions.json"), ProviderConnector::new(wallet))
//!     .await;
//!
//! let origin = Origin::from("dapp.example");
//! if !sessions.on_page_load(&origin).await {
//!     sessions.authorize(origin, "0x1", SessionOptions::default()).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod service;
pub mod telemetry;

pub use error::FreoError;
pub use service::{WalletSessions, WalletSessionsBuilder};

/// Re-exports of everything a dapp typically needs.
pub mod prelude {
    pub use crate::{FreoError, WalletSessions, WalletSessionsBuilder};

    pub use freo_protocol::{Address, ChainId, Origin, Permissions, Session};
    pub use freo_provider::{
        EventBus, MemoryProvider, OptionalProvider, Provider, ProviderConnector,
        ProviderError, ProviderEvent, RpcRequest, Subscription,
    };
    pub use freo_session::{
        Clock, ConnectorError, DEFAULT_SESSION_TTL, ManualClock, PendingReconnect,
        SessionConfig, SessionManager, SessionOptions, SessionStatus, SystemClock,
        WalletConnector,
    };
    pub use freo_store::{FileStore, MemoryStore, SessionStore, StoreError};
}
