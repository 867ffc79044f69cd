//! Wallet session management for Freo.
//!
//! This crate is the part of Freo that remembers which sites a wallet has
//! authorized and decides whether a site may reconnect without prompting:
//!
//! 1. **Tracking**: one [`Session`](freo_protocol::Session) per origin,
//!    grouped by account, persisted through a
//!    [`SessionStore`](freo_store::SessionStore) ([`SessionManager`])
//! 2. **Expiry**: sessions live for a fixed TTL ([`SessionConfig`]) and
//!    are purged lazily ([`SessionStatus`])
//! 3. **Auto-reconnect**: driving a [`WalletConnector`] to restore a
//!    connection silently on page load
//!
//! # How it fits in the stack
//!
//! ```text
//! Composition (above)  ← builds the manager, feeds it provider events
//!     ↕
//! Session Layer (this crate)  ← policy: validity, expiry, auto-connect
//!     ↕
//! Store + Protocol (below)  ← persistence and the session table schema
//! ```
//!
//! # Failure policy
//!
//! Nothing in [`SessionManager`]'s public API returns an error. Storage
//! failures are logged and degrade to "session forgotten"; connector
//! failures make [`SessionManager::handle_auto_connect`] return `false`,
//! which callers treat as "fall back to manual connect".

mod clock;
mod connector;
mod error;
mod manager;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connector::WalletConnector;
pub use error::{ConnectorError, SessionError};
pub use manager::{PendingReconnect, SessionManager};
pub use session::{
    DEFAULT_SESSION_TTL, DEFAULT_SESSION_TTL_MS, SessionConfig, SessionOptions,
    SessionStatus,
};
