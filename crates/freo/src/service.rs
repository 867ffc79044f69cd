//! `WalletSessions` builder and event loop.
//!
//! This is the entry point for a dapp embedding Freo. It ties together
//! the layers: store → session manager → wallet connector, and keeps the
//! stored sessions in step with what the wallet reports.

use freo_protocol::{ChainId, Origin, Session};
use freo_provider::{MemoryProvider, OptionalProvider, ProviderEvent, Subscription};
use freo_session::{
    Clock, SessionConfig, SessionManager, SessionOptions, SystemClock, WalletConnector,
};
use freo_store::{MemoryStore, SessionStore};
use tokio::sync::{Mutex, MutexGuard};

use crate::FreoError;

/// Builder for [`WalletSessions`].
///
/// # Example
///
/// ```rust
/// use freo::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() {
/// let wallet = MemoryProvider::new(vec!["0xABC".into()], "0x1");
/// let sessions = WalletSessions::builder()
///     .session_config(SessionConfig::default())
///     .build(MemoryStore::new(), ProviderConnector::new(wallet))
///     .await;
///
/// assert!(!sessions.on_page_load(&"dapp.example".into()).await);
/// # }
/// ```
pub struct WalletSessionsBuilder<K: Clock = SystemClock> {
    session_config: SessionConfig,
    clock: K,
}

impl WalletSessionsBuilder<SystemClock> {
    /// Creates a builder with default settings and the system clock.
    pub fn new() -> Self {
        Self {
            session_config: SessionConfig::default(),
            clock: SystemClock,
        }
    }
}

impl Default for WalletSessionsBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock> WalletSessionsBuilder<K> {
    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replaces the time source.
    pub fn clock<K2: Clock>(self, clock: K2) -> WalletSessionsBuilder<K2> {
        WalletSessionsBuilder {
            session_config: self.session_config,
            clock,
        }
    }

    /// Opens the session table in `store` and wires it to `connector`.
    pub async fn build<S, C>(self, store: S, connector: C) -> WalletSessions<S, C, K>
    where
        S: SessionStore,
        C: WalletConnector,
    {
        let manager =
            SessionManager::open_with_clock(store, self.session_config, self.clock).await;
        tracing::info!(sessions = manager.len(), "wallet sessions ready");

        WalletSessions {
            manager: Mutex::new(manager),
            connector,
        }
    }
}

/// A dapp's view of its wallet sessions.
///
/// All methods take `&self`; wrap it in an `Arc` to share it between the
/// page's UI code and a [`watch`](Self::watch) task.
pub struct WalletSessions<S: SessionStore, C: WalletConnector, K: Clock = SystemClock> {
    manager: Mutex<SessionManager<S, K>>,
    connector: C,
}

// The parameters are placeholders so `WalletSessions::builder()` needs no
// annotations; `build` picks the real ones.
impl WalletSessions<MemoryStore, OptionalProvider<MemoryProvider>> {
    /// Creates a new builder.
    pub fn builder() -> WalletSessionsBuilder {
        WalletSessionsBuilder::new()
    }
}

impl<S, C, K> WalletSessions<S, C, K>
where
    S: SessionStore,
    C: WalletConnector,
    K: Clock,
{
    /// Locks the session manager for direct use.
    ///
    /// Hold the guard briefly; every other method waits on it.
    pub async fn manager(&self) -> MutexGuard<'_, SessionManager<S, K>> {
        self.manager.lock().await
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Silently restores the wallet connection for `origin` if it has a
    /// live session with auto-connect enabled.
    ///
    /// `false` means the page should show its normal connect button.
    ///
    /// The manager is not locked while the wallet answers, so a
    /// [`disconnect`](Self::disconnect) or an event arriving meanwhile
    /// goes through. If the session was removed or re-bound in that
    /// window, the reconnect reports `false`.
    pub async fn on_page_load(&self, origin: &Origin) -> bool {
        let pending = self.manager.lock().await.begin_auto_connect(origin).await;
        let Some(pending) = pending else {
            return false;
        };
        if !pending.run(&self.connector).await {
            return false;
        }
        self.manager.lock().await.finish_auto_connect(&pending).await
    }

    /// Asks the wallet for access and records a session for `origin`.
    ///
    /// # Errors
    /// Returns [`FreoError::Connector`] if the wallet is missing, the user
    /// declines, or the wallet reports no account.
    pub async fn authorize(
        &self,
        origin: impl Into<Origin>,
        chain_id: impl Into<ChainId>,
        options: SessionOptions,
    ) -> Result<Session, FreoError> {
        let origin = origin.into();
        self.connector.connect().await?;
        let address = self.connector.get_address().await?;

        let session = self
            .manager
            .lock()
            .await
            .create_or_update_session(origin, address, chain_id, options)
            .await;
        Ok(session)
    }

    /// Forgets `origin`'s session.
    pub async fn disconnect(&self, origin: &Origin) {
        self.manager.lock().await.remove_session(origin).await;
    }

    /// Updates `origin`'s session after a wallet notification.
    ///
    /// | Event                          | Effect                   |
    /// |--------------------------------|--------------------------|
    /// | `chainChanged`                 | session moves to chain   |
    /// | `accountsChanged` with nothing | session removed          |
    /// | `disconnect`                   | session removed          |
    /// | anything else                  | ignored                  |
    ///
    /// A switch to a different account is ignored here: the next
    /// reconnect rejects it because the addresses no longer match.
    pub async fn apply_event(&self, origin: &Origin, event: &ProviderEvent) {
        let mut manager = self.manager.lock().await;
        match event {
            ProviderEvent::ChainChanged(chain_id) => {
                manager.update_network(origin, chain_id.clone()).await;
            }
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                manager.remove_session(origin).await;
            }
            ProviderEvent::Disconnect { code, message } => {
                tracing::info!(%origin, code, %message, "wallet disconnected");
                manager.remove_session(origin).await;
            }
            other => {
                tracing::debug!(%origin, event = other.event_name(), "provider event ignored");
            }
        }
    }

    /// Applies every event from `subscription` to `origin` until the
    /// provider's bus closes.
    ///
    /// The subscription is dropped, and so unsubscribed, when this
    /// returns. Cancel the task running it to stop watching early.
    pub async fn watch(&self, origin: Origin, mut subscription: Subscription) {
        tracing::debug!(%origin, "watching provider events");
        while let Some(event) = subscription.recv().await {
            self.apply_event(&origin, &event).await;
        }
        tracing::debug!(%origin, "provider event stream ended");
    }
}
