//! The session manager: remembers wallet authorizations per origin.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating and refreshing sessions when a site is authorized
//! - Answering "may this origin reconnect silently?"
//! - Expiring sessions after the TTL and purging them lazily
//! - Remembering which network to switch to when reconnecting
//! - Driving a [`WalletConnector`] through an auto-reconnect
//!
//! # Persistence
//!
//! The store is the source of truth. Every mutation re-reads the
//! [`SessionTable`], applies its change and writes the whole table back,
//! so another manager on the same store (another tab, another process)
//! keeps its writes. Reads taking `&self` answer from the copy made by the
//! last read or write; [`reload`](SessionManager::reload) refreshes it.
//!
//! A failed read falls back to that copy. A failed save is logged and
//! the copy is kept as the source of truth until a later save succeeds,
//! so the in-memory state stays usable for the rest of the page's life
//! even if it won't survive a reload.
//!
//! # Concurrency note
//!
//! Mutations take `&mut self`, so one manager never interleaves two
//! read-modify-write cycles. Two managers only lose an update when their
//! cycles overlap in time: whichever saves last wins.
//!
//! [`handle_auto_connect`](SessionManager::handle_auto_connect) holds
//! `&mut self` while the wallet answers. A manager shared behind a lock
//! should use [`begin_auto_connect`](SessionManager::begin_auto_connect)
//! and [`finish_auto_connect`](SessionManager::finish_auto_connect)
//! instead, running the [`PendingReconnect`] with the lock released.

use std::collections::BTreeMap;

use freo_protocol::{Address, ChainId, Origin, Session, SessionTable};
use freo_store::SessionStore;

use crate::{
    Clock, SessionConfig, SessionError, SessionOptions, SessionStatus, SystemClock,
    WalletConnector,
};

/// Owns every remembered wallet session.
///
/// ## Lifecycle
///
/// ```text
/// create_or_update_session() ──→ [Active] ──(TTL)──→ [Expired]
///            ↑                      │                    │
///            │                      ▼                    ▼
///            │          remove_session() /     get_active_sessions()
///            │          terminate_session()       purges it
///            │                      │                    │
///            └──────────────── [Unauthorized] ←──────────┘
/// ```
pub struct SessionManager<S: SessionStore, K: Clock = SystemClock> {
    store: S,
    clock: K,
    config: SessionConfig,
    /// The persisted table as of the last read or write.
    table: SessionTable,
    /// The last save failed, so `table` holds changes the store lacks.
    unsaved: bool,
}

impl<S: SessionStore> SessionManager<S, SystemClock> {
    /// Opens a manager on `store` using the system clock.
    ///
    /// Never fails: an unreadable or malformed table is logged and
    /// replaced by an empty one.
    pub async fn open(store: S, config: SessionConfig) -> Self {
        Self::open_with_clock(store, config, SystemClock).await
    }
}

impl<S: SessionStore, K: Clock> SessionManager<S, K> {
    /// Opens a manager on `store` with an explicit time source.
    pub async fn open_with_clock(store: S, config: SessionConfig, clock: K) -> Self {
        let mut manager = Self {
            store,
            clock,
            config,
            table: SessionTable::default(),
            unsaved: false,
        };
        manager.reload().await;
        manager
    }

    /// Re-reads the session table from the store, dropping the in-memory
    /// copy along with any unsaved changes. An unreadable table reads as
    /// empty.
    pub async fn reload(&mut self) {
        self.unsaved = false;
        self.table = match self.load().await {
            Ok(table) => {
                tracing::debug!(sessions = table.len(), "session table loaded");
                table
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load session table, starting empty");
                SessionTable::default()
            }
        };
    }

    // =====================================================================
    // Authorization
    // =====================================================================

    /// Records that `origin` was authorized for `address` on `chain_id`.
    ///
    /// Every call is a fresh authorization: `connected_at` and the other
    /// timestamps become now, and the expiry restarts at `now + TTL`. An
    /// existing session of the origin under this address is replaced in
    /// place; a binding of the origin to another address is dropped. The
    /// table is persisted.
    ///
    /// Addresses are opaque; no format validation is performed.
    pub async fn create_or_update_session(
        &mut self,
        origin: impl Into<Origin>,
        address: impl Into<Address>,
        chain_id: impl Into<ChainId>,
        options: SessionOptions,
    ) -> Session {
        self.refresh().await;
        let now = self.now();

        let session = Session {
            origin: origin.into(),
            address: address.into(),
            chain_id: chain_id.into(),
            connected_at: now,
            last_connected: now,
            last_activity: now,
            expires_at: now.saturating_add(self.config.ttl_ms()),
            permissions: options.permissions,
            auto_connect: options.auto_connect,
            name: options.name,
            favicon: options.favicon,
        };

        let replaced = self.table.upsert(session.clone());
        tracing::info!(
            origin = %session.origin,
            account = %session.address,
            chain_id = %session.chain_id,
            refreshed = replaced.is_some(),
            "session authorized"
        );

        self.persist().await;
        session
    }

    // =====================================================================
    // Reads
    // =====================================================================

    /// Looks up the live session for `origin`.
    ///
    /// Pure: nothing is read, purged or written. An expired session is
    /// not returned even though it is still stored.
    pub fn get_session(&self, origin: &Origin) -> Option<&Session> {
        let now = self.now();
        self.table.find(origin).filter(|s| !s.is_expired_at(now))
    }

    /// Loads the live sessions of `account` from the store, in the order
    /// they were first stored.
    ///
    /// Expired sessions of that account are purged, and if any were, the
    /// table is written back before returning.
    pub async fn get_active_sessions(&mut self, account: &Address) -> Vec<Session> {
        self.refresh().await;
        let purged = self.table.purge_expired(account, self.now());
        if purged > 0 {
            tracing::info!(%account, purged, "expired sessions purged");
            self.persist().await;
        }
        self.table.account(account).to_vec()
    }

    /// Returns every live session across all accounts.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        let now = self.now();
        self.table.sessions().filter(move |s| !s.is_expired_at(now))
    }

    /// Returns `true` if `origin` has a session that hasn't expired.
    pub fn is_session_valid(&self, origin: &Origin) -> bool {
        self.get_session(origin).is_some()
    }

    /// Returns `true` if `origin` may be reconnected without prompting:
    /// its session is valid and auto-connect is enabled.
    pub fn should_auto_connect(&self, origin: &Origin) -> bool {
        self.get_session(origin).is_some_and(|s| s.auto_connect)
    }

    /// Returns where `origin` stands in the session lifecycle.
    pub fn status(&self, origin: &Origin) -> SessionStatus {
        match self.table.find(origin) {
            None => SessionStatus::Unauthorized,
            Some(s) if s.is_expired_at(self.now()) => SessionStatus::Expired,
            Some(_) => SessionStatus::Active,
        }
    }

    /// Returns the network to switch to when reconnecting a session last
    /// seen on `chain_id`.
    pub fn get_network_preference(&self, chain_id: &ChainId) -> Option<&str> {
        self.table.network_preferences.get(chain_id).map(String::as_str)
    }

    /// All remembered network preferences.
    pub fn network_preferences(&self) -> &BTreeMap<ChainId, String> {
        &self.table.network_preferences
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of stored sessions, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // =====================================================================
    // Targeted updates
    // =====================================================================

    /// Enables or disables silent reconnection for `origin`.
    ///
    /// No-op if the origin has no stored session.
    pub async fn set_auto_connect(&mut self, origin: &Origin, enabled: bool) {
        self.refresh().await;
        let Some(session) = self.table.find_mut(origin) else {
            tracing::debug!(%origin, "set_auto_connect: no session");
            return;
        };
        session.auto_connect = enabled;
        tracing::info!(%origin, enabled, "auto-connect updated");
        self.persist().await;
    }

    /// Records that `origin` is now on `chain_id`.
    ///
    /// Refreshes `last_connected` but not the expiry. No-op if the origin
    /// has no stored session.
    pub async fn update_network(&mut self, origin: &Origin, chain_id: impl Into<ChainId>) {
        self.refresh().await;
        let now = self.now();
        let Some(session) = self.table.find_mut(origin) else {
            tracing::debug!(%origin, "update_network: no session");
            return;
        };
        session.chain_id = chain_id.into();
        session.last_connected = now;
        tracing::info!(%origin, chain_id = %session.chain_id, "session network updated");
        self.persist().await;
    }

    /// Remembers that sessions last seen on `chain_id` should be switched
    /// to `network` when they reconnect.
    pub async fn set_network_preference(
        &mut self,
        chain_id: impl Into<ChainId>,
        network: impl Into<String>,
    ) {
        self.refresh().await;
        let chain_id = chain_id.into();
        let network = network.into();
        tracing::debug!(%chain_id, %network, "network preference set");
        self.table.network_preferences.insert(chain_id, network);
        self.persist().await;
    }

    /// Marks activity on `(account, origin)`.
    ///
    /// Expired sessions of the account are purged first, so activity on an
    /// expired session is a no-op.
    pub async fn update_session_activity(&mut self, account: &Address, origin: &Origin) {
        self.refresh().await;
        let now = self.now();
        let purged = self.table.purge_expired(account, now);

        let touched = match self
            .table
            .accounts
            .get_mut(account)
            .and_then(|list| list.iter_mut().find(|s| &s.origin == origin))
        {
            Some(session) => {
                session.last_activity = now;
                true
            }
            None => false,
        };

        if touched || purged > 0 {
            self.persist().await;
        }
    }

    // =====================================================================
    // Removal
    // =====================================================================

    /// Forgets the session of `origin`, whichever account holds it.
    ///
    /// Idempotent: removing a missing session does nothing.
    pub async fn remove_session(&mut self, origin: &Origin) {
        self.refresh().await;
        match self.table.remove_origin(origin) {
            Some(removed) => {
                tracing::info!(%origin, account = %removed.address, "session removed");
                self.persist().await;
            }
            None => tracing::debug!(%origin, "remove_session: no session"),
        }
    }

    /// Forgets the session of `origin` under `account`.
    ///
    /// Expired sessions of the account are purged along the way.
    pub async fn terminate_session(&mut self, account: &Address, origin: &Origin) {
        self.refresh().await;
        let purged = self.table.purge_expired(account, self.now());
        let removed = self.table.remove(account, origin).is_some();
        if removed {
            tracing::info!(%origin, %account, "session terminated");
        }
        if removed || purged > 0 {
            self.persist().await;
        }
    }

    /// Forgets every session of `account`.
    pub async fn terminate_all_sessions(&mut self, account: &Address) {
        self.refresh().await;
        let removed = self.table.remove_account(account);
        if removed.is_empty() {
            return;
        }
        tracing::info!(%account, count = removed.len(), "all sessions terminated");
        self.persist().await;
    }

    /// Forgets every session and every network preference.
    pub async fn clear_all_sessions(&mut self) {
        self.table.clear();
        tracing::info!("all sessions cleared");
        self.persist().await;
    }

    // =====================================================================
    // Auto-reconnect
    // =====================================================================

    /// Tries to restore `origin`'s wallet connection without prompting.
    ///
    /// 1. If [`should_auto_connect`](Self::should_auto_connect) is false
    ///    (after re-reading the store), returns `false` without touching
    ///    the connector.
    /// 2. Connects and reads the wallet's current address.
    /// 3. Compares it (ignoring case) with the session's address.
    /// 4. On a match, switches to the preferred network for the session's
    ///    chain if one is set, refreshes `last_connected`, and returns
    ///    `true`.
    /// 5. On a mismatch or any connector failure, logs and returns `false`.
    ///
    /// `false` means "fall back to a manual connect", never an error to
    /// display. No timeout is applied; a wallet that never answers stalls
    /// this call.
    pub async fn handle_auto_connect<C: WalletConnector>(
        &mut self,
        origin: &Origin,
        connector: &C,
    ) -> bool {
        let Some(pending) = self.begin_auto_connect(origin).await else {
            return false;
        };
        if !pending.run(connector).await {
            return false;
        }
        self.finish_auto_connect(&pending).await
    }

    /// First step of an auto-reconnect: decides whether `origin` may
    /// reconnect and captures what the wallet has to do.
    ///
    /// Returns `None` when [`should_auto_connect`](Self::should_auto_connect)
    /// is false.
    pub async fn begin_auto_connect(&mut self, origin: &Origin) -> Option<PendingReconnect> {
        self.refresh().await;
        if !self.should_auto_connect(origin) {
            tracing::debug!(%origin, "auto-connect skipped");
            return None;
        }
        let session = self.get_session(origin)?.clone();
        let network = self.get_network_preference(&session.chain_id).map(ChainId::from);
        Some(PendingReconnect { session, network })
    }

    /// Last step of an auto-reconnect, after [`PendingReconnect::run`]
    /// succeeded: refreshes `last_connected` and persists.
    ///
    /// Returns `false` if the session was removed or re-bound to another
    /// account while the wallet was answering.
    pub async fn finish_auto_connect(&mut self, pending: &PendingReconnect) -> bool {
        self.refresh().await;
        let now = self.now();
        let origin = &pending.session.origin;
        let Some(stored) = self
            .table
            .find_mut(origin)
            .filter(|s| s.address == pending.session.address)
        else {
            tracing::info!(%origin, "session changed during auto-connect");
            return false;
        };
        stored.last_connected = now;
        tracing::info!(%origin, account = %pending.session.address, "auto-connected");
        self.persist().await;
        true
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Replaces the cached table with the stored one before a
    /// read-modify-write. Keeps the cache if the store can't be read or
    /// if it holds changes that were never saved.
    async fn refresh(&mut self) {
        if self.unsaved {
            tracing::debug!("unsaved session changes pending, skipping re-read");
            return;
        }
        match self.load().await {
            Ok(table) => self.table = table,
            Err(e) => tracing::warn!(error = %e, "could not re-read session table, using cache"),
        }
    }

    async fn load(&self) -> Result<SessionTable, SessionError> {
        match self.store.get(&self.config.storage_key).await? {
            Some(value) => Ok(SessionTable::from_value(value)?),
            None => Ok(SessionTable::default()),
        }
    }

    async fn save(&self) -> Result<(), SessionError> {
        let value = self.table.to_value()?;
        self.store.set(&self.config.storage_key, value).await?;
        Ok(())
    }

    /// Best-effort write of the whole table.
    async fn persist(&mut self) {
        self.table.last_active = self.now();
        self.unsaved = match self.save().await {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!(error = %e, "could not persist session table");
                true
            }
        };
    }
}

// =========================================================================
// PendingReconnect
// =========================================================================

/// The wallet half of an auto-reconnect.
///
/// Produced by [`SessionManager::begin_auto_connect`]. It owns a copy of
/// the session, so it can run without borrowing the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReconnect {
    session: Session,
    network: Option<ChainId>,
}

impl PendingReconnect {
    /// The session being restored, as it was when the reconnect began.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The network the wallet will be switched to, if a preference is set.
    pub fn network(&self) -> Option<&ChainId> {
        self.network.as_ref()
    }

    /// Connects, checks the wallet's account and applies the network
    /// preference. Failures are logged and reported as `false`.
    pub async fn run<C: WalletConnector>(&self, connector: &C) -> bool {
        match self.reconnect(connector).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(origin = %self.session.origin, error = %e, "auto-connect failed");
                false
            }
        }
    }

    async fn reconnect<C: WalletConnector>(&self, connector: &C) -> Result<(), SessionError> {
        connector.connect().await?;

        let current = connector.get_address().await?;
        if !current.matches(&self.session.address) {
            return Err(SessionError::AddressMismatch {
                expected: self.session.address.clone(),
                actual: current,
            });
        }

        if let Some(target) = &self.network {
            let origin = &self.session.origin;
            tracing::debug!(%origin, %target, "switching to preferred network");
            connector.switch_network(target).await?;
        }
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
