//! The persisted session table.
//!
//! Everything Freo remembers lives in one document, stored under one key:
//!
//! ```json
//! {
//!   "accounts": {
//!     "0xABC": [ { "origin": "dapp.example", "chainId": "0x1", ... } ]
//!   },
//!   "networkPreferences": { "0x1": "0x89" },
//!   "lastActiveTimestamp": 1700000000000
//! }
//! ```
//!
//! Earlier builds stored a bare `{ account: [session, ...] }` map under the
//! same key, with `domain` instead of `origin` and no address, permission
//! or auto-connect fields. [`SessionTable::from_value`] reads both and
//! migrates the old layout in memory; the next write persists the current
//! layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Address, ChainId, Origin, Permissions, ProtocolError, Session};

/// All remembered sessions, grouped by account, plus per-chain network
/// preferences.
///
/// ## Invariants
///
/// - Every session is stored under the account equal to its `address`.
/// - Within one account no two sessions share an `origin`.
/// - An origin appears under at most one account: [`upsert`](Self::upsert)
///   drops the older binding when an origin is authorized for a new
///   address.
/// - Account lists keep insertion order. Empty lists are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionTable {
    #[serde(default)]
    pub accounts: BTreeMap<Address, Vec<Session>>,

    /// Chain id → network the wallet should switch to when reconnecting
    /// a session last seen on that chain.
    #[serde(default)]
    pub network_preferences: BTreeMap<ChainId, String>,

    /// Time of the last mutation, in milliseconds since the Unix epoch.
    #[serde(default, rename = "lastActiveTimestamp")]
    pub last_active: u64,
}

/// A session as written by the older per-account layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySession {
    pub domain: Origin,
    pub chain_id: ChainId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    pub connected_at: u64,
    pub expires_at: u64,
    pub last_activity: u64,
}

impl LegacySession {
    /// Converts the record into a current [`Session`] bound to `account`.
    ///
    /// Missing fields take the defaults a fresh authorization would get:
    /// no permissions and auto-connect enabled.
    pub fn into_session(self, account: Address) -> Session {
        Session {
            origin: self.domain,
            address: account,
            chain_id: self.chain_id,
            connected_at: self.connected_at,
            last_connected: self.connected_at,
            last_activity: self.last_activity,
            expires_at: self.expires_at,
            permissions: Permissions::new(),
            auto_connect: true,
            name: self.name.filter(|n| !n.is_empty()),
            favicon: self.favicon.filter(|f| !f.is_empty()),
        }
    }
}

/// The shapes a stored value may have.
///
/// `SessionTable` denies unknown fields, so a legacy map (whose keys are
/// account addresses) falls through to the second variant.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTable {
    Current(SessionTable),
    Legacy(BTreeMap<Address, Vec<LegacySession>>),
}

impl SessionTable {
    /// Decodes a stored value, migrating the legacy layout if needed.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the value matches neither
    /// layout.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match serde_json::from_value(value).map_err(ProtocolError::Decode)? {
            StoredTable::Current(table) => Ok(table),
            StoredTable::Legacy(accounts) => {
                let mut table = SessionTable::default();
                for (account, sessions) in accounts {
                    for legacy in sessions {
                        let session = legacy.into_session(account.clone());
                        table.last_active = table.last_active.max(session.last_activity);
                        table.upsert(session);
                    }
                }
                Ok(table)
            }
        }
    }

    /// Encodes the table in the current layout.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Iterates over every session, account by account, in stored order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.accounts.values().flatten()
    }

    /// Returns the sessions stored for `account`, in insertion order.
    pub fn account(&self, account: &Address) -> &[Session] {
        self.accounts.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds the session for `origin`, whichever account holds it.
    pub fn find(&self, origin: &Origin) -> Option<&Session> {
        self.sessions().find(|s| &s.origin == origin)
    }

    /// Mutable variant of [`find`](Self::find).
    ///
    /// Callers must not change `origin` or `address` through the returned
    /// reference; both are part of the record's identity.
    pub fn find_mut(&mut self, origin: &Origin) -> Option<&mut Session> {
        self.accounts
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|s| &s.origin == origin)
    }

    /// Returns the account `origin` is currently bound to.
    pub fn account_of(&self, origin: &Origin) -> Option<&Address> {
        self.accounts
            .iter()
            .find(|(_, list)| list.iter().any(|s| &s.origin == origin))
            .map(|(account, _)| account)
    }

    /// Inserts or replaces the session for `(session.address, session.origin)`.
    ///
    /// A replaced record keeps its position in the account's list; a new
    /// one is appended. Any binding of the same origin to a different
    /// account is removed. Returns the record that was replaced, if any.
    pub fn upsert(&mut self, session: Session) -> Option<Session> {
        let origin = session.origin.clone();
        let account = session.address.clone();
        self.retain(|s| s.origin != origin || s.address == account);

        let list = self.accounts.entry(account).or_default();
        match list.iter_mut().find(|s| s.origin == origin) {
            Some(slot) => Some(std::mem::replace(slot, session)),
            None => {
                list.push(session);
                None
            }
        }
    }

    /// Removes `origin` from whichever account holds it.
    pub fn remove_origin(&mut self, origin: &Origin) -> Option<Session> {
        let account = self.account_of(origin)?.clone();
        self.remove(&account, origin)
    }

    /// Removes the session for `(account, origin)`.
    pub fn remove(&mut self, account: &Address, origin: &Origin) -> Option<Session> {
        let list = self.accounts.get_mut(account)?;
        let idx = list.iter().position(|s| &s.origin == origin)?;
        let removed = list.remove(idx);
        if list.is_empty() {
            self.accounts.remove(account);
        }
        Some(removed)
    }

    /// Removes every session of `account` and returns them.
    pub fn remove_account(&mut self, account: &Address) -> Vec<Session> {
        self.accounts.remove(account).unwrap_or_default()
    }

    /// Drops the sessions of `account` that are expired at `now_ms`.
    ///
    /// Returns how many were removed. The survivors keep their order.
    pub fn purge_expired(&mut self, account: &Address, now_ms: u64) -> usize {
        let Some(list) = self.accounts.get_mut(account) else {
            return 0;
        };
        let before = list.len();
        list.retain(|s| !s.is_expired_at(now_ms));
        let removed = before - list.len();
        if list.is_empty() {
            self.accounts.remove(account);
        }
        removed
    }

    /// Forgets every session and every network preference.
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.network_preferences.clear();
    }

    /// Total number of stored sessions (expired ones included).
    pub fn len(&self) -> usize {
        self.accounts.values().map(Vec::len).sum()
    }

    /// Returns `true` if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn retain(&mut self, mut keep: impl FnMut(&Session) -> bool) {
        for list in self.accounts.values_mut() {
            list.retain(|s| keep(s));
        }
        self.accounts.retain(|_, list| !list.is_empty());
    }
}
