//! Session policy types: configuration, creation options, and status.

use std::time::Duration;

use freo_protocol::Permissions;
use serde::{Deserialize, Serialize};

/// How long a wallet authorization stays valid: 24 hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// [`DEFAULT_SESSION_TTL`] in milliseconds.
pub const DEFAULT_SESSION_TTL_MS: u64 = 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
///
/// Fixed at construction; there is no way to change the TTL of a running
/// manager. `#[serde(default)]` lets an application config file override
/// only the fields it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a session stays valid after it was (re)authorized.
    ///
    /// Default: [`DEFAULT_SESSION_TTL`].
    pub ttl: Duration,

    /// Key the session table is stored under.
    ///
    /// Default: [`freo_store::SESSION_STORAGE_KEY`].
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            storage_key: freo_store::SESSION_STORAGE_KEY.to_owned(),
        }
    }
}

impl SessionConfig {
    /// The TTL in milliseconds, saturating at `u64::MAX`.
    pub fn ttl_ms(&self) -> u64 {
        u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Optional parts of a new authorization.
///
/// The default grants nothing, enables auto-connect, and carries no
/// display metadata.
///
/// ```rust
/// use freo_session::SessionOptions;
///
/// let opts = SessionOptions::default()
///     .permission("eth_accounts", true)
///     .name("Example Dapp")
///     .auto_connect(false);
/// assert!(!opts.auto_connect);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub permissions: Permissions,
    pub auto_connect: bool,
    pub name: Option<String>,
    pub favicon: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            permissions: Permissions::new(),
            auto_connect: true,
            name: None,
            favicon: None,
        }
    }
}

impl SessionOptions {
    /// Records `capability` as granted or denied.
    pub fn permission(mut self, capability: impl Into<String>, granted: bool) -> Self {
        self.permissions.insert(capability.into(), granted);
        self
    }

    /// Replaces the whole permission map.
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.auto_connect = enabled;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn favicon(mut self, url: impl Into<String>) -> Self {
        self.favicon = Some(url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Where an origin stands in the authorization lifecycle.
///
/// ```text
///   Unauthorized ──(authorize)──→ Active ──(TTL elapses)──→ Expired
///        ↑                          │                          │
///        └──────(disconnect)────────┴───(purge / disconnect)───┘
/// ```
///
/// There is no "connecting" state: connection attempts are transient and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No session is stored for the origin.
    Unauthorized,
    /// A session is stored and still within its TTL.
    Active,
    /// A session is stored but its TTL has elapsed. It will be purged by
    /// the next read of its account.
    Expired,
}

impl SessionStatus {
    /// Returns `true` if the origin may use its stored authorization.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Active => write!(f, "Active"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}
