//! The session record: one origin's authorization of one wallet address.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Address, ChainId, Origin};

/// Capability name → granted.
///
/// Carried along with every session and preserved across updates. No
/// policy decision in Freo reads it today; callers that gate features on
/// it use [`Session::grants`].
pub type Permissions = BTreeMap<String, bool>;

/// A remembered wallet authorization for one origin.
///
/// All timestamps are milliseconds since the Unix epoch.
///
/// ```text
/// connected_at ── last_connected ── last_activity ──→ expires_at
///   (first auth)   (re-auth, network    (activity        (invalid from
///                   change, reconnect)    ticks)          here onwards)
/// ```
///
/// The JSON field names are camelCase (`chainId`, `expiresAt`, ...).
/// Records written under the older schema used `domain` instead of
/// `origin`; that spelling is still accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The site that was authorized.
    #[serde(alias = "domain")]
    pub origin: Origin,

    /// The wallet account the site was authorized for.
    pub address: Address,

    /// Chain active at the last connection.
    pub chain_id: ChainId,

    /// When the origin was last authorized. `expires_at` counts from here.
    pub connected_at: u64,

    /// When the session was last (re)connected or moved to another chain.
    pub last_connected: u64,

    /// When the site last reported activity.
    pub last_activity: u64,

    /// Absolute expiry. The session is invalid once `now >= expires_at`.
    pub expires_at: u64,

    #[serde(default)]
    pub permissions: Permissions,

    /// If `false` the session is remembered but never used to reconnect
    /// silently.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,

    /// Display name of the site, if the caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Icon URL of the site, if the caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

fn default_auto_connect() -> bool {
    true
}

impl Session {
    /// Returns `true` if the session is no longer valid at `now_ms`.
    ///
    /// The boundary is inclusive: a session whose `expires_at` equals the
    /// current time is already expired.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at <= now_ms
    }

    /// Time left before the session expires, zero if it already has.
    pub fn remaining_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now_ms))
    }

    /// Returns `true` if `capability` was explicitly granted.
    pub fn grants(&self, capability: &str) -> bool {
        self.permissions.get(capability).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: u64) -> Session {
        Session {
            origin: Origin::from("dapp.example"),
            address: Address::from("0xABC"),
            chain_id: ChainId::from("0x1"),
            connected_at: 0,
            last_connected: 0,
            last_activity: 0,
            expires_at,
            permissions: Permissions::new(),
            auto_connect: true,
            name: None,
            favicon: None,
        }
    }

    #[test]
    fn test_is_expired_at_boundary_is_inclusive() {
        let s = session(1_000);
        assert!(!s.is_expired_at(999));
        assert!(s.is_expired_at(1_000));
        assert!(s.is_expired_at(1_001));
    }

    #[test]
    fn test_remaining_at_saturates_to_zero() {
        let s = session(1_000);
        assert_eq!(s.remaining_at(400), Duration::from_millis(600));
        assert_eq!(s.remaining_at(5_000), Duration::ZERO);
    }

    #[test]
    fn test_grants_defaults_to_false() {
        let mut s = session(1_000);
        s.permissions.insert("eth_accounts".into(), true);
        s.permissions.insert("personal_sign".into(), false);

        assert!(s.grants("eth_accounts"));
        assert!(!s.grants("personal_sign"));
        assert!(!s.grants("eth_sendTransaction"));
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let value = serde_json::to_value(session(42)).unwrap();

        assert_eq!(value["chainId"], "0x1");
        assert_eq!(value["expiresAt"], 42);
        assert_eq!(value["autoConnect"], true);
        assert!(value.get("name").is_none(), "absent metadata is omitted");
    }

    #[test]
    fn test_deserialize_accepts_domain_alias_and_defaults() {
        let json = r#"{
            "domain": "dapp.example",
            "address": "0xABC",
            "chainId": "0x1",
            "connectedAt": 1,
            "lastConnected": 1,
            "lastActivity": 1,
            "expiresAt": 2
        }"#;

        let s: Session = serde_json::from_str(json).unwrap();

        assert_eq!(s.origin, Origin::from("dapp.example"));
        assert!(s.auto_connect, "autoConnect defaults to true");
        assert!(s.permissions.is_empty());
    }
}
