//! Identity types for wallet sessions.
//!
//! Each of these is a newtype around a `String`. The wallet provider and
//! the browser hand us plain strings, and nothing here validates their
//! format: an address is whatever the wallet says it is. The wrappers
//! exist so that an origin can't be passed where a chain id is expected.
//!
//! `#[serde(transparent)]` keeps the JSON representation a bare string,
//! so `Origin("dapp.example")` is stored as `"dapp.example"`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The site (origin or bare domain) a wallet authorized.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Origin(pub String);

/// A wallet account the session is bound to.
///
/// Equality is exact (`0xABC != 0xabc`) so that map keys round-trip the
/// way the wallet reported them. Use [`Address::matches`] when comparing
/// against what a provider returns.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(pub String);

/// A chain identifier as the provider reports it (e.g. `"0x1"`).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl Address {
    /// Compares two addresses ignoring ASCII case.
    ///
    /// Hex addresses come back from wallets in checksummed, lower, or
    /// upper case depending on the provider.
    pub fn matches(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

macro_rules! string_newtype {
    ($($ty:ident),* $(,)?) => {$(
        impl $ty {
            /// Returns the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    )*};
}

string_newtype!(Origin, Address, ChainId);
