//! Persistent storage layer for Freo.
//!
//! Provides the [`SessionStore`] trait that the session manager saves its
//! table through, plus two implementations:
//!
//! - [`MemoryStore`]: a shared in-process map (tests, ephemeral sessions)
//! - [`FileStore`]: a single JSON file on disk
//!
//! A browser build plugs its own `localStorage`-backed implementation into
//! the same trait.
//!
//! # Feature Flags
//!
//! - `fs` (default): [`FileStore`]

mod error;
#[cfg(feature = "fs")]
mod file;
mod memory;

pub use error::StoreError;
#[cfg(feature = "fs")]
pub use file::FileStore;
pub use memory::MemoryStore;

use std::future::Future;

use serde_json::Value;

/// The key the session table is stored under.
pub const SESSION_STORAGE_KEY: &str = "freo_wallet_sessions";

/// Durable key-value storage for JSON values.
///
/// The contract is deliberately small: last write wins per key, and there
/// is no ordering guarantee between keys. `set` replaces the whole value
/// for a key; implementations must never expose a half-written value to a
/// later `get`.
///
/// # Example
///
/// ```rust
/// use freo_store::{SessionStore, StoreError};
/// use serde_json::Value;
///
/// /// A store that remembers nothing.
/// struct NullStore;
///
/// impl SessionStore for NullStore {
///     async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
///         Ok(None)
///     }
///
///     async fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
///         Ok(())
///     }
///
///     async fn remove(&self, _key: &str) -> Result<(), StoreError> {
///         Ok(())
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Loads the value stored under `key`, or `None` if there is none.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Stores `value` under `key`, replacing whatever was there.
    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
