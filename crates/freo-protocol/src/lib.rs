//! Data model for Freo wallet sessions.
//!
//! This crate defines what every other layer agrees on:
//!
//! - **Identity types** ([`Origin`], [`Address`], [`ChainId`]): the
//!   strings that key a wallet authorization.
//! - **Records** ([`Session`], [`Permissions`]): one origin's
//!   authorization of one wallet address on one chain.
//! - **The table** ([`SessionTable`]): the single document that gets
//!   persisted, including migration of the older per-account layout.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how documents become
//!   bytes for stores that need them.
//!
//! # Architecture
//!
//! ```text
//! Store (JSON values) ← Protocol (SessionTable) → Session manager (policy)
//! ```
//!
//! Nothing in here knows about clocks, wallets, or storage backends.
//! Timestamps are plain milliseconds since the Unix epoch.

mod codec;
mod error;
mod session;
mod table;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use session::{Permissions, Session};
pub use table::{LegacySession, SessionTable};
pub use types::{Address, ChainId, Origin};
