//! Expiring key-value store abstraction for SaltSign.
//!
//! All cross-request coordination in SaltSign (single-use salts, session
//! lifetimes, the optional nonce cache) is delegated to an external store
//! with per-key expiry. This crate defines that contract as the
//! [`KeyValueStore`] trait and ships three implementations:
//!
//! - [`MemoryStore`] - in-process `DashMap` store for development and tests
//! - [`RedisStore`] - Redis-backed store (behind the `redis` feature)
//! - [`TimeoutStore`] - wrapper bounding every call on another store
//!
//! The only operation that must be truly atomic is [`KeyValueStore::get_del`]:
//! two requests racing to consume the same key must have exactly one winner.
//!
//! # Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use saltsign_store::{KeyValueStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set_ex("salt:abc", "c2FsdA==", Duration::from_secs(60)).await.unwrap();
//!
//! assert_eq!(store.get_del("salt:abc").await.unwrap().as_deref(), Some("c2FsdA=="));
//! assert_eq!(store.get_del("salt:abc").await.unwrap(), None);
//! # });
//! ```

mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod timeout;

use std::time::Duration;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use timeout::TimeoutStore;

/// An external key-value store whose entries expire after a TTL.
///
/// Implementations must treat an expired entry exactly like an absent one.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Read the live value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomically read and delete the live value under `key`.
    ///
    /// Of any number of concurrent callers, at most one observes `Some`.
    async fn get_del(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete `key`. Returns whether a live value was removed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically store `value` under `key` only if no live value exists.
    ///
    /// Returns `true` if the value was written.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, StoreError>;
}
