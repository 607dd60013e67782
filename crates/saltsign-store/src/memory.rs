//! In-process expiring store backed by `DashMap`.
//!
//! Expiry is evaluated against [`tokio::time::Instant`] on every access, so
//! expired entries are invisible even before they are evicted. Eviction happens
//! lazily on access and in bulk via [`MemoryStore::purge_expired`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tokio::time::Instant;
use tracing::debug;

use crate::{KeyValueStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl: Duration, now: Instant) -> Self {
        Self {
            value: value.to_owned(),
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory [`KeyValueStore`].
///
/// Cloning is cheap and clones share the same entries.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use saltsign_store::{KeyValueStore, MemoryStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.set_ex("sess:1", "{\"u\":\"admin\"}", Duration::from_secs(3600)).await.unwrap();
/// assert!(store.get("sess:1").await.unwrap().is_some());
/// assert_eq!(store.len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict every expired entry. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired store entries");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_owned(), Entry::new(value, ttl, Instant::now()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        // A single shard-locked remove: only one caller can take the entry.
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(_, entry)| entry.value))
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        match self.entries.entry(key.to_owned()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(Entry::new(value, ttl, now));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(value, ttl, now));
                Ok(true)
            }
        }
    }
}
