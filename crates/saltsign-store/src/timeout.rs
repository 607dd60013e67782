//! Deadline wrapper for store calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::{KeyValueStore, StoreError};

/// Bounds every call on an inner store with a deadline.
///
/// A call that misses the deadline fails with [`StoreError::Timeout`] so the
/// request path reports a transient failure instead of hanging.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl std::fmt::Debug for TimeoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutStore")
            .field("inner", &"...")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TimeoutStore {
    /// Wrap `inner`, allowing each call at most `timeout`.
    pub fn new(inner: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        if let Ok(result) = tokio::time::timeout(self.timeout, fut).await {
            result
        } else {
            warn!(op, timeout = ?self.timeout, "store call timed out");
            Err(StoreError::Timeout(self.timeout))
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for TimeoutStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.bounded("set_ex", self.inner.set_ex(key, value, ttl))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.bounded("get_del", self.inner.get_del(key)).await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.bounded("del", self.inner.del(key)).await
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.bounded("set_nx_ex", self.inner.set_nx_ex(key, value, ttl))
            .await
    }
}
