//! Session lifecycle backed by the external store.
//!
//! A session maps an unguessable [`SessionId`] to the username that
//! authenticated, stored as JSON under `sess:<id>` with the session TTL.
//! Nothing about a session lives in process memory, so any replica can
//! resolve it.

use std::sync::Arc;
use std::time::Duration;

use saltsign_core::SessionId;
use saltsign_store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Session record as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated username.
    #[serde(rename = "u")]
    pub username: String,
    /// Unix seconds at which the session was created.
    pub created_at: i64,
}

/// Creates, resolves and destroys sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    /// Create a session manager whose sessions live for `ttl`.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Session lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for `username` with the default lifetime.
    pub async fn create(&self, username: &str) -> Result<SessionId, StoreError> {
        self.create_with_ttl(username, self.ttl).await
    }

    /// Create a session for `username` that expires after `ttl`.
    pub async fn create_with_ttl(
        &self,
        username: &str,
        ttl: Duration,
    ) -> Result<SessionId, StoreError> {
        let session_id = SessionId::generate();
        let record = Session {
            username: username.to_owned(),
            created_at: chrono::Utc::now().timestamp(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| StoreError::Corrupt(format!("failed to encode session: {e}")))?;
        self.store
            .set_ex(&session_id.store_key(), &value, ttl)
            .await?;
        info!(username, ttl_secs = ttl.as_secs(), "created session");
        Ok(session_id)
    }

    /// Resolve a session to its record.
    ///
    /// Returns `None` for an unknown or expired session. A record that cannot
    /// be decoded is reported as [`StoreError::Corrupt`] rather than treated
    /// as either absent or valid.
    pub async fn resolve(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        let Some(raw) = self.store.get(&session_id.store_key()).await? else {
            debug!(?session_id, "session not found");
            return Ok(None);
        };
        let session = serde_json::from_str::<Session>(&raw)
            .map_err(|e| StoreError::Corrupt(format!("invalid session record: {e}")))?;
        Ok(Some(session))
    }

    /// Resolve a session id taken verbatim from a cookie.
    ///
    /// An id that is not well formed resolves to `None` without a store
    /// round trip.
    pub async fn resolve_raw(&self, raw_id: &str) -> Result<Option<Session>, StoreError> {
        match SessionId::new(raw_id) {
            Ok(session_id) => self.resolve(&session_id).await,
            Err(_) => Ok(None),
        }
    }

    /// Destroy a session. Returns whether a live session was removed.
    pub async fn destroy(&self, session_id: &SessionId) -> Result<bool, StoreError> {
        let removed = self.store.del(&session_id.store_key()).await?;
        if removed {
            info!(?session_id, "destroyed session");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use saltsign_store::MemoryStore;

    use super::*;

    fn manager(store: &MemoryStore, ttl_secs: u64) -> SessionManager {
        SessionManager::new(Arc::new(store.clone()), Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn test_should_create_and_resolve_session() {
        let store = MemoryStore::new();
        let sessions = manager(&store, 3600);

        let id = sessions.create("admin").await.unwrap();
        let session = sessions.resolve(&id).await.unwrap().unwrap();
        assert_eq!(session.username, "admin");
        assert!(session.created_at > 0);

        let raw = store.get(&id.store_key()).await.unwrap().unwrap();
        assert!(raw.contains("\"u\":\"admin\""));
        assert!(raw.contains("\"created_at\""));
    }

    #[tokio::test]
    async fn test_should_resolve_unknown_session_to_none() {
        let sessions = manager(&MemoryStore::new(), 3600);
        assert_eq!(
            sessions.resolve(&SessionId::generate()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_should_resolve_malformed_raw_id_to_none() {
        let sessions = manager(&MemoryStore::new(), 3600);
        assert_eq!(sessions.resolve_raw("not-a-session").await.unwrap(), None);
        assert_eq!(sessions.resolve_raw("").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_expire_session_after_ttl() {
        let sessions = manager(&MemoryStore::new(), 10);
        let id = sessions.create("admin").await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(sessions.resolve(&id).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(sessions.resolve(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_should_destroy_session() {
        let sessions = manager(&MemoryStore::new(), 3600);
        let id = sessions.create("admin").await.unwrap();

        assert!(sessions.destroy(&id).await.unwrap());
        assert!(sessions.resolve(&id).await.unwrap().is_none());
        assert!(!sessions.destroy(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_should_report_corrupt_session_record() {
        let store = MemoryStore::new();
        let sessions = manager(&store, 3600);
        let id = SessionId::generate();
        store
            .set_ex(&id.store_key(), "admin", Duration::from_secs(60))
            .await
            .unwrap();

        let result = sessions.resolve(&id).await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
