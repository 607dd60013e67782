//! Optional nonce replay cache.
//!
//! Salt single-use already prevents replaying a signature verbatim. The nonce
//! cache additionally rejects a nonce a user has sent before within the
//! freshness window, even when it arrives with a newly issued salt. Entries
//! live for twice the allowed clock skew, which covers every timestamp that
//! could still pass the freshness check.

use std::sync::Arc;
use std::time::Duration;

use saltsign_store::KeyValueStore;
use tracing::warn;

use crate::error::AuthError;

/// Records nonces per user and rejects reuse.
#[derive(Clone)]
pub struct NonceCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for NonceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceCache").field("ttl", &self.ttl).finish()
    }
}

impl NonceCache {
    /// Create a cache sized for a freshness window of `max_skew`.
    pub fn new(store: Arc<dyn KeyValueStore>, max_skew: Duration) -> Self {
        Self {
            store,
            ttl: max_skew.saturating_mul(2),
        }
    }

    /// How long a recorded nonce is remembered.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record `nonce` for `username`, failing if it was already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NonceReplayed`] on reuse, or
    /// [`AuthError::StoreUnavailable`] if the store fails.
    pub async fn check_and_record(&self, username: &str, nonce: &str) -> Result<(), AuthError> {
        let key = nonce_key(username, nonce);
        if self.store.set_nx_ex(&key, "1", self.ttl).await? {
            Ok(())
        } else {
            warn!(username, "nonce replay rejected");
            Err(AuthError::NonceReplayed)
        }
    }
}

/// Usernames and nonces may both contain `:`, so the username is
/// length-prefixed to keep the key unambiguous.
fn nonce_key(username: &str, nonce: &str) -> String {
    format!("nonce:{}:{username}:{nonce}", username.len())
}
