//! Single-use salt issuance and consumption.
//!
//! A salt is 24 random bytes, base64 encoded, stored under `salt:<id>` with a
//! short TTL. Consumption is an atomic get-and-delete: of any number of
//! concurrent consumers, at most one receives the value, and once consumed
//! the id never resolves again.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use rand::RngExt;
use saltsign_core::SaltId;
use saltsign_store::{KeyValueStore, StoreError};
use serde::Serialize;
use tracing::debug;

/// Number of random bytes in an issued salt.
pub const SALT_BYTES: usize = 24;

/// A freshly issued salt, as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedSalt {
    /// Opaque identifier the client echoes back.
    pub salt_id: SaltId,
    /// Base64 salt value the client signs over.
    pub salt: String,
    /// Seconds until the salt expires unconsumed.
    pub expires_in: u64,
}

/// Issues and consumes single-use salts held in an external store.
#[derive(Clone)]
pub struct SaltStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for SaltStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltStore").field("ttl", &self.ttl).finish()
    }
}

impl SaltStore {
    /// Create a salt store issuing salts that live for `ttl`.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue a salt with the default lifetime.
    pub async fn issue(&self) -> Result<IssuedSalt, StoreError> {
        self.issue_with_ttl(self.ttl).await
    }

    /// Issue a salt that expires after `ttl`.
    pub async fn issue_with_ttl(&self, ttl: Duration) -> Result<IssuedSalt, StoreError> {
        let salt_id = SaltId::generate();
        let salt = generate_salt();
        self.store.set_ex(&salt_id.store_key(), &salt, ttl).await?;
        debug!(salt_id = %salt_id, ttl_secs = ttl.as_secs(), "issued salt");
        Ok(IssuedSalt {
            salt_id,
            salt,
            expires_in: ttl.as_secs(),
        })
    }

    /// Atomically read and delete the salt stored under `salt_id`.
    ///
    /// Returns `None` if the salt never existed, expired, or was already
    /// consumed.
    pub async fn consume(&self, salt_id: &SaltId) -> Result<Option<String>, StoreError> {
        let salt = self.store.get_del(&salt_id.store_key()).await?;
        debug!(salt_id = %salt_id, found = salt.is_some(), "consumed salt");
        Ok(salt)
    }
}

fn generate_salt() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; SALT_BYTES];
    rng.fill(&mut buf);
    BASE64_STANDARD.encode(buf)
}
