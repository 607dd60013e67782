//! Key repository trait and implementations.
//!
//! This module defines the [`KeyRepository`] trait for resolving a user's
//! signing key, along with a [`StaticKeyRepository`] for development and
//! testing. The authenticator depends only on the trait, so a repository
//! backed by durable user storage can be swapped in without touching it.

use std::collections::HashMap;

use crate::error::AuthError;
use crate::kdf::{SigningKey, derive_key};

/// Trait for looking up a user's signing key.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait KeyRepository: Send + Sync {
    /// Retrieve the signing key for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] if the user is not recognized.
    fn signing_key(&self, username: &str) -> Result<SigningKey, AuthError>;
}

/// A read-only in-memory key repository backed by a `HashMap`.
///
/// Built once at startup and shared behind an `Arc`; lookups never lock.
///
/// # Examples
///
/// ```
/// use saltsign_auth::credentials::{KeyRepository, StaticKeyRepository};
///
/// let repo = StaticKeyRepository::new(vec![]).with_password("admin", "password", "app", 1_000);
/// assert!(repo.signing_key("admin").is_ok());
/// assert!(repo.signing_key("mallory").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticKeyRepository {
    keys: HashMap<String, SigningKey>,
}

impl StaticKeyRepository {
    /// Create a repository from `(username, key)` pairs.
    pub fn new(keys: impl IntoIterator<Item = (String, SigningKey)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Create a repository from `(username, key_base64)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InputMalformed`] if any key is not valid base64.
    pub fn from_base64(
        keys: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, AuthError> {
        let keys = keys
            .into_iter()
            .map(|(user, key)| SigningKey::from_base64(&key).map(|k| (user, k)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { keys })
    }

    /// Provision `username` with a key derived from `password`.
    ///
    /// Runs the full key derivation; call it off the async executor.
    #[must_use]
    pub fn with_password(
        mut self,
        username: &str,
        password: &str,
        app_salt: &str,
        iterations: u32,
    ) -> Self {
        self.keys.insert(
            username.to_owned(),
            derive_key(password, app_salt, iterations),
        );
        self
    }

    /// Number of provisioned users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no users are provisioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyRepository for StaticKeyRepository {
    fn signing_key(&self, username: &str) -> Result<SigningKey, AuthError> {
        self.keys
            .get(username)
            .cloned()
            .ok_or_else(|| AuthError::UserNotFound(username.to_owned()))
    }
}
