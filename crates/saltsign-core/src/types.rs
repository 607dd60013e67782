//! Opaque identifiers shared across SaltSign services.
//!
//! Salt and session identifiers are handed to clients and echoed back on later
//! requests, so they are validated on the way in before any store lookup.

use std::fmt;

use rand::RngExt;
use uuid::Uuid;

/// Shortest identifier accepted from the wire (128 bits, hex encoded).
const MIN_ID_LEN: usize = 32;
/// Longest identifier accepted from the wire.
const MAX_ID_LEN: usize = 128;

/// Identifier of a single issued salt (UUID v4 without dashes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SaltId(String);

impl SaltId {
    /// Generate a fresh, unguessable salt identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a salt identifier received from a client.
    ///
    /// # Errors
    /// Returns an error if the value is not a hex string of plausible length.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::SaltSignError> {
        validate(id.into()).map(Self)
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key under which this salt lives in the external store.
    #[must_use]
    pub fn store_key(&self) -> String {
        format!("salt:{}", self.0)
    }
}

impl fmt::Display for SaltId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an authenticated session (256 random bits, hex encoded).
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unguessable session identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut buf = [0u8; 32];
        rng.fill(&mut buf);
        Self(hex::encode(buf))
    }

    /// Parse a session identifier taken from a cookie.
    ///
    /// # Errors
    /// Returns an error if the value is not a hex string of plausible length.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::SaltSignError> {
        validate(id.into()).map(Self)
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key under which this session lives in the external store.
    #[must_use]
    pub fn store_key(&self) -> String {
        format!("sess:{}", self.0)
    }
}

// Session ids are bearer credentials; keep them out of logs.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "SessionId({prefix}...)")
    }
}

fn validate(id: String) -> Result<String, crate::SaltSignError> {
    let len_ok = (MIN_ID_LEN..=MAX_ID_LEN).contains(&id.len());
    if !len_ok || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(crate::SaltSignError::InvalidIdentifier(id));
    }
    Ok(id)
}
