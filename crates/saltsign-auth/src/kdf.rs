//! Password-based key derivation.
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 from a user password and the
//! application-wide salt. The derivation is deliberately slow; callers must
//! never run it while holding a lock, and should prefer running it on a
//! blocking thread when inside an async runtime.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Length of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Symmetric key used to sign and verify requests on behalf of one user.
///
/// Equality is constant-time and the `Debug` output never reveals key bytes.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a standard base64 key as held server-side.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InputMalformed`] if the value is not valid base64
    /// or decodes to an empty key.
    pub fn from_base64(encoded: &str) -> Result<Self, AuthError> {
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::InputMalformed(format!("key is not valid base64: {e}")))?;
        if bytes.is_empty() {
            return Err(AuthError::InputMalformed("key must not be empty".to_owned()));
        }
        Ok(Self(bytes))
    }

    /// Encode the key as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SigningKey {}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey([REDACTED; {}])", self.0.len())
    }
}

/// Derive a 256-bit signing key from a password and the application salt.
///
/// Deterministic: the same inputs always produce the same key. Empty
/// passwords are accepted here; rejecting them is the caller's policy.
///
/// # Examples
///
/// ```
/// use saltsign_auth::kdf::derive_key;
///
/// let a = derive_key("password", "app-default-salt", 1_000);
/// let b = derive_key("password", "app-default-salt", 1_000);
/// assert_eq!(a, b);
/// assert_eq!(a.as_bytes().len(), 32);
/// ```
#[must_use]
pub fn derive_key(password: &str, app_salt: &str, iterations: u32) -> SigningKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), app_salt.as_bytes(), iterations, &mut key);
    SigningKey(key.to_vec())
}

/// Derive a key and return it base64 encoded, the form held server-side.
#[must_use]
pub fn derive_key_base64(password: &str, app_salt: &str, iterations: u32) -> String {
    derive_key(password, app_salt, iterations).to_base64()
}
