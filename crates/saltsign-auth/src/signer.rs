//! Client-side request signing.
//!
//! Produces the signature a client submits with a signed request. Signing
//! with a password-derived key and signing with the equivalent precomputed
//! key yield identical signatures, which is what lets a client cache the key
//! after login instead of keeping the password around.

use crate::canonical::{Payload, canonicalize};
use crate::error::AuthError;
use crate::kdf::{SigningKey, derive_key};
use crate::signature::compute_signature;

/// The fields a client signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableRequest {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request path, e.g. `/api/login`.
    pub path: String,
    /// The base64 salt value returned by salt issuance.
    pub salt: String,
    /// Unix seconds at signing time.
    pub timestamp: i64,
    /// Caller-chosen nonce.
    pub nonce: String,
    /// Body or parameters covered by the signature.
    pub payload: Payload,
}

impl SignableRequest {
    /// Build the canonical message for this request.
    pub fn canonical_message(&self) -> Result<String, AuthError> {
        canonicalize(
            &self.method,
            &self.path,
            &self.salt,
            self.timestamp,
            &self.nonce,
            &self.payload.content_hash(),
        )
    }
}

/// Sign a request with a provisioned key.
///
/// # Examples
///
/// ```
/// use saltsign_auth::canonical::Payload;
/// use saltsign_auth::kdf::derive_key;
/// use saltsign_auth::signer::{SignableRequest, sign_with_key, sign_with_password};
///
/// let request = SignableRequest {
///     method: "POST".to_owned(),
///     path: "/api/login".to_owned(),
///     salt: "dW5pdF9zYWx0".to_owned(),
///     timestamp: 1_700_000_000,
///     nonce: "n1".to_owned(),
///     payload: Payload::default(),
/// };
/// let key = derive_key("password", "app-default-salt", 1_000);
/// let by_key = sign_with_key(&key, &request).unwrap();
/// let by_password = sign_with_password("password", "app-default-salt", 1_000, &request).unwrap();
/// assert_eq!(by_key, by_password);
/// ```
pub fn sign_with_key(key: &SigningKey, request: &SignableRequest) -> Result<String, AuthError> {
    let message = request.canonical_message()?;
    Ok(compute_signature(key, &message))
}

/// Derive the key from a password and sign the request with it.
pub fn sign_with_password(
    password: &str,
    app_salt: &str,
    iterations: u32,
    request: &SignableRequest,
) -> Result<String, AuthError> {
    let key = derive_key(password, app_salt, iterations);
    sign_with_key(&key, request)
}

/// Sign a request with a base64 key, as cached by a logged-in client.
pub fn sign_with_key_base64(
    key_base64: &str,
    request: &SignableRequest,
) -> Result<String, AuthError> {
    let key = SigningKey::from_base64(key_base64)?;
    sign_with_key(&key, request)
}
