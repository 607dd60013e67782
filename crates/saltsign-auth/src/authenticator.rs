//! Signed-request authentication.
//!
//! [`RequestAuthenticator`] runs every protected request through the same
//! pipeline:
//!
//! 1. validate the request shape (nothing touches the store before this)
//! 2. consume the salt (`salt_invalid` if absent, expired or used)
//! 3. resolve the user's key (`user_not_found`)
//! 4. build the canonical message
//! 5. verify the signature in constant time (`sig_mismatch`)
//! 6. check timestamp freshness (`timestamp_expired`)
//! 7. record the nonce, when the replay cache is enabled (`nonce_replayed`)
//!
//! Consuming the salt first means at most one verification attempt can ever
//! run against an issued salt, so a live salt cannot be used to guess
//! signatures.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use saltsign_core::SaltId;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::canonical::{Payload, canonicalize, ensure_no_delimiter};
use crate::credentials::KeyRepository;
use crate::error::AuthError;
use crate::kdf::SigningKey;
use crate::nonce::NonceCache;
use crate::salt::SaltStore;
use crate::signature::verify_signature;

/// A request submitted for authentication.
///
/// `method` and `path` come from the transport layer, never from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Claimed username.
    pub username: String,
    /// Base64 HMAC signature supplied by the client.
    pub signature: String,
    /// Identifier of the salt the client signed over.
    pub salt_id: String,
    /// Unix seconds claimed by the client.
    pub timestamp: i64,
    /// Caller-chosen nonce.
    pub nonce: String,
    /// Body or parameters covered by the signature.
    pub payload: Payload,
}

/// JSON shape of a signed request body.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as `input_malformed` rather than a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignedRequestBody {
    /// Claimed username.
    pub username: Option<String>,
    /// Base64 signature.
    pub sig: Option<String>,
    /// Salt identifier from salt issuance.
    pub salt_id: Option<String>,
    /// Unix seconds.
    pub timestamp: Option<i64>,
    /// Caller-chosen nonce.
    pub nonce: Option<String>,
    /// Raw body covered by the signature.
    pub body: Option<String>,
    /// Parameters covered by the signature.
    pub params: Option<BTreeMap<String, String>>,
}

impl SignedRequestBody {
    /// Combine the body with the transport's method and path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InputMalformed`] if a required field is missing or
    /// both `body` and `params` are supplied.
    pub fn into_signed_request(
        self,
        method: &str,
        path: &str,
    ) -> Result<SignedRequest, AuthError> {
        let payload = match (self.body, self.params) {
            (Some(_), Some(_)) => {
                return Err(AuthError::InputMalformed(
                    "body and params are mutually exclusive".to_owned(),
                ));
            }
            (Some(body), None) => Payload::Body(body),
            (None, Some(params)) => Payload::Params(params),
            (None, None) => Payload::default(),
        };

        Ok(SignedRequest {
            method: method.to_owned(),
            path: path.to_owned(),
            username: required("username", self.username)?,
            signature: required("sig", self.sig)?,
            salt_id: required("salt_id", self.salt_id)?,
            timestamp: self
                .timestamp
                .ok_or_else(|| AuthError::InputMalformed("missing field: timestamp".to_owned()))?,
            nonce: required("nonce", self.nonce)?,
            payload,
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, AuthError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::InputMalformed(format!("missing field: {name}"))),
    }
}

/// Successful authentication verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The verified username.
    pub username: String,
    /// The salt that was consumed.
    pub salt_id: SaltId,
    /// The client timestamp that passed the freshness check.
    pub timestamp: i64,
}

/// Verifies signed requests against single-use salts and provisioned keys.
#[derive(Clone)]
pub struct RequestAuthenticator {
    salts: SaltStore,
    keys: Arc<dyn KeyRepository>,
    nonces: Option<NonceCache>,
    max_skew: Duration,
    // Stands in for a real key when the user is unknown so both paths do the
    // same HMAC work.
    decoy_key: SigningKey,
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("salts", &self.salts)
            .field("nonces", &self.nonces)
            .field("max_skew", &self.max_skew)
            .finish_non_exhaustive()
    }
}

impl RequestAuthenticator {
    /// Create an authenticator without a nonce replay cache.
    pub fn new(salts: SaltStore, keys: Arc<dyn KeyRepository>, max_skew: Duration) -> Self {
        Self {
            salts,
            keys,
            nonces: None,
            max_skew,
            decoy_key: SigningKey::from_bytes(vec![0u8; crate::kdf::KEY_LEN]),
        }
    }

    /// Enable the nonce replay cache.
    #[must_use]
    pub fn with_nonce_cache(mut self, nonces: NonceCache) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// The salt store this authenticator consumes from.
    #[must_use]
    pub fn salts(&self) -> &SaltStore {
        &self.salts
    }

    /// Authenticate `request` against the current server time.
    pub async fn authenticate(&self, request: &SignedRequest) -> Result<Authenticated, AuthError> {
        self.authenticate_at(request, chrono::Utc::now().timestamp())
            .await
    }

    /// Authenticate `request` as if the server clock read `now` (unix seconds).
    pub async fn authenticate_at(
        &self,
        request: &SignedRequest,
        now: i64,
    ) -> Result<Authenticated, AuthError> {
        match self.run(request, now).await {
            Ok(verdict) => {
                debug!(
                    username = %verdict.username,
                    salt_id = %verdict.salt_id,
                    path = %request.path,
                    "signed request accepted"
                );
                Ok(verdict)
            }
            Err(e) => {
                warn!(
                    username = %request.username,
                    salt_id = %request.salt_id,
                    path = %request.path,
                    reason = e.reason_code(),
                    "signed request rejected"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, request: &SignedRequest, now: i64) -> Result<Authenticated, AuthError> {
        let salt_id = validate(request)?;

        let Some(salt) = self.salts.consume(&salt_id).await? else {
            return Err(AuthError::SaltInvalid);
        };

        // An unknown user is verified against the decoy key and rejected
        // afterwards, so both outcomes run the same work.
        let resolved = self.keys.signing_key(&request.username);
        let key = resolved.as_ref().unwrap_or(&self.decoy_key);

        let message = canonicalize(
            &request.method,
            &request.path,
            &salt,
            request.timestamp,
            &request.nonce,
            &request.payload.content_hash(),
        )?;

        let verified = std::hint::black_box(verify_signature(key, &message, &request.signature));
        if let Err(e) = resolved {
            return Err(e);
        }
        if !verified {
            return Err(AuthError::SignatureMismatch);
        }

        let skew = now.abs_diff(request.timestamp);
        let max_skew = self.max_skew.as_secs();
        if skew > max_skew {
            return Err(AuthError::TimestampExpired { skew, max_skew });
        }

        if let Some(nonces) = &self.nonces {
            nonces
                .check_and_record(&request.username, &request.nonce)
                .await?;
        }

        Ok(Authenticated {
            username: request.username.clone(),
            salt_id,
            timestamp: request.timestamp,
        })
    }
}

/// Shape checks that must pass before the salt is consumed.
fn validate(request: &SignedRequest) -> Result<SaltId, AuthError> {
    for (name, value) in [
        ("username", &request.username),
        ("sig", &request.signature),
        ("salt_id", &request.salt_id),
        ("nonce", &request.nonce),
        ("method", &request.method),
        ("path", &request.path),
    ] {
        if value.is_empty() {
            return Err(AuthError::InputMalformed(format!("missing field: {name}")));
        }
    }
    ensure_no_delimiter("method", &request.method)?;
    ensure_no_delimiter("path", &request.path)?;
    ensure_no_delimiter("nonce", &request.nonce)?;

    // A non-hex id can never have been issued.
    SaltId::new(request.salt_id.as_str()).map_err(|_| AuthError::SaltInvalid)
}
