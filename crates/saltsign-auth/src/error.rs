//! Error types for signed-request authentication.
//!
//! Every authentication failure is represented by [`AuthError`]. Each variant
//! carries a stable, machine-readable reason code and an HTTP-equivalent
//! status so transport layers can report it without inspecting the message.

use saltsign_store::StoreError;

/// Errors that can occur while authenticating a signed request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required field is missing or cannot be parsed.
    #[error("malformed request: {0}")]
    InputMalformed(String),

    /// The salt is absent, expired, or already consumed.
    #[error("salt is invalid, expired or already used")]
    SaltInvalid,

    /// No key material is provisioned for the claimed user.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("signature does not match")]
    SignatureMismatch,

    /// The client timestamp is too far from server time.
    #[error("timestamp outside allowed window: skew {skew}s exceeds {max_skew}s")]
    TimestampExpired {
        /// Observed difference between server and client clocks, in seconds.
        skew: u64,
        /// Largest accepted difference, in seconds.
        max_skew: u64,
    },

    /// The nonce was already used by this user within the replay window.
    #[error("nonce has already been used")]
    NonceReplayed,

    /// The external store failed; the request may be retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl AuthError {
    /// Stable reason code reported to clients.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InputMalformed(_) => "input_malformed",
            Self::SaltInvalid => "salt_invalid",
            Self::UserNotFound(_) => "user_not_found",
            Self::SignatureMismatch => "sig_mismatch",
            Self::TimestampExpired { .. } => "timestamp_expired",
            Self::NonceReplayed => "nonce_replayed",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// HTTP status code equivalent of this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::InputMalformed(_) | Self::SaltInvalid => http::StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) => http::StatusCode::NOT_FOUND,
            Self::SignatureMismatch | Self::TimestampExpired { .. } | Self::NonceReplayed => {
                http::StatusCode::UNAUTHORIZED
            }
            Self::StoreUnavailable(_) => http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the same request may succeed if retried with fresh inputs later.
    ///
    /// Only infrastructure failures are retryable; every other variant is a
    /// terminal verdict on the request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(e) if e.is_transient())
    }
}
