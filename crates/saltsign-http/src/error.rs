//! Errors reported by the HTTP layer.
//!
//! Authentication failures pass through unchanged; the remaining variants
//! cover routing and session requirements that only exist at the boundary.

use http::StatusCode;
use saltsign_auth::AuthError;
use saltsign_store::StoreError;

/// A rejection produced while handling an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The signed request failed authentication.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The route requires a session and none was presented or it expired.
    #[error("no active session")]
    NotLoggedIn,

    /// The signed request was made by a different user than the session's.
    #[error("signed request user does not match the session user")]
    SessionMismatch,

    /// No route matches the request path.
    #[error("no route for {0}")]
    NotFound(String),

    /// The path exists but does not accept this method.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// The request body exceeded the size limit.
    #[error("request body larger than {0} bytes")]
    PayloadTooLarge(usize),
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        Self::Auth(AuthError::StoreUnavailable(err))
    }
}

impl HttpError {
    /// Shorthand for an [`AuthError::InputMalformed`] rejection.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Auth(AuthError::InputMalformed(message.into()))
    }

    /// Stable reason code reported in the `error` field.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.reason_code(),
            Self::NotLoggedIn => "not_logged_in",
            Self::SessionMismatch => "session_mismatch",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::PayloadTooLarge(_) => "payload_too_large",
        }
    }

    /// HTTP status of the rejection.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) => e.status_code(),
            Self::NotLoggedIn | Self::SessionMismatch => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_pass_auth_reason_codes_through() {
        let err = HttpError::from(AuthError::SaltInvalid);
        assert_eq!(err.reason_code(), "salt_invalid");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_map_store_errors_to_unavailable() {
        let err = HttpError::from(StoreError::Unavailable("down".into()));
        assert_eq!(err.reason_code(), "store_unavailable");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_should_map_session_errors_to_unauthorized() {
        assert_eq!(HttpError::NotLoggedIn.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::NotLoggedIn.reason_code(), "not_logged_in");
        assert_eq!(
            HttpError::SessionMismatch.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
