//! JSON response construction and error formatting.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::HttpError;

/// Body of every SaltSign response. Responses are always fully buffered.
pub type AuthResponseBody = Full<Bytes>;

/// Content type of every JSON response.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize an error into the rejection document.
///
/// ```json
/// { "ok": false, "error": "salt_invalid", "message": "salt is invalid, expired or already used" }
/// ```
#[must_use]
pub fn error_to_json(error: &HttpError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "ok": false,
        "error": error.reason_code(),
        "message": error.to_string(),
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Convert an [`HttpError`] into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &HttpError) -> http::Response<AuthResponseBody> {
    http::Response::builder()
        .status(error.status_code())
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(Full::new(Bytes::from(error_to_json(error))))
        .expect("valid error response")
}

/// Build a JSON response with the given status.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<http::Response<AuthResponseBody>, HttpError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| HttpError::malformed(format!("failed to encode response: {e}")))?;
    Ok(http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(Full::new(Bytes::from(json)))
        .expect("valid JSON response"))
}

/// Build a `200 OK` JSON response.
pub fn ok_json<T: Serialize>(value: &T) -> Result<http::Response<AuthResponseBody>, HttpError> {
    json_response(StatusCode::OK, value)
}
