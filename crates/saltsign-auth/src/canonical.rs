//! Canonical message construction.
//!
//! The canonical message is the exact string that gets signed:
//!
//! ```text
//! METHOD|PATH|SALT|TIMESTAMP|NONCE|CONTENT_HASH
//! ```
//!
//! - `SALT` is the base64 salt value as issued (never the salt id)
//! - `TIMESTAMP` is decimal unix seconds
//! - `CONTENT_HASH` is base64(SHA-256) of the request body, or of the canonical
//!   serialization of the request parameters
//!
//! Fields are joined with `|` in a fixed order. Rather than escaping, any
//! field that contains the delimiter is rejected, so distinct inputs can never
//! produce the same message. Base64 and decimal fields cannot contain it.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Field delimiter of the canonical message.
pub const DELIMITER: char = '|';

/// Characters percent-encoded in parameter keys and values.
///
/// Everything except RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`).
const PARAM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The content covered by a signature: a raw body or a parameter map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A raw request body, hashed as-is.
    Body(String),
    /// Request parameters, hashed in canonical form.
    Params(BTreeMap<String, String>),
}

impl Default for Payload {
    fn default() -> Self {
        Self::Body(String::new())
    }
}

impl Payload {
    /// The base64 SHA-256 content hash that enters the canonical message.
    ///
    /// An empty body and an empty parameter map hash identically.
    #[must_use]
    pub fn content_hash(&self) -> String {
        match self {
            Self::Body(body) => hash_content(body.as_bytes()),
            Self::Params(params) => hash_content(canonical_params(params).as_bytes()),
        }
    }
}

/// Compute base64(SHA-256(`content`)).
///
/// # Examples
///
/// ```
/// use saltsign_auth::canonical::hash_content;
///
/// // SHA-256 of empty content
/// assert_eq!(hash_content(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
/// ```
#[must_use]
pub fn hash_content(content: &[u8]) -> String {
    BASE64_STANDARD.encode(Sha256::digest(content))
}

/// Serialize parameters canonically as `k1=v1&k2=v2`.
///
/// Keys are sorted (the map is ordered) and keys and values are
/// percent-encoded so that `=` and `&` inside them cannot shift boundaries.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use saltsign_auth::canonical::canonical_params;
///
/// let params = BTreeMap::from([
///     ("b".to_owned(), "x y".to_owned()),
///     ("a".to_owned(), "1".to_owned()),
/// ]);
/// assert_eq!(canonical_params(&params), "a=1&b=x%20y");
/// ```
#[must_use]
pub fn canonical_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, PARAM_ENCODE_SET),
                utf8_percent_encode(v, PARAM_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical message for a request.
///
/// The same function is used by signers and by the verifier, so both sides
/// produce byte-identical messages.
///
/// # Errors
///
/// Returns [`AuthError::InputMalformed`] if any field contains the `|`
/// delimiter or the method or path is empty.
///
/// # Examples
///
/// ```
/// use saltsign_auth::canonical::{canonicalize, hash_content};
///
/// let message = canonicalize(
///     "POST",
///     "/api/login",
///     "dW5pdF9zYWx0",
///     1_700_000_000,
///     "n1",
///     &hash_content(b""),
/// )
/// .unwrap();
/// assert!(message.starts_with("POST|/api/login|dW5pdF9zYWx0|1700000000|n1|"));
/// ```
pub fn canonicalize(
    method: &str,
    path: &str,
    salt: &str,
    timestamp: i64,
    nonce: &str,
    content_hash: &str,
) -> Result<String, AuthError> {
    if method.is_empty() || path.is_empty() {
        return Err(AuthError::InputMalformed(
            "method and path are required".to_owned(),
        ));
    }
    for (name, value) in [
        ("method", method),
        ("path", path),
        ("salt", salt),
        ("nonce", nonce),
        ("content hash", content_hash),
    ] {
        ensure_no_delimiter(name, value)?;
    }

    Ok(format!(
        "{method}{DELIMITER}{path}{DELIMITER}{salt}{DELIMITER}{timestamp}{DELIMITER}{nonce}{DELIMITER}{content_hash}"
    ))
}

/// Reject a field that contains the canonical delimiter.
pub(crate) fn ensure_no_delimiter(name: &str, value: &str) -> Result<(), AuthError> {
    if value.contains(DELIMITER) {
        return Err(AuthError::InputMalformed(format!(
            "{name} must not contain '{DELIMITER}'"
        )));
    }
    Ok(())
}
