//! HMAC-SHA256 request signatures.
//!
//! A signature is `base64(HMAC-SHA256(key, canonical_message))`. Verification
//! recomputes the expected signature and compares the encoded forms with a
//! constant-time equality check.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::kdf::SigningKey;

type HmacSha256 = Hmac<Sha256>;

/// Compute the base64 HMAC-SHA256 signature of `message` under `key`.
///
/// # Examples
///
/// ```
/// use saltsign_auth::kdf::SigningKey;
/// use saltsign_auth::signature::compute_signature;
///
/// let key = SigningKey::from_bytes(vec![7u8; 32]);
/// let sig = compute_signature(&key, "POST|/api/login|c2FsdA==|1|n|x");
/// assert_eq!(sig.len(), 44);
/// assert_eq!(sig, compute_signature(&key, "POST|/api/login|c2FsdA==|1|n|x"));
/// ```
#[must_use]
pub fn compute_signature(key: &SigningKey, message: &str) -> String {
    BASE64_STANDARD.encode(hmac_sha256(key.as_bytes(), message.as_bytes()))
}

/// Check `candidate` against the expected signature of `message` under `key`.
///
/// The comparison runs in time independent of where the first differing byte
/// is. Candidates of a different length are rejected.
#[must_use]
pub fn verify_signature(key: &SigningKey, message: &str, candidate: &str) -> bool {
    let expected = compute_signature(key, message);
    candidate.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
