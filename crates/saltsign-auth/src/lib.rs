//! Salted, single-use HMAC request signing and verification for SaltSign.
//!
//! This crate provides the authentication core of SaltSign: password-based
//! key derivation, the canonical message format, constant-time signature
//! verification, single-use salts, sessions, and the [`RequestAuthenticator`]
//! that ties them together.
//!
//! # Overview
//!
//! A client fetches a salt, signs
//! `METHOD|PATH|SALT|TIMESTAMP|NONCE|CONTENT_HASH` with an HMAC-SHA256 key
//! derived from its password, and submits the signature together with the
//! salt id. The server consumes the salt atomically, recomputes the signature
//! with the user's provisioned key and accepts the request only if both match
//! and the timestamp is fresh. Because every salt can be consumed once, a
//! captured request can never be replayed.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use saltsign_auth::canonical::Payload;
//! use saltsign_auth::signer::{SignableRequest, sign_with_password};
//! use saltsign_auth::{RequestAuthenticator, SaltStore, SignedRequest, StaticKeyRepository};
//! use saltsign_store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let keys = StaticKeyRepository::default().with_password("admin", "password", "app", 1_000);
//! let salts = SaltStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
//! let authenticator = RequestAuthenticator::new(salts, Arc::new(keys), Duration::from_secs(60));
//!
//! let issued = authenticator.salts().issue().await.unwrap();
//! let signable = SignableRequest {
//!     method: "POST".to_owned(),
//!     path: "/api/login".to_owned(),
//!     salt: issued.salt.clone(),
//!     timestamp: 1_700_000_000,
//!     nonce: "n1".to_owned(),
//!     payload: Payload::default(),
//! };
//! let request = SignedRequest {
//!     method: signable.method.clone(),
//!     path: signable.path.clone(),
//!     username: "admin".to_owned(),
//!     signature: sign_with_password("password", "app", 1_000, &signable).unwrap(),
//!     salt_id: issued.salt_id.to_string(),
//!     timestamp: signable.timestamp,
//!     nonce: signable.nonce.clone(),
//!     payload: Payload::default(),
//! };
//!
//! let verdict = authenticator.authenticate_at(&request, 1_700_000_000).await.unwrap();
//! assert_eq!(verdict.username, "admin");
//! # });
//! ```
//!
//! # Modules
//!
//! - [`authenticator`] - Signed-request verification pipeline
//! - [`canonical`] - Canonical message and content hash construction
//! - [`credentials`] - Key repository trait and in-memory implementation
//! - [`error`] - Authentication error types
//! - [`kdf`] - PBKDF2 key derivation
//! - [`nonce`] - Optional nonce replay cache
//! - [`salt`] - Single-use salt issuance and consumption
//! - [`session`] - Session creation, resolution and logout
//! - [`signature`] - HMAC-SHA256 signing and constant-time verification
//! - [`signer`] - Client-side request signing

pub mod authenticator;
pub mod canonical;
pub mod credentials;
pub mod error;
pub mod kdf;
pub mod nonce;
pub mod salt;
pub mod session;
pub mod signature;
pub mod signer;

pub use authenticator::{Authenticated, RequestAuthenticator, SignedRequest, SignedRequestBody};
pub use credentials::{KeyRepository, StaticKeyRepository};
pub use error::AuthError;
pub use kdf::{SigningKey, derive_key, derive_key_base64};
pub use nonce::NonceCache;
pub use salt::{IssuedSalt, SaltStore};
pub use session::{Session, SessionManager};
pub use signature::{compute_signature, verify_signature};
