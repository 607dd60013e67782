//! Core configuration, error and identifier types for SaltSign.
//!
//! This crate provides the foundational building blocks shared by the
//! SaltSign store, authentication and HTTP crates: the environment-driven
//! [`SaltSignConfig`], the infrastructure error type, and the opaque
//! identifier newtypes used to key salts and sessions in the external store.

mod config;
mod error;
mod types;

pub use config::{MIN_KDF_ITERATIONS, SaltSignConfig};
pub use error::SaltSignError;
pub use types::{SaltId, SessionId};
