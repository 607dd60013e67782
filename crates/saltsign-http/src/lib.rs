//! HTTP service layer for SaltSign.
//!
//! This crate exposes the authentication core as a small JSON API:
//!
//! - **Router**: Exact method and path matching, `OPTIONS` preflight
//! - **Handler**: Salt issuance, signed login, session-bound query, logout
//! - **Service**: Hyper `Service` implementation with CORS and request ids
//! - **Response helpers**: JSON success/error response formatting

pub mod cookie;
pub mod error;
pub mod handler;
pub mod response;
pub mod router;
pub mod service;

pub use response::AuthResponseBody;
pub use error::HttpError;
pub use handler::AuthHandler;
pub use service::{AuthHttpConfig, AuthHttpService};
