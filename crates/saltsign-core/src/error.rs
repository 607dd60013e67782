//! Error types for the SaltSign core.

/// Core error type for SaltSign infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum SaltSignError {
    /// An opaque identifier did not have the expected shape.
    #[error("invalid identifier: {0} (must be a non-empty hex string)")]
    InvalidIdentifier(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
