//! Error types for store operations.

use std::time::Duration;

/// Errors surfaced by a [`KeyValueStore`](crate::KeyValueStore).
///
/// None of these mean "key not found"; absence is always reported as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured deadline.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// A stored value could not be decoded.
    #[error("corrupt store value: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}
