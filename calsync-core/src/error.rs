//! Error types for calsync.

use thiserror::Error;

/// Errors raised by local infrastructure: the cache, configuration and recurrence rules.
///
/// Remote failures are not represented here; see [`crate::failure`].
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
