//! Session errors

use freetag_core::StorageError;
use thiserror::Error;

/// Errors from session lookups and token storage
///
/// Probe errors never escape resolution: a failing probe only means its
/// role does not apply.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session lookup transport error: {0}")]
    Transport(String),

    #[error("Invalid session payload from {endpoint}: {reason}")]
    InvalidPayload { endpoint: String, reason: String },

    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
