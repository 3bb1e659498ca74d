//! Storage error types and result alias.
//!
//! Backends map their internal failures onto [`StoreError`]; the core converts
//! them into [`KvconfError`] at the repository boundary.

use kvconf_common::KvconfError;
use thiserror::Error;

/// Result type alias for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or connection-level failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend did not answer in time.
    #[error("backend timeout: {0}")]
    Timeout(String),

    /// The backend answered with a status the client does not understand.
    #[error("unexpected backend status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A backend payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Backend-specific internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            StoreError::Timeout(value.to_string())
        } else if value.is_decode() {
            StoreError::Decode(value.to_string())
        } else {
            StoreError::Connection(value.to_string())
        }
    }
}

impl From<StoreError> for KvconfError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Timeout(message) => KvconfError::Cancelled(message),
            other => KvconfError::Backend(other.to_string()),
        }
    }
}
