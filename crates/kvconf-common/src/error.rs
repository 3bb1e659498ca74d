//! Error types and error codes for kvconf
//!
//! This module defines:
//! - `KvconfError`: the error taxonomy shared by the store, core and server crates
//! - `ErrorCode`: structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Result alias used by every repository and ledger operation
pub type Result<T> = std::result::Result<T, KvconfError>;

/// Application-specific error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KvconfError {
    /// Malformed input detected at the boundary
    #[error("caused: {0}")]
    Validation(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No entity at the requested coordinates
    #[error("{0}")]
    NotFound(String),

    /// Duplicate idempotency token, or a group write that kept losing its CAS race
    #[error("{0}")]
    Conflict(String),

    /// Any failure communicating with the key-value backend
    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The operation deadline expired or the request was cancelled
    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl KvconfError {
    pub fn not_found(what: impl Into<String>) -> Self {
        KvconfError::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        KvconfError::Validation(message.into())
    }

    pub fn backend(message: impl std::fmt::Display) -> Self {
        KvconfError::Backend(message.to_string())
    }

    /// Stable error code reported to API callers
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            KvconfError::Validation(_) => PARAMETER_VALIDATE_ERROR,
            KvconfError::UnsupportedMediaType(_) => MEDIA_TYPE_ERROR,
            KvconfError::NotFound(_) => RESOURCE_NOT_FOUND,
            KvconfError::Conflict(_) => RESOURCE_CONFLICT,
            KvconfError::Backend(_) => DATA_ACCESS_ERROR,
            KvconfError::Serialization(_) => PARSING_DATA_FAILED,
            KvconfError::Cancelled(_) => REQUEST_CANCELLED,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvconfError::NotFound(_))
    }
}

impl From<serde_json::Error> for KvconfError {
    fn from(value: serde_json::Error) -> Self {
        KvconfError::Serialization(value.to_string())
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const MEDIA_TYPE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20003,
    message: "MediaType Error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const REQUEST_CANCELLED: ErrorCode<'static> = ErrorCode {
    code: 20006,
    message: "request cancelled",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const PARSING_DATA_FAILED: ErrorCode<'static> = ErrorCode {
    code: 100004,
    message: "Failed to parse data",
};
