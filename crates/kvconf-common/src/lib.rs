//! kvconf Common - Shared error types, error codes and constants
//!
//! This crate provides the foundational types used across all kvconf crates:
//! - `KvconfError`: the error taxonomy returned by the core
//! - `ErrorCode`: stable numeric codes for API responses
//! - Common constants (header names, key-space roots)

pub mod error;

// Re-exports for convenience
pub use error::{ErrorCode, KvconfError, Result};

/// Request header carrying the client idempotency token
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Key-space root of all configurations
pub const CONFIGS_ROOT: &str = "configs";

/// Key-space root of all groups
pub const GROUPS_ROOT: &str = "groups";

/// Path separator used inside backend keys
pub const KEY_SEPARATOR: char = '/';
