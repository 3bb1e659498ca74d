//! kvconf Store - Prefix-ordered key-value backends
//!
//! This crate provides:
//! - The [`KvBackend`] trait: the minimal contract the repositories need
//!   (put, get, prefix list, subtree delete, per-key compare-and-set)
//! - [`MemoryKvBackend`]: an in-process ordered store for standalone mode and tests
//! - [`ConsulKvBackend`]: a Consul KV HTTP client

pub mod backend;
pub mod consul;
pub mod error;
pub mod memory;
pub mod model;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use backend::{KvBackend, KvEntry};
pub use consul::{ConsulKvBackend, ConsulKvConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryKvBackend;
pub use model::KVPair;
