//! Key-value backend trait definition.
//!
//! The repositories only rely on what a Consul-like store offers: single-key
//! linearizable reads and writes, lexicographically ordered prefix scans and
//! atomic subtree deletion. There are no multi-key transactions. The one
//! extension is a per-key compare-and-set on the modify index, which group
//! composition uses to detect concurrent writers.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// A single stored entry as seen by a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Bytes,
    /// Bumped on every write of this key; the precondition for [`KvBackend::compare_and_set`]
    pub modify_index: u64,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>, modify_index: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            modify_index,
        }
    }
}

/// Abstract prefix-ordered key-value backend.
///
/// Implementations must be thread-safe; a single handle is shared by every
/// repository and the idempotency ledger.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Upsert a single key.
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Read a single key. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<KvEntry>>;

    /// All entries whose key starts with `prefix`, in lexicographic key order.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<KvEntry>>;

    /// Remove a single key. Returns whether the key existed when the backend
    /// reports it (remote backends report `true`).
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Atomically remove every entry whose key starts with `prefix`.
    ///
    /// Returns the number of removed keys when the backend reports it
    /// (remote backends may report 0).
    async fn delete_tree(&self, prefix: &str) -> StoreResult<u64>;

    /// Check-and-set on the key's modify index.
    ///
    /// `modify_index == 0` means create-only: succeed only when the key is
    /// absent. Otherwise the write succeeds only if the key's current modify
    /// index equals `modify_index`. Returns whether the write was applied.
    async fn compare_and_set(&self, key: &str, value: Bytes, modify_index: u64)
    -> StoreResult<bool>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;
}
