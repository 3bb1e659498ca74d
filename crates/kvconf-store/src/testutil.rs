//! Test helpers for code built on top of [`KvBackend`].
//!
//! Feature-gated behind `testutil`. Downstream crates enable it in their
//! dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! kvconf-store = { workspace = true, features = ["testutil"] }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::backend::{KvBackend, KvEntry};
use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryKvBackend;

/// Operation kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Put,
    Get,
    List,
    /// Covers both single-key and subtree deletes
    DeleteTree,
    CompareAndSet,
}

/// Wraps a [`MemoryKvBackend`] and injects failures, latency and lost CAS races.
#[derive(Default)]
pub struct FaultInjectingBackend {
    inner: MemoryKvBackend,
    fail_put: AtomicBool,
    fail_get: AtomicBool,
    fail_list: AtomicBool,
    fail_delete_tree: AtomicBool,
    fail_cas: AtomicBool,
    /// Number of upcoming cas calls that report a lost race
    cas_conflicts: AtomicU32,
    /// Latency added to every call, in milliseconds
    delay_ms: AtomicU64,
}

impl FaultInjectingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the wrapped store, for seeding and inspection
    pub fn inner(&self) -> &MemoryKvBackend {
        &self.inner
    }

    pub fn set_failing(&self, op: FaultOp, failing: bool) {
        let flag = match op {
            FaultOp::Put => &self.fail_put,
            FaultOp::Get => &self.fail_get,
            FaultOp::List => &self.fail_list,
            FaultOp::DeleteTree => &self.fail_delete_tree,
            FaultOp::CompareAndSet => &self.fail_cas,
        };
        flag.store(failing, Ordering::SeqCst);
    }

    /// Make the next `count` compare-and-set calls return `false` without writing
    pub fn lose_next_cas(&self, count: u32) {
        self.cas_conflicts.store(count, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn enter(&self, flag: &AtomicBool, op: &str) -> StoreResult<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(format!("injected {} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for FaultInjectingBackend {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.enter(&self.fail_put, "put").await?;
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        self.enter(&self.fail_get, "get").await?;
        self.inner.get(key).await
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<KvEntry>> {
        self.enter(&self.fail_list, "list").await?;
        self.inner.list(prefix).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.enter(&self.fail_delete_tree, "delete").await?;
        self.inner.delete(key).await
    }

    async fn delete_tree(&self, prefix: &str) -> StoreResult<u64> {
        self.enter(&self.fail_delete_tree, "delete_tree").await?;
        self.inner.delete_tree(prefix).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        value: Bytes,
        modify_index: u64,
    ) -> StoreResult<bool> {
        self.enter(&self.fail_cas, "compare_and_set").await?;
        let lost = self
            .cas_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Ok(false);
        }
        self.inner.compare_and_set(key, value, modify_index).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.enter(&self.fail_get, "health_check").await
    }

    fn name(&self) -> &'static str {
        "fault-injecting"
    }
}
