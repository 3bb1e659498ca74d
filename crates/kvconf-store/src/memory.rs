// In-memory key-value backend
// Ordered map with a global modify-index counter, mirroring the Consul KV semantics
// the repositories rely on (prefix scan, delete-tree, cas)

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::backend::{KvBackend, KvEntry};
use crate::error::StoreResult;

/// Stored value with its modify index
#[derive(Debug, Clone)]
struct StoredKv {
    value: Bytes,
    modify_index: u64,
}

/// In-memory key-value backend.
///
/// Clones share the same underlying data. A single write lock covers every
/// mutation, so `delete_tree` and `compare_and_set` are atomic.
#[derive(Clone)]
pub struct MemoryKvBackend {
    /// Key-value storage: key -> StoredKv, ordered for prefix scans
    store: Arc<RwLock<BTreeMap<String, StoredKv>>>,
    /// Global index counter
    index: Arc<AtomicU64>,
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(BTreeMap::new())),
            index: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Get the next index
    fn next_index(&self) -> u64 {
        self.index.fetch_add(1, Ordering::SeqCst)
    }

    /// Current index, i.e. the index the next write will receive
    pub fn current_index(&self) -> u64 {
        self.index.load(Ordering::SeqCst)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Insert or overwrite under an already-held write lock
    fn write_locked(map: &mut BTreeMap<String, StoredKv>, key: &str, value: Bytes, index: u64) {
        match map.get_mut(key) {
            Some(existing) => {
                existing.value = value;
                existing.modify_index = index;
            }
            None => {
                map.insert(
                    key.to_string(),
                    StoredKv {
                        value,
                        modify_index: index,
                    },
                );
            }
        }
    }

    fn prefix_keys(map: &BTreeMap<String, StoredKv>, prefix: &str) -> Vec<String> {
        map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl Default for MemoryKvBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvBackend for MemoryKvBackend {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        let mut map = self.store.write();
        let index = self.next_index();
        Self::write_locked(&mut map, key, value, index);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        Ok(self
            .store
            .read()
            .get(key)
            .map(|stored| KvEntry::new(key, stored.value.clone(), stored.modify_index)))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<KvEntry>> {
        let map = self.store.read();
        Ok(map
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| KvEntry::new(key.clone(), stored.value.clone(), stored.modify_index))
            .collect())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.store.write().remove(key).is_some())
    }

    async fn delete_tree(&self, prefix: &str) -> StoreResult<u64> {
        let mut map = self.store.write();
        let keys = Self::prefix_keys(&map, prefix);
        let count = keys.len() as u64;
        for key in keys {
            map.remove(&key);
        }
        Ok(count)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        value: Bytes,
        modify_index: u64,
    ) -> StoreResult<bool> {
        let mut map = self.store.write();
        let applies = match map.get(key) {
            Some(existing) => modify_index != 0 && existing.modify_index == modify_index,
            // cas=0 means create only if it doesn't exist
            None => modify_index == 0,
        };
        if applies {
            let index = self.next_index();
            Self::write_locked(&mut map, key, value, index);
        }
        Ok(applies)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
