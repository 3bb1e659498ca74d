// Prefix helpers shared by the repositories

use kvconf_common::Result;
use kvconf_store::{KvBackend, KvEntry};
use serde::de::DeserializeOwned;

use crate::context::OpContext;
use crate::model::decode;

/// Whether `candidate` is `key` itself or sits below it
pub(crate) fn within(key: &str, candidate: &str) -> bool {
    candidate
        .strip_prefix(key)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub(crate) async fn list(
    ctx: &OpContext,
    backend: &dyn KvBackend,
    prefix: &str,
) -> Result<Vec<KvEntry>> {
    ctx.run("list", backend.list(prefix)).await
}

/// List the entities stored under an entity root such as `configs`.
///
/// The root is scanned as a bare prefix, so idempotency tokens that merely
/// start with the root name (`configs-retry-1`) come back too; only keys
/// strictly below `{root}/` are kept.
pub(crate) async fn list_root(
    ctx: &OpContext,
    backend: &dyn KvBackend,
    root: &str,
) -> Result<Vec<KvEntry>> {
    let mut entries = list(ctx, backend, root).await?;
    entries.retain(|entry| within(root, &entry.key) && entry.key != root);
    Ok(entries)
}

pub(crate) fn decode_all<T: DeserializeOwned>(entries: &[KvEntry]) -> Result<Vec<T>> {
    entries.iter().map(|entry| decode(&entry.value)).collect()
}

/// Remove `key` and everything below it.
///
/// A plain subtree delete on `configs/x/v1` would also remove `configs/x/v10`,
/// so the exact key and the `/`-terminated subtree are removed separately.
/// The two steps are not atomic together; a reader in between may see the
/// labeled entries without the unlabeled one.
pub(crate) async fn delete_subtree(
    ctx: &OpContext,
    backend: &dyn KvBackend,
    key: &str,
) -> Result<u64> {
    let mut removed = 0;
    if ctx.run("delete", backend.delete(key)).await? {
        removed += 1;
    }
    let subtree = format!("{key}/");
    removed += ctx.run("delete_tree", backend.delete_tree(&subtree)).await?;
    Ok(removed)
}
