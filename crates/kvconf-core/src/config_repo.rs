//! Configuration repository.
//!
//! Configurations are immutable. Every create writes a new entity under
//! `configs/{id}/{version}[/{label}]`; reads are prefix scans filtered on the
//! coordinates stored in each payload.

use std::sync::Arc;

use kvconf_common::{CONFIGS_ROOT, KvconfError, Result};
use kvconf_store::KvBackend;
use tracing::{debug, info};

use crate::context::OpContext;
use crate::key::{config_id_prefix, encode_config_key, new_id, validate_segment};
use crate::model::{Configuration, DeleteSummary, encode};
use crate::scan;

pub const CONFIG_NOT_FOUND: &str = "config not found";

#[derive(Clone)]
pub struct ConfigRepository {
    backend: Arc<dyn KvBackend>,
}

impl ConfigRepository {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Store a new configuration under a freshly generated id
    pub async fn create(&self, ctx: &OpContext, cfg: Configuration) -> Result<Configuration> {
        validate_segment("version", &cfg.version, false)?;
        validate_segment("labels", &cfg.labels, true)?;

        let cfg = Configuration { id: new_id(), ..cfg };
        let key = encode_config_key(&cfg.id, &cfg.version, &cfg.labels);
        let payload = encode(&cfg)?;

        ctx.run("put", self.backend.put(&key, payload)).await?;

        info!(id = %cfg.id, version = %cfg.version, labels = %cfg.labels, "Configuration created");
        Ok(cfg)
    }

    /// Every configuration at the given coordinates. An empty label widens
    /// the query to all labels of the id and version.
    pub async fn get_by_coordinates(
        &self,
        ctx: &OpContext,
        id: &str,
        version: &str,
        label: &str,
    ) -> Result<Vec<Configuration>> {
        validate_segment("id", id, false)?;
        validate_segment("version", version, false)?;
        validate_segment("labels", label, true)?;

        let configs = self.scan(ctx, &encode_config_key(id, version, label)).await?;
        // v1 also prefixes v10, env also prefixes env2
        Ok(configs
            .into_iter()
            .filter(|cfg| cfg.matches(id, version, label))
            .collect())
    }

    pub async fn get_one(&self, ctx: &OpContext, id: &str, version: &str) -> Result<Configuration> {
        self.get_by_coordinates(ctx, id, version, "")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KvconfError::not_found(CONFIG_NOT_FOUND))
    }

    pub async fn list_all(&self, ctx: &OpContext) -> Result<Vec<Configuration>> {
        let entries = scan::list_root(ctx, self.backend.as_ref(), CONFIGS_ROOT).await?;
        debug!(count = entries.len(), "Listed configurations");
        scan::decode_all(&entries)
    }

    /// Remove the id and version along with every label under it.
    /// Succeeds when nothing was stored there.
    pub async fn delete(&self, ctx: &OpContext, id: &str, version: &str) -> Result<DeleteSummary> {
        validate_segment("id", id, false)?;
        validate_segment("version", version, false)?;

        let key = encode_config_key(id, version, "");
        let removed = scan::delete_subtree(ctx, self.backend.as_ref(), &key).await?;
        info!(id = %id, version = %version, removed, "Configuration deleted");
        Ok(DeleteSummary::new(id))
    }

    pub async fn delete_by_label(
        &self,
        ctx: &OpContext,
        id: &str,
        version: &str,
        label: &str,
    ) -> Result<DeleteSummary> {
        validate_segment("id", id, false)?;
        validate_segment("version", version, false)?;
        validate_segment("labels", label, false)?;

        let key = encode_config_key(id, version, label);
        let removed = scan::delete_subtree(ctx, self.backend.as_ref(), &key).await?;
        info!(id = %id, version = %version, labels = %label, removed, "Configuration label deleted");
        Ok(DeleteSummary::new(id))
    }

    /// All versions and labels of an id
    pub async fn get_by_id(&self, ctx: &OpContext, id: &str) -> Result<Vec<Configuration>> {
        validate_segment("id", id, false)?;
        let configs = self.scan(ctx, &config_id_prefix(id)).await?;
        Ok(configs.into_iter().filter(|cfg| cfg.id == id).collect())
    }

    pub async fn get_one_by_id(&self, ctx: &OpContext, id: &str) -> Result<Configuration> {
        self.get_by_id(ctx, id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KvconfError::not_found(CONFIG_NOT_FOUND))
    }

    async fn scan(&self, ctx: &OpContext, prefix: &str) -> Result<Vec<Configuration>> {
        let entries = scan::list(ctx, self.backend.as_ref(), prefix).await?;
        debug!(prefix = %prefix, count = entries.len(), "Scanned configurations");
        scan::decode_all(&entries)
    }
}
