//! Application state shared across all handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kvconf_core::{ConfigRepository, GroupRepository, IdempotencyLedger, OpContext};
use kvconf_store::{ConsulKvBackend, KvBackend, MemoryKvBackend};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use super::config::Configuration;
use super::constants::{BACKEND_CONSUL, BACKEND_MEMORY, DEFAULT_REQUEST_TIMEOUT_MS};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn KvBackend>,
    pub configs: ConfigRepository,
    pub groups: GroupRepository,
    pub ledger: IdempotencyLedger,
    /// Deadline applied to every request's backend calls
    pub request_timeout: Duration,
    /// Renders `/metrics`; absent when no recorder was installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.backend.name())
            .field("request_timeout", &self.request_timeout)
            .field("metrics_handle", &self.metrics_handle.is_some())
            .finish()
    }
}

impl AppState {
    /// Wire repositories and the ledger over a single shared backend
    pub fn from_backend(backend: Arc<dyn KvBackend>) -> Self {
        let configs = ConfigRepository::new(backend.clone());
        Self {
            groups: GroupRepository::new(backend.clone(), configs.clone()),
            ledger: IdempotencyLedger::new(backend.clone()),
            configs,
            backend,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            metrics_handle: None,
        }
    }

    pub fn from_configuration(configuration: &Configuration) -> anyhow::Result<Self> {
        let backend: Arc<dyn KvBackend> = match configuration.backend_type().as_str() {
            BACKEND_MEMORY => Arc::new(MemoryKvBackend::new()),
            BACKEND_CONSUL => {
                let consul_config = configuration.consul_config();
                info!(address = %consul_config.address, "Using Consul KV backend");
                Arc::new(
                    ConsulKvBackend::new(consul_config)
                        .context("Failed to create Consul KV backend")?,
                )
            }
            other => anyhow::bail!(
                "Unsupported backend type '{}', expected '{}' or '{}'",
                other,
                BACKEND_MEMORY,
                BACKEND_CONSUL
            ),
        };

        let configs = ConfigRepository::new(backend.clone());
        Ok(Self {
            groups: GroupRepository::new(backend.clone(), configs.clone())
                .with_cas_max_retries(configuration.cas_max_retries()),
            ledger: IdempotencyLedger::new(backend.clone())
                .with_ttl(configuration.ledger_ttl())
                .with_fail_open(configuration.ledger_fail_open()),
            configs,
            backend,
            request_timeout: configuration.request_timeout(),
            metrics_handle: None,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn with_ledger(mut self, ledger: IdempotencyLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// A fresh per-request deadline
    pub fn op_context(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }
}
