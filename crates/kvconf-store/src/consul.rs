//! Consul KV backend
//!
//! Talks to a Consul agent over its HTTP KV API:
//! - `GET /v1/kv/{key}` and `GET /v1/kv/{prefix}?recurse=true`
//! - `PUT /v1/kv/{key}` with an optional `?cas={index}`
//! - `DELETE /v1/kv/{key}` and `DELETE /v1/kv/{prefix}?recurse=true`
//! - `GET /v1/status/leader` for health checks

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::backend::{KvBackend, KvEntry};
use crate::error::{StoreError, StoreResult};
use crate::model::KVPair;

const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";

/// Connection settings for [`ConsulKvBackend`]
#[derive(Clone, Debug)]
pub struct ConsulKvConfig {
    /// Agent base address, e.g. `http://127.0.0.1:8500`
    pub address: String,
    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConsulKvConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8500".to_string(),
            token: None,
            timeout_ms: 5000,
        }
    }
}

impl ConsulKvConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Consul KV HTTP client implementing [`KvBackend`]
#[derive(Clone)]
pub struct ConsulKvBackend {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ConsulKvBackend {
    pub fn new(config: ConsulKvConfig) -> StoreResult<Self> {
        let base = Url::parse(&config.address).map_err(|e| {
            StoreError::internal(format!("invalid consul address '{}': {}", config.address, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(StoreError::internal(format!(
                "consul address '{}' cannot be used as a base URL",
                config.address
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base,
            token: config.token,
        })
    }

    /// Build `{base}/v1/kv/{key}` with each key segment percent-encoded
    fn kv_url(&self, key: &str) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::internal("consul base URL has no path"))?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(key.split('/'));
        Ok(url)
    }

    fn status_url(&self) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::internal("consul base URL has no path"))?
            .pop_if_empty()
            .extend(["v1", "status", "leader"]);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(CONSUL_TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn unexpected(response: Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::UnexpectedStatus { status, body }
    }

    /// Fetch pairs at `url`; 404 means nothing is stored there
    async fn fetch_pairs(&self, url: Url) -> StoreResult<Vec<KVPair>> {
        let response = self.request(Method::GET, url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => Ok(response.json::<Vec<KVPair>>().await?),
            _ => Err(Self::unexpected(response).await),
        }
    }

    /// Consul answers writes with a bare `true` or `false`
    async fn write(&self, url: Url, value: Bytes) -> StoreResult<bool> {
        let response = self.request(Method::PUT, url).body(value).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        let body = response.text().await?;
        Ok(body.trim() == "true")
    }
}

#[async_trait]
impl KvBackend for ConsulKvBackend {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        let url = self.kv_url(key)?;
        if !self.write(url, value).await? {
            return Err(StoreError::internal(format!(
                "consul rejected write of '{}'",
                key
            )));
        }
        debug!(key = %key, "Consul KV put");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        let url = self.kv_url(key)?;
        let pairs = self.fetch_pairs(url).await?;
        // A plain GET returns at most one element, for the exact key
        pairs
            .into_iter()
            .find(|pair| pair.key == key)
            .map(KVPair::into_entry)
            .transpose()
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<KvEntry>> {
        let mut url = self.kv_url(prefix)?;
        url.query_pairs_mut().append_pair("recurse", "true");
        let mut entries = self
            .fetch_pairs(url)
            .await?
            .into_iter()
            .map(KVPair::into_entry)
            .collect::<StoreResult<Vec<_>>>()?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let url = self.kv_url(key)?;
        let response = self.request(Method::DELETE, url).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        debug!(key = %key, "Consul KV delete");
        Ok(true)
    }

    async fn delete_tree(&self, prefix: &str) -> StoreResult<u64> {
        let mut url = self.kv_url(prefix)?;
        url.query_pairs_mut().append_pair("recurse", "true");
        let response = self.request(Method::DELETE, url).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        debug!(prefix = %prefix, "Consul KV delete tree");
        // Consul does not report how many keys were removed
        Ok(0)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        value: Bytes,
        modify_index: u64,
    ) -> StoreResult<bool> {
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut()
            .append_pair("cas", &modify_index.to_string());
        let applied = self.write(url, value).await?;
        if !applied {
            debug!(key = %key, modify_index, "Consul KV cas rejected");
        }
        Ok(applied)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let url = self.status_url()?;
        let response = self.request(Method::GET, url).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        let leader = response.text().await?;
        if leader.trim().trim_matches('"').is_empty() {
            warn!("Consul agent reports no cluster leader");
            return Err(StoreError::Connection("no cluster leader".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "consul"
    }
}
