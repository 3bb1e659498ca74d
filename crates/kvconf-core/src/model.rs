//! Entity models persisted in the backend and returned to callers.

use std::collections::BTreeMap;

use bytes::Bytes;
use kvconf_common::Result;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

/// Immutable, versioned key/value configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0b6a3f2e-2b7e-4c55-9a57-1f0f4a1c2d3e",
    "entries": {"db.url": "postgres://localhost", "pool": "8"},
    "version": "v1",
    "labels": "env:prod"
}))]
pub struct Configuration {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
    pub version: String,
    #[serde(default)]
    pub labels: String,
}

impl Configuration {
    pub fn new(version: impl Into<String>, labels: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            labels: labels.into(),
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Whether this configuration sits exactly at the given coordinates.
    /// An empty label matches every label.
    pub fn matches(&self, id: &str, version: &str, label: &str) -> bool {
        self.id == id && self.version == version && (label.is_empty() || self.labels == label)
    }
}

/// Versioned group holding embedded copies of configurations
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub configs: Vec<Configuration>,
    pub version: String,
    #[serde(default)]
    pub labels: String,
}

impl Group {
    pub fn new(version: impl Into<String>, labels: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            labels: labels.into(),
            ..Default::default()
        }
    }

    /// Remove the first member with the given id
    pub fn remove_first(&mut self, config_id: &str) -> bool {
        match self.configs.iter().position(|c| c.id == config_id) {
            Some(index) => {
                self.configs.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Result of any delete operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteSummary {
    #[serde(rename = "Deleted")]
    pub deleted: String,
}

impl DeleteSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self { deleted: id.into() }
    }
}

/// Result of detaching a configuration from a group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachOutcome {
    /// The group as persisted after the detach attempt
    pub group: Group,
    /// `false` when no member carried the requested id
    pub removed: bool,
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

pub(crate) fn decode<T: DeserializeOwned>(value: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(value)?)
}
