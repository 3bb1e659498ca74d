//! Request bodies accepted by the create endpoints

use std::collections::BTreeMap;

use kvconf_core::{Configuration, Group};
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /config`. A client-supplied `id` is accepted and ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateConfigRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
    pub version: String,
    #[serde(default)]
    pub labels: String,
}

impl From<CreateConfigRequest> for Configuration {
    fn from(value: CreateConfigRequest) -> Self {
        Configuration {
            id: String::new(),
            entries: value.entries,
            version: value.version,
            labels: value.labels,
        }
    }
}

/// Body of `POST /group`. Embedded configs are stored as sent.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub configs: Vec<Configuration>,
    pub version: String,
    #[serde(default)]
    pub labels: String,
}

impl From<CreateGroupRequest> for Group {
    fn from(value: CreateGroupRequest) -> Self {
        Group {
            id: String::new(),
            configs: value.configs,
            version: value.version,
            labels: value.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_request_ignores_id() {
        let request: CreateConfigRequest = serde_json::from_str(
            r#"{"id":"client","entries":{"a":"1"},"version":"v1","labels":"env:prod"}"#,
        )
        .unwrap();
        let cfg = Configuration::from(request);
        assert!(cfg.id.is_empty());
        assert_eq!(cfg.entries.get("a").map(String::as_str), Some("1"));
        assert_eq!(cfg.labels, "env:prod");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_json::from_str::<CreateConfigRequest>(r#"{"version":"v1","extra":1}"#);
        assert!(result.is_err());
        let result = serde_json::from_str::<CreateGroupRequest>(r#"{"version":"v1","owner":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_required() {
        assert!(serde_json::from_str::<CreateGroupRequest>(r#"{"labels":""}"#).is_err());
    }
}
