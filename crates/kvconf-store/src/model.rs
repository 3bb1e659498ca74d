// Consul KV wire models

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::backend::KvEntry;
use crate::error::{StoreError, StoreResult};

/// Consul KV Pair as returned by `GET /v1/kv/{key}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KVPair {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,

    #[serde(rename = "LockIndex", default)]
    pub lock_index: u64,

    #[serde(rename = "Flags", default)]
    pub flags: u64,

    /// Base64 encoded; Consul reports `null` for an empty value
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KVPair {
    /// Create a KV pair with encoded value, as a Consul agent would report it
    pub fn new(key: impl Into<String>, value: &[u8], modify_index: u64) -> Self {
        Self {
            key: key.into(),
            create_index: modify_index,
            modify_index,
            lock_index: 0,
            flags: 0,
            value: if value.is_empty() {
                None
            } else {
                Some(BASE64.encode(value))
            },
            session: None,
        }
    }

    /// Decode the base64 value. An absent value decodes to empty bytes.
    pub fn decoded_value(&self) -> StoreResult<Bytes> {
        match &self.value {
            None => Ok(Bytes::new()),
            Some(encoded) => BASE64
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| StoreError::Decode(format!("key '{}': {}", self.key, e))),
        }
    }

    pub fn into_entry(self) -> StoreResult<KvEntry> {
        let value = self.decoded_value()?;
        Ok(KvEntry::new(self.key, value, self.modify_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_pair_serialization() {
        let pair = KVPair::new("configs/abc/v1", b"hello", 42);
        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"Key\":\"configs/abc/v1\""));
        assert!(json.contains("\"ModifyIndex\":42"));
        assert!(json.contains("\"Value\":\"aGVsbG8=\""));
        assert!(!json.contains("Session"));
    }

    #[test]
    fn test_kv_pair_null_value_decodes_empty() {
        let json = r#"{"Key":"token-1","CreateIndex":7,"ModifyIndex":7,"LockIndex":0,"Flags":0,"Value":null}"#;
        let pair: KVPair = serde_json::from_str(json).unwrap();
        let entry = pair.into_entry().unwrap();
        assert_eq!(entry.key, "token-1");
        assert!(entry.value.is_empty());
        assert_eq!(entry.modify_index, 7);
    }

    #[test]
    fn test_kv_pair_invalid_base64() {
        let pair = KVPair {
            key: "k".to_string(),
            create_index: 1,
            modify_index: 1,
            lock_index: 0,
            flags: 0,
            value: Some("not base64!!".to_string()),
            session: None,
        };
        assert!(matches!(pair.decoded_value(), Err(StoreError::Decode(_))));
    }
}
