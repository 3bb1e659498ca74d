//! Key codec.
//!
//! Entity coordinates are encoded into one flat backend key so that prefix
//! scans can stand in for queries by id, id+version and id+version+label:
//!
//! ```text
//! configs/{id}/{version}          unlabeled configuration
//! configs/{id}/{version}/{label}  labeled configuration
//! groups/{id}/{version}           group
//! ```
//!
//! Nothing is decoded from keys. Coordinates travel inside the stored payload.

use kvconf_common::{CONFIGS_ROOT, GROUPS_ROOT, KEY_SEPARATOR, KvconfError, Result};
use uuid::Uuid;

/// Key of a configuration. An empty label adds no trailing segment, so the
/// unlabeled key is a prefix of every labeled key for the same id and version.
pub fn encode_config_key(id: &str, version: &str, label: &str) -> String {
    if label.is_empty() {
        format!("{CONFIGS_ROOT}/{id}/{version}")
    } else {
        format!("{CONFIGS_ROOT}/{id}/{version}/{label}")
    }
}

pub fn encode_group_key(id: &str, version: &str) -> String {
    format!("{GROUPS_ROOT}/{id}/{version}")
}

/// Prefix of every version and label of a configuration id
pub fn config_id_prefix(id: &str) -> String {
    format!("{CONFIGS_ROOT}/{id}/")
}

/// Prefix of every version of a group id
pub fn group_id_prefix(id: &str) -> String {
    format!("{GROUPS_ROOT}/{id}/")
}

/// Fresh random (v4) entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reject coordinate segments that would change the key's depth.
pub fn validate_segment(name: &str, value: &str, allow_empty: bool) -> Result<()> {
    if value.is_empty() && !allow_empty {
        return Err(KvconfError::validation(format!("{} must not be empty", name)));
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(KvconfError::validation(format!(
            "{} must not contain '{}'",
            name, KEY_SEPARATOR
        )));
    }
    Ok(())
}
