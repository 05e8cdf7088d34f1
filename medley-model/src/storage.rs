use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::ids::StorageId;

/// Persisted state shared by every storage engine.
///
/// One row per configured engine, all engine kinds in a single `storage`
/// table discriminated by `engine_type`. The `data` payload is opaque to the
/// persistence layer; only the concrete engine registered for `engine_type`
/// knows how to decode it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StorageRecord {
    pub id: StorageId,
    /// Discriminator naming the registered engine kind this row belongs to.
    pub engine_type: String,
    /// Unique across all engines regardless of kind.
    pub display_name: String,
    /// Opaque engine configuration, decoded by the concrete engine.
    pub data: Value,
    pub is_primary: bool,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl StorageRecord {
    /// Decode the configuration payload into an engine-specific type.
    pub fn decode_data<T: serde::de::DeserializeOwned>(
        &self,
    ) -> crate::error::Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Insert payload for a new storage row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewStorageRecord {
    pub engine_type: String,
    pub display_name: String,
    pub data: Value,
    pub is_primary: bool,
}

impl NewStorageRecord {
    pub fn new(
        engine_type: impl Into<String>,
        display_name: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            engine_type: engine_type.into(),
            display_name: display_name.into(),
            data,
            is_primary: false,
        }
    }

    /// Mark this engine as the primary one.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_data_roundtrip() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Cfg {
            path: String,
        }

        let record = StorageRecord {
            id: StorageId::new(),
            engine_type: "local_file".into(),
            display_name: "Local".into(),
            data: json!({ "path": "/srv/media" }),
            is_primary: false,
            created_on: Utc::now(),
            modified_on: Utc::now(),
        };

        let cfg: Cfg = record.decode_data().unwrap();
        assert_eq!(cfg.path, "/srv/media");
    }

    #[test]
    fn decode_data_rejects_mismatched_payload() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Cfg {
            path: String,
        }

        let record = StorageRecord {
            id: StorageId::new(),
            engine_type: "local_file".into(),
            display_name: "Local".into(),
            data: json!({ "wrong": true }),
            is_primary: false,
            created_on: Utc::now(),
            modified_on: Utc::now(),
        };

        assert!(record.decode_data::<Cfg>().is_err());
    }

    #[test]
    fn new_record_defaults_to_non_primary() {
        let new = NewStorageRecord::new("local_file", "Local", json!({}));
        assert!(!new.is_primary);
        assert!(new.clone().primary().is_primary);
    }
}
