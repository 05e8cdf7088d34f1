use std::any::Any;

use medley_model::{MediaFile, StorageRecord};
use url::Url;

use crate::error::Result;
use crate::storage::StorageEngine;
use crate::storage::registry::engines_builtin;

/// Configuration payload for [`RemoteUrlStorage`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RemoteUrlConfig {
    /// URL prefixes files are reachable under, in preference order.
    pub prefixes: Vec<String>,
}

/// Serves media files hosted elsewhere; stores nothing locally.
///
/// The file's `unique_id` is the path fragment appended to a configured
/// prefix.
#[derive(Debug)]
pub struct RemoteUrlStorage {
    record: StorageRecord,
    config: RemoteUrlConfig,
}

impl RemoteUrlStorage {
    /// Factory registered under the `remote_url` tag.
    pub fn from_record(
        record: StorageRecord,
    ) -> Result<Box<dyn StorageEngine>> {
        let config = record.decode_data()?;
        Ok(Box::new(Self { record, config }))
    }

    pub fn config(&self) -> &RemoteUrlConfig {
        &self.config
    }
}

impl StorageEngine for RemoteUrlStorage {
    fn engine_type(&self) -> &'static str {
        engines_builtin::REMOTE_URL
    }

    fn record(&self) -> &StorageRecord {
        &self.record
    }

    fn file_url(&self, file: &MediaFile) -> Option<Url> {
        let fragment = file.unique_id.as_deref()?;
        for prefix in &self.config.prefixes {
            if let Ok(base) = Url::parse(prefix)
                && let Ok(url) = base.join(fragment)
            {
                return Some(url);
            }
        }
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
