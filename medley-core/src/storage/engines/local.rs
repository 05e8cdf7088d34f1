use std::any::Any;
use std::path::{Path, PathBuf};

use medley_model::{MediaFile, StorageRecord};
use url::Url;

use crate::error::Result;
use crate::storage::StorageEngine;
use crate::storage::registry::engines_builtin;

/// Configuration payload for [`LocalFileStorage`], decoded from the row's
/// JSONB `data` column.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocalFileConfig {
    /// Directory media files live under.
    pub path: PathBuf,
    /// Public base URL files are served from, when one exists.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Stores media files on a locally mounted filesystem.
#[derive(Debug)]
pub struct LocalFileStorage {
    record: StorageRecord,
    config: LocalFileConfig,
}

impl LocalFileStorage {
    /// Factory registered under the `local_file` tag.
    pub fn from_record(
        record: StorageRecord,
    ) -> Result<Box<dyn StorageEngine>> {
        let config = record.decode_data()?;
        Ok(Box::new(Self { record, config }))
    }

    pub fn config(&self) -> &LocalFileConfig {
        &self.config
    }

    /// Absolute path of a file under this engine's directory.
    pub fn file_path(&self, file: &MediaFile) -> PathBuf {
        let name = file.unique_id.as_deref().unwrap_or(&file.filename);
        self.config.path.join(Path::new(name))
    }
}

impl StorageEngine for LocalFileStorage {
    fn engine_type(&self) -> &'static str {
        engines_builtin::LOCAL_FILE
    }

    fn record(&self) -> &StorageRecord {
        &self.record
    }

    fn file_url(&self, file: &MediaFile) -> Option<Url> {
        let base = Url::parse(self.config.base_url.as_deref()?).ok()?;
        let name = file.unique_id.as_deref().unwrap_or(&file.filename);
        base.join(name).ok()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use medley_model::{MediaFileId, NewMediaFile, StorageId};
    use serde_json::json;

    fn record(data: serde_json::Value) -> StorageRecord {
        StorageRecord {
            id: StorageId::new(),
            engine_type: "local_file".into(),
            display_name: "Local".into(),
            data,
            is_primary: false,
            created_on: Utc::now(),
            modified_on: Utc::now(),
        }
    }

    fn file(storage_id: StorageId, new: NewMediaFile) -> MediaFile {
        MediaFile {
            id: MediaFileId::new(),
            storage_id,
            unique_id: new.unique_id,
            filename: new.filename,
            size: new.size,
            created_on: Utc::now(),
            modified_on: Utc::now(),
        }
    }

    #[test]
    fn hydrates_from_json_config() {
        let engine = LocalFileStorage::from_record(record(json!({
            "path": "/srv/media",
            "base_url": "https://cdn.example.com/media/",
        })))
        .unwrap();
        assert_eq!(engine.engine_type(), "local_file");
        assert_eq!(engine.display_name(), "Local");
    }

    #[test]
    fn rejects_config_without_path() {
        assert!(LocalFileStorage::from_record(record(json!({}))).is_err());
    }

    #[test]
    fn file_path_prefers_unique_id() {
        let record = record(json!({ "path": "/srv/media" }));
        let storage_id = record.id;
        let engine = LocalFileStorage::from_record(record).unwrap();
        let local = engine
            .as_any()
            .downcast_ref::<LocalFileStorage>()
            .unwrap();

        let plain = file(storage_id, NewMediaFile::new(storage_id, "a.mkv", 1));
        assert_eq!(local.file_path(&plain), PathBuf::from("/srv/media/a.mkv"));

        let keyed = file(
            storage_id,
            NewMediaFile::new(storage_id, "a.mkv", 1).unique_id("ab/cd.mkv"),
        );
        assert_eq!(
            local.file_path(&keyed),
            PathBuf::from("/srv/media/ab/cd.mkv")
        );
    }

    #[test]
    fn file_url_requires_base_url() {
        let record = record(json!({ "path": "/srv/media" }));
        let storage_id = record.id;
        let engine = LocalFileStorage::from_record(record).unwrap();
        let media = file(storage_id, NewMediaFile::new(storage_id, "a.mkv", 1));
        assert!(engine.file_url(&media).is_none());

        let record = self::record(json!({
            "path": "/srv/media",
            "base_url": "https://cdn.example.com/media/",
        }));
        let engine = LocalFileStorage::from_record(record).unwrap();
        assert_eq!(
            engine.file_url(&media).unwrap().as_str(),
            "https://cdn.example.com/media/a.mkv"
        );
    }
}
