use chrono::{DateTime, Utc};

use crate::ids::{MediaFileId, StorageId};

/// A media file owned by a storage engine row.
///
/// Deleting the owning `storage` row removes its files at the database
/// level; callers never cascade by hand.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaFile {
    pub id: MediaFileId,
    pub storage_id: StorageId,
    /// Engine-scoped opaque key, e.g. a path fragment or remote object id.
    pub unique_id: Option<String>,
    pub filename: String,
    pub size: i64,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

/// Insert payload for a new media file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewMediaFile {
    pub storage_id: StorageId,
    pub unique_id: Option<String>,
    pub filename: String,
    pub size: i64,
}

impl NewMediaFile {
    pub fn new(
        storage_id: StorageId,
        filename: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            storage_id,
            unique_id: None,
            filename: filename.into(),
            size,
        }
    }

    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }
}
