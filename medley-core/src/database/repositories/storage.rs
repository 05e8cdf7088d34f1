use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use medley_model::{
    MediaFile, MediaFileId, NewMediaFile, NewStorageRecord, StorageId,
    StorageRecord,
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::storage::{EngineRegistry, StorageEngine};

const STORAGE_COLUMNS: &str =
    "id, engine_type, display_name, data, is_primary, created_on, modified_on";

const FILE_COLUMNS: &str =
    "id, storage_id, unique_id, filename, size, created_on, modified_on";

/// Repository for the storage engine catalog and the media files it owns.
#[derive(Debug, Clone)]
pub struct StorageRepository {
    pool: PgPool,
}

impl StorageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new storage row. `display_name` uniqueness is enforced by
    /// the database constraint.
    pub async fn insert(&self, new: NewStorageRecord) -> Result<StorageRecord> {
        let record = sqlx::query_as::<_, StorageRecord>(&format!(
            r#"
            INSERT INTO storage (id, engine_type, display_name, data, is_primary, created_on, modified_on)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {STORAGE_COLUMNS}
            "#,
        ))
        .bind(StorageId::new())
        .bind(&new.engine_type)
        .bind(&new.display_name)
        .bind(&new.data)
        .bind(new.is_primary)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.constraint() == Some("storage_display_name_key") =>
            {
                StoreError::DuplicateDisplayName(new.display_name.clone())
            }
            _ => StoreError::Internal(format!(
                "Failed to insert storage row: {e}"
            )),
        })?;

        debug!(
            id = %record.id,
            engine_type = %record.engine_type,
            "inserted storage row"
        );
        Ok(record)
    }

    /// All engines in descending fallback priority: the non-primary tier
    /// first, most-recently-created first within each tier. Callers may
    /// treat the final items as the authoritative/default tier.
    pub async fn fetch_engines(
        &self,
        registry: &EngineRegistry,
    ) -> Result<Vec<Box<dyn StorageEngine>>> {
        let rows = sqlx::query_as::<_, StorageRecord>(&format!(
            r#"
            SELECT {STORAGE_COLUMNS}
            FROM storage
            ORDER BY is_primary ASC, created_on DESC
            "#,
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to fetch engines: {e}"))
        })?;

        rows.into_iter().map(|row| registry.hydrate(row)).collect()
    }

    pub async fn fetch_by_id(
        &self,
        id: StorageId,
    ) -> Result<Option<StorageRecord>> {
        sqlx::query_as::<_, StorageRecord>(&format!(
            "SELECT {STORAGE_COLUMNS} FROM storage WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to fetch storage row: {e}"))
        })
    }

    /// Fetch and hydrate a single engine.
    pub async fn engine_by_id(
        &self,
        registry: &EngineRegistry,
        id: StorageId,
    ) -> Result<Option<Box<dyn StorageEngine>>> {
        match self.fetch_by_id(id).await? {
            Some(record) => Ok(Some(registry.hydrate(record)?)),
            None => Ok(None),
        }
    }

    /// Replace the engine configuration payload, bumping `modified_on`.
    pub async fn update_data(
        &self,
        id: StorageId,
        data: Value,
    ) -> Result<StorageRecord> {
        sqlx::query_as::<_, StorageRecord>(&format!(
            r#"
            UPDATE storage
            SET data = $2, modified_on = NOW()
            WHERE id = $1
            RETURNING {STORAGE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to update storage row: {e}"))
        })?
        .ok_or_else(|| StoreError::NotFound(format!("storage row {id}")))
    }

    /// Flip the primary flag, bumping `modified_on`.
    pub async fn set_primary(
        &self,
        id: StorageId,
        is_primary: bool,
    ) -> Result<StorageRecord> {
        sqlx::query_as::<_, StorageRecord>(&format!(
            r#"
            UPDATE storage
            SET is_primary = $2, modified_on = NOW()
            WHERE id = $1
            RETURNING {STORAGE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(is_primary)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to update storage row: {e}"))
        })?
        .ok_or_else(|| StoreError::NotFound(format!("storage row {id}")))
    }

    /// Delete a storage row; the database cascades to its media files.
    pub async fn delete(&self, id: StorageId) -> Result<()> {
        let result = sqlx::query("DELETE FROM storage WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                StoreError::Internal(format!(
                    "Failed to delete storage row: {e}"
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("storage row {id}")));
        }
        Ok(())
    }

    pub async fn add_file(&self, new: NewMediaFile) -> Result<MediaFile> {
        sqlx::query_as::<_, MediaFile>(&format!(
            r#"
            INSERT INTO media_files (id, storage_id, unique_id, filename, size, created_on, modified_on)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(MediaFileId::new())
        .bind(new.storage_id)
        .bind(&new.unique_id)
        .bind(&new.filename)
        .bind(new.size)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to insert media file: {e}"))
        })
    }

    /// The files owned by a storage row, oldest first.
    pub async fn files(&self, id: StorageId) -> Result<Vec<MediaFile>> {
        sqlx::query_as::<_, MediaFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM media_files
            WHERE storage_id = $1
            ORDER BY created_on ASC
            "#,
        ))
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to fetch media files: {e}"))
        })
    }

    /// Lazily streamed variant of [`StorageRepository::files`]. Rows are
    /// pulled from the database as the stream is polled.
    pub fn files_stream(
        &self,
        id: StorageId,
    ) -> BoxStream<'_, Result<MediaFile>> {
        sqlx::query_as::<_, MediaFile>(
            r#"
            SELECT id, storage_id, unique_id, filename, size, created_on, modified_on
            FROM media_files
            WHERE storage_id = $1
            ORDER BY created_on ASC
            "#,
        )
        .bind(id)
        .fetch(self.pool())
        .map_err(|e| {
            StoreError::Internal(format!("Failed to stream media files: {e}"))
        })
        .boxed()
    }
}
