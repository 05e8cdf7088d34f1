use std::any::Any;
use std::time::Duration;

use anyhow::Result;
use futures::TryStreamExt;
use medley_core::database::StorageRepository;
use medley_core::storage::{LocalFileStorage, RemoteUrlStorage};
use medley_core::{EngineRegistry, StorageEngine, StoreError};
use medley_model::{MediaFile, NewMediaFile, NewStorageRecord, StorageRecord};
use serde_json::json;
use sqlx::PgPool;
use url::Url;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn local(name: &str) -> NewStorageRecord {
    NewStorageRecord::new("local_file", name, json!({ "path": "/srv/media" }))
}

fn remote(name: &str) -> NewStorageRecord {
    NewStorageRecord::new(
        "remote_url",
        name,
        json!({ "prefixes": ["https://media.example.com/v/"] }),
    )
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn engines_hydrate_as_their_registered_kind(pool: PgPool) -> Result<()> {
    init_tracing();
    let repo = StorageRepository::new(pool);
    let registry = EngineRegistry::with_builtins();

    repo.insert(local("Local")).await?;
    repo.insert(remote("Remote")).await?;

    let engines = repo.fetch_engines(&registry).await?;
    assert_eq!(engines.len(), 2);

    for engine in &engines {
        match engine.engine_type() {
            "local_file" => {
                assert!(engine.as_any().is::<LocalFileStorage>());
                assert_eq!(engine.display_name(), "Local");
            }
            "remote_url" => {
                assert!(engine.as_any().is::<RemoteUrlStorage>());
                assert_eq!(engine.display_name(), "Remote");
            }
            other => panic!("unexpected engine type {other}"),
        }
    }
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn fetch_engines_orders_non_primary_first_newest_first(
    pool: PgPool,
) -> Result<()> {
    let repo = StorageRepository::new(pool);
    let registry = EngineRegistry::with_builtins();

    // Spaced out so created_on differs between rows.
    repo.insert(local("A")).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    repo.insert(local("B")).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    repo.insert(local("C").primary()).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    repo.insert(local("D").primary()).await?;

    let engines = repo.fetch_engines(&registry).await?;
    let names: Vec<&str> =
        engines.iter().map(|e| e.display_name()).collect();

    // Non-primary tier first, newest first within each tier; the primary
    // tier lands last so callers can treat the tail as authoritative.
    assert_eq!(names, vec!["B", "A", "D", "C"]);
    assert!(!engines[0].is_primary());
    assert!(engines[3].is_primary());
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn duplicate_display_name_is_rejected(pool: PgPool) -> Result<()> {
    let repo = StorageRepository::new(pool);

    repo.insert(local("Same")).await?;
    let err = repo.insert(remote("Same")).await.unwrap_err();
    assert!(
        matches!(err, StoreError::DuplicateDisplayName(ref n) if n == "Same")
    );
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn unregistered_engine_type_fails_hydration(pool: PgPool) -> Result<()> {
    let repo = StorageRepository::new(pool);
    let registry = EngineRegistry::with_builtins();

    repo.insert(NewStorageRecord::new("ftp", "Legacy FTP", json!({})))
        .await?;

    let err = repo.fetch_engines(&registry).await.unwrap_err();
    assert!(matches!(err, StoreError::UnknownEngineType(ref t) if t == "ftp"));
    Ok(())
}

/// Minimal engine standing in for one registered by a plugin.
#[derive(Debug)]
struct FtpStorage {
    record: StorageRecord,
}

impl FtpStorage {
    fn from_record(
        record: StorageRecord,
    ) -> medley_core::Result<Box<dyn StorageEngine>> {
        Ok(Box::new(Self { record }))
    }
}

impl StorageEngine for FtpStorage {
    fn engine_type(&self) -> &'static str {
        "ftp"
    }

    fn record(&self) -> &StorageRecord {
        &self.record
    }

    fn file_url(&self, _file: &MediaFile) -> Option<Url> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn late_registered_engine_participates_in_queries(
    pool: PgPool,
) -> Result<()> {
    let repo = StorageRepository::new(pool);
    let registry = EngineRegistry::with_builtins();

    // Row lands before the engine kind exists in the registry.
    let record = repo
        .insert(NewStorageRecord::new("ftp", "Legacy FTP", json!({})))
        .await?;
    assert!(repo.fetch_engines(&registry).await.is_err());

    registry.register("ftp", FtpStorage::from_record)?;

    let engines = repo.fetch_engines(&registry).await?;
    assert_eq!(engines.len(), 1);
    assert_eq!(engines[0].engine_type(), "ftp");

    let hydrated = repo.engine_by_id(&registry, record.id).await?.unwrap();
    assert!(hydrated.as_any().is::<FtpStorage>());
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn deleting_storage_cascades_to_files(pool: PgPool) -> Result<()> {
    let repo = StorageRepository::new(pool.clone());

    let record = repo.insert(local("Local")).await?;
    repo.add_file(NewMediaFile::new(record.id, "a.mkv", 100)).await?;
    repo.add_file(NewMediaFile::new(record.id, "b.mkv", 200)).await?;
    assert_eq!(repo.files(record.id).await?.len(), 2);

    repo.delete(record.id).await?;

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM media_files")
            .fetch_one(&pool)
            .await?;
    assert_eq!(remaining, 0);

    let err = repo.delete(record.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn files_stream_yields_owned_files_oldest_first(
    pool: PgPool,
) -> Result<()> {
    let repo = StorageRepository::new(pool);

    let record = repo.insert(local("Local")).await?;
    repo.add_file(NewMediaFile::new(record.id, "a.mkv", 100)).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    repo.add_file(NewMediaFile::new(record.id, "b.mkv", 200)).await?;

    let files: Vec<_> = repo.files_stream(record.id).try_collect().await?;
    let names: Vec<&str> =
        files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["a.mkv", "b.mkv"]);
    Ok(())
}

#[sqlx::test(migrator = "medley_core::MIGRATOR")]
async fn update_data_bumps_modified_on(pool: PgPool) -> Result<()> {
    let repo = StorageRepository::new(pool);

    let record = repo.insert(local("Local")).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let updated = repo
        .update_data(record.id, json!({ "path": "/mnt/media" }))
        .await?;
    assert_eq!(updated.data["path"], "/mnt/media");
    assert!(updated.modified_on > record.modified_on);
    assert_eq!(updated.created_on, record.created_on);

    let promoted = repo.set_primary(record.id, true).await?;
    assert!(promoted.is_primary);
    Ok(())
}
