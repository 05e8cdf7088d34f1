use std::fmt;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::error::{Result, StoreError};

pub mod repositories;

pub use repositories::{CommentRepository, StorageRepository};

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

/// Shared handle to the Medley database: one PostgreSQL pool plus the
/// repositories built on it.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
    storage: StorageRepository,
    comments: CommentRepository,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl Store {
    /// Connect to PostgreSQL and build the repositories.
    ///
    /// Pool sizing honors `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` when
    /// set.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .idle_timeout(std::time::Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(connection_string)
            .await
            .map_err(|e| {
                StoreError::Internal(format!(
                    "Failed to connect to PostgreSQL: {e}"
                ))
            })?;

        info!(max_connections, min_connections, "connected to PostgreSQL");

        Ok(Self::from_pool_sized(pool, max_connections, min_connections))
    }

    /// Connect using the URL resolved from the environment.
    pub async fn connect_from_env() -> Result<Self> {
        let url = crate::config::resolve_database_url()?.ok_or_else(|| {
            StoreError::Configuration(
                "no database URL configured; set DATABASE_URL".into(),
            )
        })?;
        Self::connect(&url).await
    }

    /// Wrap an existing pool, e.g. one handed in by `#[sqlx::test]`.
    pub fn from_pool(pool: PgPool) -> Self {
        let max = pool.options().get_max_connections();
        let min = pool.options().get_min_connections();
        Self::from_pool_sized(pool, max, min)
    }

    fn from_pool_sized(pool: PgPool, max: u32, min: u32) -> Self {
        Self {
            storage: StorageRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            pool,
            max_connections: max,
            min_connections: min,
        }
    }

    /// Run the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        info!("running database migrations");
        crate::MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn storage(&self) -> &StorageRepository {
        &self.storage
    }

    pub fn comments(&self) -> &CommentRepository {
        &self.comments
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
        }
    }
}
