//! # Medley Core
//!
//! Persistence layer for the Medley media CMS. Two concerns live here:
//!
//! - **Storage engine catalog**: a single `storage` table holds every
//!   configured engine, discriminated by `engine_type`. Rows are hydrated
//!   into concrete [`storage::StorageEngine`] implementations through an
//!   open [`storage::EngineRegistry`], so engines registered late (e.g. by
//!   plugins) participate in queries without any re-wiring.
//! - **Comments**: a generic comment entity attachable to parent objects
//!   through per-parent join tables. The relation a comment is attached
//!   through stamps its `kind` tag.
//!
//! All reads and writes go through a shared `sqlx` PostgreSQL pool; the
//! database supplies atomicity, isolation, and constraint enforcement.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Comment parent relations
pub mod comments;

/// Database connection URL resolution
pub mod config;

/// Connection pool, migrations, and repositories
pub mod database;

/// Error types and error handling utilities
pub mod error;

/// Storage engine trait, registry, and built-in engines
pub mod storage;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use comments::CommentRelation;
pub use database::{PoolStats, Store};
pub use error::{Result, StoreError};
pub use storage::{EngineRegistry, StorageEngine};
