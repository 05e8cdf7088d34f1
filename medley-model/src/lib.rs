//! Core data model definitions shared across Medley crates.
#![allow(missing_docs)]

pub mod comment;
pub mod error;
pub mod files;
pub mod ids;
pub mod storage;

// Intentionally curated re-exports for downstream consumers.
pub use comment::{Author, Comment, CommentStatus, NewComment};
pub use error::{ModelError, Result as ModelResult};
pub use files::{MediaFile, NewMediaFile};
pub use ids::{CommentId, MediaFileId, StorageId};
pub use storage::{NewStorageRecord, StorageRecord};
