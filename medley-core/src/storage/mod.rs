use std::any::Any;
use std::fmt;

use medley_model::{MediaFile, StorageRecord};
use url::Url;

pub mod engines;
pub mod registry;

pub use engines::{LocalFileStorage, RemoteUrlStorage};
pub use registry::{EngineFactory, EngineRegistry};

/// A hydrated storage engine: a `storage` row decoded by the concrete
/// engine kind registered for its `engine_type` tag.
///
/// Exactly the `engine_type` column determines which implementation a row
/// hydrates into; everything else about the row is shared state exposed
/// through [`StorageEngine::record`].
pub trait StorageEngine: fmt::Debug + Send + Sync {
    /// The discriminator tag this engine kind registers under.
    fn engine_type(&self) -> &'static str;

    /// The persisted row backing this engine.
    fn record(&self) -> &StorageRecord;

    /// Public URL a media file is served from, when this engine can
    /// produce one.
    fn file_url(&self, file: &MediaFile) -> Option<Url>;

    /// For downcasting to the concrete engine type.
    fn as_any(&self) -> &dyn Any;

    fn display_name(&self) -> &str {
        &self.record().display_name
    }

    fn is_primary(&self) -> bool {
        self.record().is_primary
    }
}
