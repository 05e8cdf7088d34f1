use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use medley_model::StorageRecord;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::storage::StorageEngine;
use crate::storage::engines::{LocalFileStorage, RemoteUrlStorage};

/// Builds a concrete engine from its persisted row.
pub type EngineFactory = fn(StorageRecord) -> Result<Box<dyn StorageEngine>>;

type RegisterObserver = Arc<dyn Fn(&str) + Send + Sync>;

static GLOBAL: Lazy<EngineRegistry> = Lazy::new(EngineRegistry::with_builtins);

/// Open registry mapping `engine_type` tags to engine factories.
///
/// Hydration looks the tag up at query time, so engines registered after
/// startup (e.g. by plugins) become usable without re-wiring anything.
pub struct EngineRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    factories: HashMap<String, EngineFactory>,
    observers: Vec<RegisterObserver>,
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("EngineRegistry")
            .field("registered", &inner.factories.keys().collect::<Vec<_>>())
            .field("observers", &inner.observers.len())
            .finish()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    /// An empty registry. Mostly useful in tests; production code wants
    /// [`EngineRegistry::global`] or [`EngineRegistry::with_builtins`].
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// A registry pre-seeded with the built-in engines.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry
            .register(engines_builtin::LOCAL_FILE, LocalFileStorage::from_record)
            .and_then(|()| {
                registry.register(
                    engines_builtin::REMOTE_URL,
                    RemoteUrlStorage::from_record,
                )
            })
            .unwrap_or_else(|err| {
                unreachable!("built-in engine registration collided: {err}")
            });
        registry
    }

    /// The process-wide registry, seeded with the built-in engines.
    pub fn global() -> &'static EngineRegistry {
        &GLOBAL
    }

    /// Register an engine kind exactly once.
    ///
    /// Observers installed via [`EngineRegistry::add_register_observer`]
    /// are notified after the factory is in place.
    pub fn register(
        &self,
        engine_type: &str,
        factory: EngineFactory,
    ) -> Result<()> {
        let observers = {
            let mut inner =
                self.inner.write().unwrap_or_else(|e| e.into_inner());
            if inner.factories.contains_key(engine_type) {
                return Err(StoreError::DuplicateEngineType(
                    engine_type.to_owned(),
                ));
            }
            debug!(engine_type, "registering storage engine");
            inner.factories.insert(engine_type.to_owned(), factory);
            inner.observers.clone()
        };

        // Invoked outside the lock so an observer may itself register.
        for observer in observers {
            observer(engine_type);
        }
        Ok(())
    }

    /// Install an observer notified of every registration for the lifetime
    /// of the process.
    ///
    /// The observer is immediately replayed over the already-registered
    /// tags, closing the race between installation and earlier
    /// registrations.
    pub fn add_register_observer(
        &self,
        observer: impl Fn(&str) + Send + Sync + 'static,
    ) {
        let observer: RegisterObserver = Arc::new(observer);
        let existing: Vec<String> = {
            let mut inner =
                self.inner.write().unwrap_or_else(|e| e.into_inner());
            inner.observers.push(Arc::clone(&observer));
            inner.factories.keys().cloned().collect()
        };

        for engine_type in existing {
            observer(&engine_type);
        }
    }

    pub fn is_registered(&self, engine_type: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .factories
            .contains_key(engine_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .factories
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Hydrate a row into the engine kind registered for its tag.
    pub fn hydrate(
        &self,
        record: StorageRecord,
    ) -> Result<Box<dyn StorageEngine>> {
        let factory = {
            let inner =
                self.inner.read().unwrap_or_else(|e| e.into_inner());
            inner.factories.get(&record.engine_type).copied()
        };
        match factory {
            Some(factory) => factory(record),
            None => Err(StoreError::UnknownEngineType(record.engine_type)),
        }
    }
}

/// Built-in engine tags.
pub mod engines_builtin {
    pub const LOCAL_FILE: &str = "local_file";
    pub const REMOTE_URL: &str = "remote_url";
}
