//! Byte-addressable backends the store reads metadata documents and chunks from.

mod memory;
mod object_store;

pub use self::memory::MemoryBackend;
pub use self::object_store::{DefaultBackendResolver, ObjectStoreBackend};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use geo_common::DatasetLocator;

use crate::error::{Result, StoreError};

/// Remote chunked-array backend.
///
/// Keys are relative to the store root and use `/` separators
/// (`atm/tas/.zarray`, `atm/tas/0.3.1`).
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Fetch the object at `key`.
    ///
    /// Returns `Ok(None)` when the object does not exist; transport failures are
    /// `Err(StoreError::Transport)`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Names of the immediate children under `prefix` (`""` for the root).
    async fn list_dir(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Maps a normalized store root to a backend.
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, store: &str) -> Result<Arc<dyn StoreBackend>>;
}

/// Resolver over a fixed set of pre-registered backends.
#[derive(Default, Clone)]
pub struct StaticBackendResolver {
    backends: HashMap<String, Arc<dyn StoreBackend>>,
}

impl StaticBackendResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend for a store root.
    pub fn with_backend(mut self, store: &str, backend: Arc<dyn StoreBackend>) -> Self {
        self.backends
            .insert(DatasetLocator::root(store).store, backend);
        self
    }
}

impl BackendResolver for StaticBackendResolver {
    fn resolve(&self, store: &str) -> Result<Arc<dyn StoreBackend>> {
        self.backends
            .get(store)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("no backend registered for store {}", store)))
    }
}
