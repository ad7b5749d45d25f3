//! `object_store` backed access (HTTP, S3/MinIO, local filesystem).
//!
//! Reads go through the zarrs object-store adapter, which maps missing
//! objects to `None`; listings use `object_store` directly.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::http::HttpBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::ObjectStore;
use tracing::{debug, instrument};
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::{AsyncReadableStorageTraits, StoreKey};

use super::{BackendResolver, StoreBackend};
use crate::error::{Result, StoreError};

/// Backend over any `object_store` implementation, rooted at a prefix.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    reader: AsyncObjectStore<Arc<dyn ObjectStore>>,
    prefix: String,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            reader: AsyncObjectStore::new(store.clone()),
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    fn location(&self, key: &str) -> Path {
        let key = key.trim_matches('/');
        match (self.prefix.is_empty(), key.is_empty()) {
            (true, _) => Path::from(key),
            (false, true) => Path::from(self.prefix.as_str()),
            (false, false) => Path::from(format!("{}/{}", self.prefix, key)),
        }
    }
}

#[async_trait]
impl StoreBackend for ObjectStoreBackend {
    #[instrument(skip(self), fields(prefix = %self.prefix))]
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let location = self.location(key);
        let store_key = StoreKey::new(location.as_ref())
            .map_err(|e| StoreError::malformed(format!("invalid key {}: {}", location, e)))?;

        let bytes = self
            .reader
            .get(&store_key)
            .await
            .map_err(|e| StoreError::transport(format!("failed to read {}: {}", location, e)))?
            .map(Bytes::from);

        if let Some(bytes) = &bytes {
            debug!(size = bytes.len(), "Read object");
        }
        Ok(bytes)
    }

    async fn list_dir(&self, prefix: &str) -> Result<Vec<String>> {
        let location = self.location(prefix);
        let listing = if location.as_ref().is_empty() {
            self.store.list_with_delimiter(None).await
        } else {
            self.store.list_with_delimiter(Some(&location)).await
        }
        .map_err(|e| StoreError::transport(format!("list of {} failed: {}", location, e)))?;

        let mut names: Vec<String> = listing
            .common_prefixes
            .iter()
            .chain(listing.objects.iter().map(|meta| &meta.location))
            .filter_map(|path| path.filename().map(String::from))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Builds object-store backends from store URLs.
///
/// - `http://` / `https://` roots use the HTTP store (byte-range GETs)
/// - `s3://bucket/prefix` roots use the S3 builder configured from the environment
/// - `file://` roots and plain paths use the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackendResolver;

impl BackendResolver for DefaultBackendResolver {
    fn resolve(&self, store: &str) -> Result<Arc<dyn StoreBackend>> {
        if store.starts_with("http://") || store.starts_with("https://") {
            let http = HttpBuilder::new()
                .with_url(store)
                .build()
                .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {}", e)))?;
            return Ok(Arc::new(ObjectStoreBackend::new(Arc::new(http), "")));
        }

        if let Some(rest) = store.strip_prefix("s3://") {
            let prefix = rest.split_once('/').map(|(_, p)| p).unwrap_or("");
            let s3 = AmazonS3Builder::from_env()
                .with_url(store)
                .build()
                .map_err(|e| StoreError::Config(format!("failed to create S3 client: {}", e)))?;
            return Ok(Arc::new(ObjectStoreBackend::new(Arc::new(s3), prefix)));
        }

        let path = store.strip_prefix("file://").unwrap_or(store);
        if path.contains("://") {
            return Err(StoreError::Config(format!("unsupported store scheme: {}", store)));
        }
        let local = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| StoreError::Config(format!("failed to open {}: {}", path, e)))?;
        Ok(Arc::new(ObjectStoreBackend::new(Arc::new(local), "")))
    }
}
