//! In-process backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::StoreBackend;
use crate::error::Result;

/// Backend holding every object in memory.
///
/// Used by tests and by embedders that already hold a store's objects.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, Bytes>>,
    gets: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend from a key -> bytes map.
    pub fn from_files(files: BTreeMap<String, Vec<u8>>) -> Self {
        let objects = files
            .into_iter()
            .map(|(k, v)| (k, Bytes::from(v)))
            .collect();
        Self {
            objects: RwLock::new(objects),
            gets: AtomicU64::new(0),
        }
    }

    pub async fn insert(&self, key: &str, bytes: impl Into<Bytes>) {
        self.objects.write().await.insert(key.to_string(), bytes.into());
    }

    pub async fn remove(&self, key: &str) {
        self.objects.write().await.remove(key);
    }

    /// Number of `get` calls served so far.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn list_dir(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_matches('/');
        let lead = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };
        let objects = self.objects.read().await;
        let children: BTreeSet<String> = objects
            .keys()
            .filter_map(|key| key.strip_prefix(&lead))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        Ok(children.into_iter().collect())
    }
}
