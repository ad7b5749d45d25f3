//! The session-scoped chunked array store.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use geo_common::DatasetLocator;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use zarrs::array_subset::ArraySubset;
use zarrs_storage::store::MemoryStore;
use zarrs_storage::{StoreKey, WritableStorageTraits};

use crate::backend::{BackendResolver, DefaultBackendResolver, StoreBackend};
use crate::buffer::{BufferData, TypedBuffer};
use crate::cache::{RequestCache, StatsCounters, StoreStats};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::metadata::{dialect, GroupHandle, VariableHandle};
use crate::selection::{selection_key, ReadPlan, Selection};

/// Single point of access to remote chunked-array metadata and data.
///
/// One instance per application session, shared by reference. Group and variable
/// handles are cached until [`invalidate`](Self::invalidate). Data reads are only
/// shared between concurrent identical requests, except for the configured axis
/// variables whose reads stay cached.
pub struct ChunkedArrayStore {
    config: StoreConfig,
    resolver: Arc<dyn BackendResolver>,
    backends: RwLock<HashMap<String, Arc<dyn StoreBackend>>>,
    groups: RequestCache<GroupHandle>,
    variables: RequestCache<VariableHandle>,
    reads: RequestCache<TypedBuffer>,
    stats: StatsCounters,
}

impl ChunkedArrayStore {
    pub fn new(config: StoreConfig, resolver: Arc<dyn BackendResolver>) -> Result<Self> {
        config.validate().map_err(StoreError::Config)?;
        Ok(Self {
            config,
            resolver,
            backends: RwLock::new(HashMap::new()),
            groups: RequestCache::new(),
            variables: RequestCache::new(),
            reads: RequestCache::new(),
            stats: StatsCounters::default(),
        })
    }

    /// Store over object-store backends, configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(StoreConfig::from_env(), Arc::new(DefaultBackendResolver))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn backend(&self, store: &str) -> Result<Arc<dyn StoreBackend>> {
        if let Some(backend) = self.backends.read().await.get(store) {
            return Ok(backend.clone());
        }
        let backend = self.resolver.resolve(store)?;
        self.backends
            .write()
            .await
            .insert(store.to_string(), backend.clone());
        Ok(backend)
    }

    /// Open (or return the cached) group at `locator`.
    #[instrument(skip(self), fields(group = %locator))]
    pub async fn resolve_group(&self, locator: &DatasetLocator) -> Result<Arc<GroupHandle>> {
        let backend = self.backend(&locator.store).await?;
        let owned = locator.clone();
        let consolidated_key = self.config.consolidated_key.clone();

        let fetched = self
            .groups
            .get_or_fetch(&locator.cache_key(), true, move || async move {
                dialect::open_group(backend.as_ref(), &owned, &consolidated_key).await
            })
            .await;
        self.stats.record_metadata(&fetched);
        log_failure(&fetched.result, "group");
        fetched.result
    }

    /// Resolve the array `name` inside the group at `locator`.
    #[instrument(skip(self), fields(group = %locator))]
    pub async fn resolve_variable(
        &self,
        locator: &DatasetLocator,
        name: &str,
    ) -> Result<Arc<VariableHandle>> {
        let group = self.resolve_group(locator).await?;
        let backend = self.backend(&locator.store).await?;
        let key = format!("{}::{}", locator.cache_key(), name.trim_matches('/'));
        let owned_name = name.to_string();

        let fetched = self
            .variables
            .get_or_fetch(&key, true, move || async move {
                dialect::open_variable(backend.as_ref(), &group, &owned_name).await
            })
            .await;
        self.stats.record_metadata(&fetched);
        log_failure(&fetched.result, "variable");
        fetched.result
    }

    /// Names of the arrays in the group at `locator`.
    pub async fn list_variables(&self, locator: &DatasetLocator) -> Result<Vec<String>> {
        let group = self.resolve_group(locator).await?;
        let backend = self.backend(&locator.store).await?;
        dialect::list_arrays(backend.as_ref(), &group).await
    }

    /// Read a hyperslab of `name`.
    ///
    /// One [`Selection`] per axis; index axes are dropped from the result shape.
    /// Data is returned in row-major order.
    #[instrument(skip(self, selection), fields(group = %locator))]
    pub async fn read_selection(
        &self,
        locator: &DatasetLocator,
        name: &str,
        selection: &[Selection],
    ) -> Result<Arc<TypedBuffer>> {
        let variable = self.resolve_variable(locator, name).await?;
        let plan = ReadPlan::new(selection, &variable.shape)?;
        let backend = self.backend(&locator.store).await?;
        let concurrency = self.config.chunk_fetch_concurrency;
        let retain = self.config.is_cached_axis(&variable.name);
        let key = format!(
            "{}::{}[{}]",
            locator.cache_key(),
            variable.name,
            selection_key(selection)
        );

        let fetched = self
            .reads
            .get_or_fetch(&key, retain, move || {
                read_hyperslab(backend, variable, plan, concurrency)
            })
            .await;
        self.stats.record_read(&fetched);
        log_failure(&fetched.result, "read");
        fetched.result
    }

    /// Read a whole variable.
    pub async fn read_all(&self, locator: &DatasetLocator, name: &str) -> Result<Arc<TypedBuffer>> {
        let variable = self.resolve_variable(locator, name).await?;
        let selection = vec![Selection::All; variable.ndim()];
        self.read_selection(locator, name, &selection).await
    }

    /// Drop all cached handles, data and backends.
    pub async fn invalidate(&self) {
        self.groups.clear().await;
        self.variables.clear().await;
        self.reads.clear().await;
        self.backends.write().await.clear();
        debug!("Store caches invalidated");
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.snapshot()
    }
}

fn log_failure<T>(result: &Result<T>, what: &str) {
    match result {
        Err(e) if e.is_transport() => warn!(error = %e, "{} fetch failed", what),
        Err(e) => debug!(error = %e, "{} fetch failed", what),
        Ok(_) => {}
    }
}

/// Fetch the chunks under the selection's bounding box through the backend,
/// stage them in a per-read memory store and let zarrs decode and assemble them.
///
/// Never-written chunks read as the fill value.
async fn read_hyperslab(
    backend: Arc<dyn StoreBackend>,
    variable: Arc<VariableHandle>,
    plan: ReadPlan,
    concurrency: usize,
) -> Result<TypedBuffer> {
    let layout = variable.layout();
    if plan.output_len() == 0 {
        return Ok(TypedBuffer {
            shape: plan.output_shape(),
            data: BufferData::empty(&layout.data_type)?,
        });
    }

    let staging = Arc::new(MemoryStore::new());
    let array = layout.open(staging.clone())?;
    let (start, extent) = plan.bounding_box();
    let subset = ArraySubset::new_with_start_shape(start, extent)
        .map_err(|e| StoreError::invalid_selection(e.to_string()))?;

    let keys: Vec<StoreKey> = match array
        .chunks_in_array_subset(&subset)
        .map_err(|e| StoreError::invalid_selection(e.to_string()))?
    {
        Some(chunks) => chunks
            .indices()
            .into_iter()
            .map(|indices| array.chunk_key(&indices))
            .collect(),
        None => Vec::new(),
    };
    debug!(variable = %variable.name, chunks = keys.len(), "Reading selection");

    let mut fetched = stream::iter(keys.into_iter().map(|key| {
        let backend = backend.clone();
        async move {
            let bytes = backend.get(key.as_str()).await?;
            Ok::<_, StoreError>((key, bytes))
        }
    }))
    .buffer_unordered(concurrency);

    while let Some((key, bytes)) = fetched.try_next().await? {
        if let Some(bytes) = bytes {
            staging
                .set(&key, bytes)
                .map_err(|e| StoreError::Decode(format!("staging {}: {}", key.as_str(), e)))?;
        }
    }

    let data = tokio::task::spawn_blocking(move || BufferData::retrieve(&array, &subset))
        .await
        .map_err(|e| StoreError::Decode(format!("decode task failed: {}", e)))??;

    let data = match plan.gather_indices() {
        Some(indices) => data.gather(&indices),
        None => data,
    };
    Ok(TypedBuffer {
        shape: plan.output_shape(),
        data,
    })
}
