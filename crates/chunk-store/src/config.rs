//! Configuration for the chunked array store.

use serde::{Deserialize, Serialize};

/// Configuration for the chunked array store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Variables whose full reads stay cached for the session (low-cardinality axes
    /// such as time that are re-read on every slice change).
    pub cached_axis_variables: Vec<String>,

    /// Maximum number of chunk GETs in flight for one selection read.
    pub chunk_fetch_concurrency: usize,

    /// Key of the consolidated metadata document relative to a group.
    pub consolidated_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cached_axis_variables: vec!["time".to_string()],
            chunk_fetch_concurrency: 8,
            consolidated_key: ".zmetadata".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AXIS_CACHE_VARIABLES") {
            config.cached_axis_variables = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(val) = std::env::var("CHUNK_FETCH_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                config.chunk_fetch_concurrency = n;
            }
        }

        if let Ok(val) = std::env::var("ZARR_CONSOLIDATED_KEY") {
            config.consolidated_key = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_fetch_concurrency == 0 {
            return Err("chunk_fetch_concurrency must be > 0".to_string());
        }

        if self.consolidated_key.trim().is_empty() {
            return Err("consolidated_key must not be empty".to_string());
        }

        Ok(())
    }

    /// Whether full reads of this variable are kept across calls.
    pub fn is_cached_axis(&self, variable: &str) -> bool {
        self.cached_axis_variables.iter().any(|v| v == variable)
    }
}
