//! Grid topology classification.
//!
//! A fixed chain of probes is tried in order; the first match decides the
//! [`GridType`]. Any failure, including "nothing matched", is handed to the
//! [`ErrorReporter`] and surfaces as [`GridType::Error`].

mod probes;

pub use probes::{
    classify_coordinates, distinct_count, grid_mapping_reference, AxisNameProbe,
    CoordinateShapeProbe, GridMappingProbe, GridProbe, ProbeContext, TriangularProbe, NO_MATCH,
};

use std::collections::HashMap;
use std::sync::Arc;

use chunk_store::ChunkedArrayStore;
use geo_common::{DatasetLocator, ErrorReporter, GridType};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::TopologyConfig;
use crate::error::Result;

/// Outcome of one classification with the probe that decided it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub grid_type: GridType,
    /// Name of the matching probe, `None` on error.
    pub probe: Option<&'static str>,
    /// Error message when classification failed.
    pub diagnostic: Option<String>,
}

type MemoKey = (String, String, String);

/// Decides the grid encoding of a dataset+variable pair.
pub struct GridTopologyClassifier {
    store: Arc<ChunkedArrayStore>,
    reporter: Arc<dyn ErrorReporter>,
    config: TopologyConfig,
    probes: Vec<Box<dyn GridProbe>>,
    memo: RwLock<HashMap<MemoKey, Classification>>,
}

impl GridTopologyClassifier {
    pub fn new(
        store: Arc<ChunkedArrayStore>,
        reporter: Arc<dyn ErrorReporter>,
        config: TopologyConfig,
    ) -> Self {
        Self {
            store,
            reporter,
            config,
            probes: Self::default_probes(),
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// The probe chain in precedence order.
    pub fn default_probes() -> Vec<Box<dyn GridProbe>> {
        vec![
            Box::new(TriangularProbe),
            Box::new(GridMappingProbe),
            Box::new(AxisNameProbe),
            Box::new(CoordinateShapeProbe),
        ]
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Classify `variable` of `variable_source`, with `grid_source` holding the grid.
    pub async fn classify(
        &self,
        grid_source: &DatasetLocator,
        variable_source: &DatasetLocator,
        variable: &str,
    ) -> GridType {
        self.classify_detailed(grid_source, variable_source, variable)
            .await
            .grid_type
    }

    /// Like [`classify`](Self::classify), also naming the deciding probe.
    ///
    /// Successful classifications are memoized per (grid, variable source,
    /// variable); failures are retried on the next call.
    #[instrument(skip(self), fields(grid = %grid_source, source = %variable_source))]
    pub async fn classify_detailed(
        &self,
        grid_source: &DatasetLocator,
        variable_source: &DatasetLocator,
        variable: &str,
    ) -> Classification {
        let key = (
            grid_source.cache_key(),
            variable_source.cache_key(),
            variable.to_string(),
        );
        if let Some(hit) = self.memo.read().await.get(&key) {
            return hit.clone();
        }

        let ctx = ProbeContext {
            store: &self.store,
            grid_source,
            variable_source,
            variable,
            config: &self.config,
        };

        match self.run_chain(&ctx).await {
            Ok((grid_type, probe)) => {
                debug!(grid_type = %grid_type, probe, "Classified grid");
                let classification = Classification {
                    grid_type,
                    probe: Some(probe),
                    diagnostic: None,
                };
                self.memo.write().await.insert(key, classification.clone());
                classification
            }
            Err(e) => {
                let context = format!("classifying {} in {}", variable, variable_source);
                self.reporter.log_error(&e, Some(&context));
                Classification {
                    grid_type: GridType::Error,
                    probe: None,
                    diagnostic: Some(e.to_string()),
                }
            }
        }
    }

    async fn run_chain(&self, ctx: &ProbeContext<'_>) -> Result<(GridType, &'static str)> {
        for probe in &self.probes {
            if let Some(grid_type) = probe.probe(ctx).await? {
                return Ok((grid_type, probe.name()));
            }
            debug!(probe = probe.name(), "Probe did not match");
        }
        Err(crate::error::GridError::Unclassifiable(NO_MATCH.to_string()))
    }

    /// Drop all memoized classifications.
    pub async fn forget(&self) {
        self.memo.write().await.clear();
    }

    pub async fn memoized(&self) -> usize {
        self.memo.read().await.len()
    }
}
