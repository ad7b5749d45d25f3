//! Dimension navigation and grid topology for chunked geoscience datasets.
//!
//! This crate sits between the [`chunk_store`] and the viewer's rendering layer:
//!
//! - **Dimension ranges**: which non-spatial axes get a slider, with what bounds,
//!   and where each slider starts
//! - **Grid topology**: which spatial encoding a variable uses, decided by a
//!   chain of metadata probes
//! - **Time axes**: decoding of `"<unit> since <date>"` coordinates for labels
//!
//! # Architecture
//!
//! ```text
//! Variable selected
//!      │
//!      ▼
//! GridTopologyClassifier::classify(grid, source, variable)
//!      │
//!      ├─► triangular ─► grid_mapping ─► axis names ─► coordinate shapes
//!      │         (first probe that matches wins)
//!      │
//!      ▼
//! DimensionRangeResolver::resolve_variable(handle, grid_type, preserve)
//!      │
//!      ├─► spatial axes ignored
//!      ├─► start presets applied once, bound presets every time
//!      └─► slider positions kept when the axis is unchanged
//!               │
//!               ▼
//!          selection for ChunkedArrayStore::read_selection
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{DimensionRangeResolver, GridTopologyClassifier, TopologyConfig};
//!
//! let classifier = GridTopologyClassifier::new(store.clone(), reporter, TopologyConfig::default());
//! let grid_type = classifier.classify(&grid, &source, "tas").await;
//!
//! let handle = store.resolve_variable(&source, "tas").await?;
//! let resolution = resolver.resolve_variable(&handle, grid_type, true)?;
//! let data = store
//!     .read_selection(&source, "tas", &selection_for(&resolution.indices))
//!     .await?;
//! ```

pub mod config;
pub mod dimensions;
pub mod error;
pub mod time_axis;
pub mod topology;

// Re-export commonly used types at crate root
pub use config::TopologyConfig;
pub use dimensions::{
    build_dimension_ranges, build_for_variable, materialize_indices, selection_for,
    spatial_ignore_set, DimensionPresets, DimensionRange, DimensionRangeResolver, RangeBuild,
    Resolution, SliderState,
};
pub use error::{GridError, Result};
pub use geo_common::GridType;
pub use time_axis::{decode_time_values, read_time_axis, TimeUnit, TimeUnits};
pub use topology::{Classification, GridProbe, GridTopologyClassifier, ProbeContext};
