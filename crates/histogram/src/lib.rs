//! Mergeable histograms for colour-range statistics.
//!
//! Every loaded data slab is reduced to a fixed-resolution
//! [`HistogramSummary`] ([`DEFAULT_BINS`] bins). The slab itself is then
//! discarded; wider or narrower ranges are served by redistributing the
//! stored counts ([`merge`], [`rebin`]), which preserves the total but only
//! approximates the true distribution.
//!
//! # Example
//!
//! ```
//! use histogram::{build, rebin, DEFAULT_BINS};
//!
//! let samples = [0.5f32, 1.5, 2.5, f32::NAN, -9999.0];
//! let summary = build(&samples, 0.0, 4.0, DEFAULT_BINS, Some(-9999.0), None);
//! assert_eq!(summary.total(), 3);
//!
//! let display = rebin(&summary, 4, 0.0, 4.0);
//! assert_eq!(display, vec![1, 1, 1, 0]);
//! ```

pub mod aggregator;
pub mod build;
pub mod config;
pub mod merge;
pub mod summary;

pub use aggregator::HistogramAggregator;
pub use build::{build, build_parallel, build_sequential, build_with_threshold};
pub use config::{HistogramConfig, DEFAULT_BINS, DEFAULT_PARALLEL_THRESHOLD};
pub use merge::{merge, rebin};
pub use summary::{is_degenerate_range, HistogramSummary};
