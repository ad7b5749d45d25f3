//! Streaming aggregation over data slabs.

use num_traits::ToPrimitive;
use tracing::debug;

use crate::build::build_with_threshold;
use crate::config::HistogramConfig;
use crate::merge::rebin;
use crate::summary::HistogramSummary;

/// Accumulates slabs into one canonical histogram over a fixed range.
///
/// Slabs are binned as they arrive and then dropped; only the canonical
/// counts are kept. Display histograms are derived with [`rebinned`](Self::rebinned).
#[derive(Debug, Clone)]
pub struct HistogramAggregator {
    config: HistogramConfig,
    summary: HistogramSummary,
    slabs: usize,
}

impl HistogramAggregator {
    pub fn new(min: f64, max: f64, config: HistogramConfig) -> Self {
        Self {
            summary: HistogramSummary::empty(min, max, config.num_bins),
            config,
            slabs: 0,
        }
    }

    /// Aggregator with the default resolution.
    pub fn with_range(min: f64, max: f64) -> Self {
        Self::new(min, max, HistogramConfig::default())
    }

    /// Bin one slab of samples into the canonical histogram.
    pub fn push_slab<T>(&mut self, samples: &[T], fill_value: Option<f64>, missing_value: Option<f64>)
    where
        T: ToPrimitive + Sync,
    {
        let slab = build_with_threshold(
            samples,
            self.summary.min,
            self.summary.max,
            self.summary.num_bins(),
            fill_value,
            missing_value,
            self.config.parallel_threshold,
        );
        let counted = slab.total();
        for (acc, n) in self.summary.bins.iter_mut().zip(slab.bins) {
            *acc += n;
        }
        self.slabs += 1;
        debug!(
            samples = samples.len(),
            counted,
            total = self.summary.total(),
            "Aggregated slab"
        );
    }

    pub fn summary(&self) -> &HistogramSummary {
        &self.summary
    }

    pub fn into_summary(self) -> HistogramSummary {
        self.summary
    }

    pub fn slabs(&self) -> usize {
        self.slabs
    }

    /// The canonical histogram redistributed onto `num_bins` bins over `[min, max]`.
    pub fn rebinned(&self, num_bins: usize, min: f64, max: f64) -> Vec<u64> {
        rebin(&self.summary, num_bins, min, max)
    }

    /// Drop all counts, keeping the range.
    pub fn reset(&mut self) {
        self.summary.bins.iter_mut().for_each(|b| *b = 0);
        self.slabs = 0;
    }
}
