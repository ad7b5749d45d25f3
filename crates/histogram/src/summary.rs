//! The binned distribution summary.

use serde::{Deserialize, Serialize};

/// Fixed-resolution histogram over `[min, max]`.
///
/// `bins[i]` counts values in `[min + i*w, min + (i+1)*w)`, with `w = (max - min) / bins.len()`.
/// Values beyond the range are clamped into the edge bins. When the range is
/// degenerate (`min == max` or not finite) every value sits in bin 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub bins: Vec<u64>,
    pub min: f64,
    pub max: f64,
}

impl HistogramSummary {
    /// An empty histogram with `num_bins` bins (at least one).
    pub fn empty(min: f64, max: f64, num_bins: usize) -> Self {
        Self {
            bins: vec![0; num_bins.max(1)],
            min,
            max,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn is_degenerate(&self) -> bool {
        is_degenerate_range(self.min, self.max)
    }

    /// Width of one bin, zero for a degenerate range.
    pub fn bin_width(&self) -> f64 {
        if self.is_degenerate() || self.bins.is_empty() {
            0.0
        } else {
            (self.max - self.min) / self.bins.len() as f64
        }
    }

    /// Value interval `[lo, hi)` covered by bin `i`.
    pub fn bin_range(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.bins.len() {
            return None;
        }
        let w = self.bin_width();
        Some((self.min + i as f64 * w, self.min + (i + 1) as f64 * w))
    }

    /// Approximate `q`-quantile, interpolating linearly inside the bin.
    ///
    /// `None` when the histogram is empty.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let total = self.total();
        if total == 0 || q.is_nan() {
            return None;
        }
        if self.is_degenerate() {
            return Some(self.min);
        }

        let target = q.clamp(0.0, 1.0) * total as f64;
        let w = self.bin_width();
        let mut seen = 0.0;
        for (i, &count) in self.bins.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let next = seen + count as f64;
            if next >= target {
                let within = ((target - seen) / count as f64).clamp(0.0, 1.0);
                return Some(self.min + (i as f64 + within) * w);
            }
            seen = next;
        }
        Some(self.max)
    }

    /// Default colour-scale bounds: the `lower` and `upper` quantiles.
    ///
    /// Falls back to the histogram range when the quantiles coincide.
    pub fn suggested_bounds(&self, lower: f64, upper: f64) -> Option<(f64, f64)> {
        let lo = self.quantile(lower)?;
        let hi = self.quantile(upper)?;
        if hi > lo {
            Some((lo, hi))
        } else {
            Some((self.min, self.max))
        }
    }
}

/// A range that cannot be split into bins.
pub fn is_degenerate_range(min: f64, max: f64) -> bool {
    !(min.is_finite() && max.is_finite()) || min >= max
}
