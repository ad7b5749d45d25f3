//! Redistribution of binned counts onto a new bin layout.
//!
//! Each source bin is treated as uniformly dense over its interval and split
//! across the destination bins it overlaps. Mass beyond the destination range
//! goes to the nearest edge bin. Fractional counts are rounded with the
//! largest-remainder method so the total is preserved exactly.

use crate::summary::{is_degenerate_range, HistogramSummary};

/// Merge `summaries` into one histogram over `[min, max]` with `num_bins` bins.
pub fn merge(summaries: &[HistogramSummary], min: f64, max: f64, num_bins: usize) -> HistogramSummary {
    let mut target = Redistribution::new(min, max, num_bins);
    for summary in summaries {
        target.add(summary);
    }
    HistogramSummary {
        bins: target.finish(),
        min,
        max,
    }
}

/// Counts of `summary` on a `num_bins` layout over `[min, max]`.
pub fn rebin(summary: &HistogramSummary, num_bins: usize, min: f64, max: f64) -> Vec<u64> {
    let mut target = Redistribution::new(min, max, num_bins);
    target.add(summary);
    target.finish()
}

struct Redistribution {
    min: f64,
    width: f64,
    degenerate: bool,
    mass: Vec<f64>,
    total: u64,
}

impl Redistribution {
    fn new(min: f64, max: f64, num_bins: usize) -> Self {
        let num_bins = num_bins.max(1);
        Self {
            min,
            width: (max - min) / num_bins as f64,
            degenerate: is_degenerate_range(min, max),
            mass: vec![0.0; num_bins],
            total: 0,
        }
    }

    fn last(&self) -> usize {
        self.mass.len() - 1
    }

    /// Destination bin holding `value`, clamped to the edges.
    fn bin_of(&self, value: f64) -> usize {
        if self.degenerate || !value.is_finite() {
            return 0;
        }
        let i = ((value - self.min) / self.width).floor();
        if i <= 0.0 {
            0
        } else {
            (i as usize).min(self.last())
        }
    }

    fn add(&mut self, source: &HistogramSummary) {
        let count: u64 = source.total();
        if count == 0 {
            return;
        }
        self.total += count;

        if self.degenerate {
            self.mass[0] += count as f64;
            return;
        }
        if source.is_degenerate() {
            let i = if source.min.is_finite() {
                self.bin_of(source.min)
            } else {
                0
            };
            self.mass[i] += count as f64;
            return;
        }

        let width = source.bin_width();
        for (k, &c) in source.bins.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let lo = source.min + k as f64 * width;
            let hi = lo + width;
            self.spread(lo, hi, c as f64);
        }
    }

    /// Spread `count` uniformly over `[lo, hi)`.
    fn spread(&mut self, lo: f64, hi: f64, count: f64) {
        let span = hi - lo;
        let dest_max = self.min + self.width * self.mass.len() as f64;

        // below and above the destination range
        let below = ((self.min.min(hi) - lo) / span).max(0.0);
        let above = ((hi - dest_max.max(lo)) / span).max(0.0);
        if below > 0.0 {
            self.mass[0] += count * below;
        }
        if above > 0.0 {
            let last = self.last();
            self.mass[last] += count * above;
        }

        let first = self.bin_of(lo.max(self.min));
        let end = self.bin_of(hi.min(dest_max));
        for i in first..=end {
            let bin_lo = self.min + i as f64 * self.width;
            let bin_hi = bin_lo + self.width;
            let overlap = hi.min(bin_hi) - lo.max(bin_lo);
            if overlap > 0.0 {
                self.mass[i] += count * overlap / span;
            }
        }
    }

    /// Round to integers preserving the total (largest remainder).
    fn finish(self) -> Vec<u64> {
        let mut bins: Vec<u64> = self.mass.iter().map(|m| m.max(0.0).floor() as u64).collect();
        let assigned: u64 = bins.iter().sum();

        if assigned > self.total {
            // only reachable through accumulated rounding; trim the largest bins
            let mut excess = assigned - self.total;
            let mut order: Vec<usize> = (0..bins.len()).collect();
            order.sort_by(|&a, &b| bins[b].cmp(&bins[a]).then(a.cmp(&b)));
            for i in order.into_iter().cycle() {
                if excess == 0 {
                    break;
                }
                if bins[i] > 0 {
                    bins[i] -= 1;
                    excess -= 1;
                }
            }
            return bins;
        }

        let deficit = self.total - assigned;
        if deficit > 0 {
            let mut order: Vec<usize> = (0..bins.len()).collect();
            let remainder = |i: usize| self.mass[i] - self.mass[i].floor();
            order.sort_by(|&a, &b| {
                remainder(b)
                    .partial_cmp(&remainder(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            for &i in order.iter().cycle().take(deficit as usize) {
                bins[i] += 1;
            }
        }
        bins
    }
}
