//! Histogram construction from raw samples.

use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::config::DEFAULT_PARALLEL_THRESHOLD;
use crate::summary::{is_degenerate_range, HistogramSummary};

/// Samples per rayon task.
const PARALLEL_CHUNK: usize = 1 << 14;

/// Maps sample values to bins, dropping non-finite values and sentinels.
#[derive(Debug, Clone, Copy)]
struct Binner {
    min: f64,
    width: f64,
    num_bins: usize,
    degenerate: bool,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl Binner {
    fn new(
        min: f64,
        max: f64,
        num_bins: usize,
        fill_value: Option<f64>,
        missing_value: Option<f64>,
    ) -> Self {
        let num_bins = num_bins.max(1);
        Self {
            min,
            width: (max - min) / num_bins as f64,
            num_bins,
            degenerate: is_degenerate_range(min, max),
            fill_value,
            missing_value,
        }
    }

    /// Sentinels are compared both exactly and at single precision, since the
    /// attribute is often stored as f64 while the data is f32.
    #[inline]
    fn is_sentinel(&self, v: f64) -> bool {
        [self.fill_value, self.missing_value]
            .into_iter()
            .flatten()
            .any(|s| v == s || (v as f32) == (s as f32))
    }

    #[inline]
    fn bin_of<T: ToPrimitive>(&self, sample: &T) -> Option<usize> {
        let v = sample.to_f64()?;
        if !v.is_finite() || self.is_sentinel(v) {
            return None;
        }
        if self.degenerate {
            return Some(0);
        }
        let i = ((v - self.min) / self.width).floor();
        Some(if i <= 0.0 {
            0
        } else {
            (i as usize).min(self.num_bins - 1)
        })
    }

    fn accumulate<T: ToPrimitive>(&self, bins: &mut [u64], samples: &[T]) {
        for sample in samples {
            if let Some(i) = self.bin_of(sample) {
                bins[i] += 1;
            }
        }
    }
}

/// Histogram of `samples` over `[min, max]` with `num_bins` bins.
///
/// Non-finite values and values equal to `fill_value` or `missing_value` are
/// skipped. Large inputs are binned in parallel; the result does not depend on
/// which path ran.
pub fn build<T>(
    samples: &[T],
    min: f64,
    max: f64,
    num_bins: usize,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
) -> HistogramSummary
where
    T: ToPrimitive + Sync,
{
    build_with_threshold(
        samples,
        min,
        max,
        num_bins,
        fill_value,
        missing_value,
        DEFAULT_PARALLEL_THRESHOLD,
    )
}

/// [`build`] with an explicit sample count from which the parallel path is used.
pub fn build_with_threshold<T>(
    samples: &[T],
    min: f64,
    max: f64,
    num_bins: usize,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
    parallel_threshold: usize,
) -> HistogramSummary
where
    T: ToPrimitive + Sync,
{
    if samples.len() >= parallel_threshold {
        build_parallel(samples, min, max, num_bins, fill_value, missing_value)
    } else {
        build_sequential(samples, min, max, num_bins, fill_value, missing_value)
    }
}

pub fn build_sequential<T: ToPrimitive>(
    samples: &[T],
    min: f64,
    max: f64,
    num_bins: usize,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
) -> HistogramSummary {
    let binner = Binner::new(min, max, num_bins, fill_value, missing_value);
    let mut summary = HistogramSummary::empty(min, max, binner.num_bins);
    binner.accumulate(&mut summary.bins, samples);
    summary
}

pub fn build_parallel<T: ToPrimitive + Sync>(
    samples: &[T],
    min: f64,
    max: f64,
    num_bins: usize,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
) -> HistogramSummary {
    let binner = Binner::new(min, max, num_bins, fill_value, missing_value);
    let n = binner.num_bins;

    let bins = samples
        .par_chunks(PARALLEL_CHUNK)
        .fold(
            || vec![0u64; n],
            |mut bins, chunk| {
                binner.accumulate(&mut bins, chunk);
                bins
            },
        )
        .reduce(
            || vec![0u64; n],
            |mut a, b| {
                a.iter_mut().zip(&b).for_each(|(x, y)| *x += y);
                a
            },
        );

    HistogramSummary { bins, min, max }
}
