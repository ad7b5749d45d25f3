//! Count-preservation and path-agreement properties of the histogram API.

use histogram::{
    build, build_parallel, build_sequential, merge, rebin, HistogramAggregator, HistogramConfig,
    HistogramSummary, DEFAULT_BINS,
};
use test_utils::uniform_samples;

fn with_gaps(n: usize, seed: u32) -> Vec<f32> {
    uniform_samples(n, -50.0, 350.0, seed)
        .into_iter()
        .enumerate()
        .map(|(i, v)| match i % 97 {
            0 => f32::NAN,
            1 => -9999.0,
            _ => v as f32,
        })
        .collect()
}

// ============================================================================
// Building
// ============================================================================

#[test]
fn test_total_equals_valid_sample_count() {
    let samples = with_gaps(50_000, 3);
    let valid = samples.iter().filter(|v| v.is_finite() && **v != -9999.0).count() as u64;

    let s = build(&samples, 0.0, 300.0, DEFAULT_BINS, None, Some(-9999.0));
    assert_eq!(s.total(), valid);
    assert_eq!(s.num_bins(), DEFAULT_BINS);
}

#[test]
fn test_parallel_and_sequential_paths_agree() {
    let samples = with_gaps(200_003, 11);
    for bins in [1, 7, 256, DEFAULT_BINS] {
        let seq = build_sequential(&samples, 10.0, 290.0, bins, Some(-9999.0), None);
        let par = build_parallel(&samples, 10.0, 290.0, bins, Some(-9999.0), None);
        assert_eq!(seq, par, "bins = {}", bins);
    }
}

#[test]
fn test_constant_field_lands_in_first_bin() {
    let s = build(&[5.0f32, 5.0, 5.0], 5.0, 5.0, DEFAULT_BINS, None, None);
    assert_eq!(s.bins[0], 3);
    assert_eq!(s.total(), 3);
}

// ============================================================================
// Redistribution
// ============================================================================

#[test]
fn test_coarse_rebin_equals_block_sums() {
    let samples = uniform_samples(100_000, 0.0, 4096.0, 5);
    let fine = build(&samples, 0.0, 4096.0, 4096, None, None);
    let coarse = rebin(&fine, 64, 0.0, 4096.0);

    let expected: Vec<u64> = fine.bins.chunks(64).map(|c| c.iter().sum()).collect();
    assert_eq!(coarse, expected);
}

#[test]
fn test_merge_preserves_mass() {
    let parts: Vec<HistogramSummary> = [(0.0, 100.0, 1), (-20.0, 40.0, 2), (80.0, 500.0, 3), (7.0, 7.0, 4)]
        .into_iter()
        .map(|(min, max, seed)| {
            let samples = uniform_samples(10_000, min - 5.0, max + 5.0, seed);
            build(&samples, min, max, 512, None, None)
        })
        .collect();
    let expected: u64 = parts.iter().map(|p| p.total()).sum();

    for (min, max, bins) in [(0.0, 100.0, 64), (-1000.0, 1000.0, 4096), (50.0, 50.0, 16), (3.0, 9.0, 1)] {
        let merged = merge(&parts, min, max, bins);
        assert_eq!(merged.total(), expected, "range [{}, {}] / {}", min, max, bins);
    }
}

#[test]
fn test_rebinning_onto_a_shifted_range_preserves_mass() {
    let s = build(&uniform_samples(9_999, -3.0, 3.0, 9), -3.0, 3.0, 333, None, None);
    let shifted = rebin(&s, 101, -1.234, 5.678);
    assert_eq!(shifted.iter().sum::<u64>(), 9_999);
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_aggregated_slabs_match_one_combined_build() {
    let samples = with_gaps(120_000, 21);
    let config = HistogramConfig {
        num_bins: 1024,
        parallel_threshold: 10_000,
    };

    let mut agg = HistogramAggregator::new(0.0, 300.0, config);
    for slab in samples.chunks(17_000) {
        agg.push_slab(slab, None, Some(-9999.0));
    }
    let combined = build(&samples, 0.0, 300.0, 1024, None, Some(-9999.0));

    assert_eq!(agg.slabs(), 8);
    assert_eq!(agg.summary(), &combined);
    assert_eq!(agg.rebinned(16, 0.0, 300.0), rebin(&combined, 16, 0.0, 300.0));
}
