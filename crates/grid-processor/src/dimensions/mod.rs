//! Per-dimension index windows for slicing N-dimensional variables.
//!
//! A variable's leading dimensions (time, level, ...) become navigable
//! [`DimensionRange`]s; the spatial dimensions of its grid are loaded in full and
//! map to `None`.

mod resolver;

pub use resolver::{DimensionRangeResolver, Resolution};

use std::collections::{BTreeMap, BTreeSet};

use chunk_store::{Selection, StoreError, VariableHandle};
use geo_common::GridType;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Navigable window of one dimension.
///
/// Invariant: `min_bound <= start_pos <= max_bound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub name: String,
    pub start_pos: usize,
    pub min_bound: usize,
    pub max_bound: usize,
}

impl DimensionRange {
    pub fn clamp(&self, index: usize) -> usize {
        index.clamp(self.min_bound, self.max_bound)
    }
}

/// Externally supplied per-dimension overrides (e.g. deep-link state), keyed by
/// dimension name. Values are kept as text and only applied when they parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionPresets {
    #[serde(default)]
    pub starts: BTreeMap<String, String>,
    #[serde(default)]
    pub min_bounds: BTreeMap<String, String>,
    #[serde(default)]
    pub max_bounds: BTreeMap<String, String>,
}

impl DimensionPresets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, dimension: &str, value: impl ToString) -> Self {
        self.starts.insert(dimension.to_string(), value.to_string());
        self
    }

    pub fn with_min_bound(mut self, dimension: &str, value: impl ToString) -> Self {
        self.min_bounds.insert(dimension.to_string(), value.to_string());
        self
    }

    pub fn with_max_bound(mut self, dimension: &str, value: impl ToString) -> Self {
        self.max_bounds.insert(dimension.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.min_bounds.is_empty() && self.max_bounds.is_empty()
    }
}

/// Output of [`build_dimension_ranges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBuild {
    pub ranges: Vec<Option<DimensionRange>>,
    /// Dimensions whose start preset was applied.
    pub consumed: Vec<String>,
}

/// Previous resolution carried into the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderState {
    pub ranges: Vec<Option<DimensionRange>>,
    pub indices: Vec<Option<usize>>,
}

/// Parse a preset as an index inside `[0, max]`.
fn parse_index(value: &str, max: usize) -> Option<usize> {
    let parsed: f64 = value.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some((parsed.max(0.0).floor() as usize).min(max))
}

/// Build the ranges of a variable from its shape and dimension names.
///
/// Dimensions in `ignore` produce `None`. Single-element dimensions always yield
/// `{0, 0, 0}`. Bound presets override the shape-derived bounds; a start preset is
/// clamped into the final bounds.
pub fn build_dimension_ranges(
    shape: &[usize],
    names: &[String],
    ignore: &BTreeSet<usize>,
    presets: &DimensionPresets,
) -> Result<RangeBuild> {
    if names.len() != shape.len() {
        return Err(GridError::malformed(format!(
            "{} dimension names for shape {:?}",
            names.len(),
            shape
        )));
    }

    let mut consumed = Vec::new();
    let ranges = shape
        .iter()
        .zip(names)
        .enumerate()
        .map(|(i, (&size, name))| {
            if ignore.contains(&i) {
                return None;
            }
            if size <= 1 {
                return Some(DimensionRange {
                    name: name.clone(),
                    start_pos: 0,
                    min_bound: 0,
                    max_bound: 0,
                });
            }

            let last = size - 1;
            let max_bound = presets
                .max_bounds
                .get(name)
                .and_then(|v| parse_index(v, last))
                .unwrap_or(last);
            let min_bound = presets
                .min_bounds
                .get(name)
                .and_then(|v| parse_index(v, last))
                .unwrap_or(0)
                .min(max_bound);

            let start_pos = match presets.starts.get(name).and_then(|v| parse_index(v, last)) {
                Some(start) => {
                    consumed.push(name.clone());
                    start.clamp(min_bound, max_bound)
                }
                None => min_bound,
            };

            Some(DimensionRange {
                name: name.clone(),
                start_pos,
                min_bound,
                max_bound,
            })
        })
        .collect();

    Ok(RangeBuild { ranges, consumed })
}

/// [`build_dimension_ranges`] over a resolved variable.
pub fn build_for_variable(
    variable: &VariableHandle,
    ignore: &BTreeSet<usize>,
    presets: &DimensionPresets,
) -> Result<RangeBuild> {
    let names = variable.dimension_names().map_err(|e| match e {
        StoreError::MalformedMetadata(msg) => GridError::MalformedMetadata(msg),
        other => GridError::Store(other),
    })?;
    build_dimension_ranges(&variable.shape, &names, ignore, presets)
}

/// Indices to request for freshly built ranges.
///
/// - no previous state, or a length mismatch: every dimension starts at `start_pos`
/// - `preserve`: previous indices are reused as they are
/// - otherwise a dimension keeps its previous index only when its name and
///   `max_bound` are unchanged
pub fn materialize_indices(
    ranges: &[Option<DimensionRange>],
    previous: Option<&SliderState>,
    preserve: bool,
) -> Vec<Option<usize>> {
    let start_positions = || -> Vec<Option<usize>> {
        ranges
            .iter()
            .map(|r| r.as_ref().map(|r| r.start_pos))
            .collect()
    };

    let Some(previous) = previous else {
        return start_positions();
    };
    if previous.ranges.len() != ranges.len() || previous.indices.len() != ranges.len() {
        return start_positions();
    }

    if preserve {
        return previous.indices.clone();
    }

    ranges
        .iter()
        .zip(&previous.ranges)
        .zip(&previous.indices)
        .map(|((new, old), &old_index)| {
            let new = new.as_ref()?;
            match (old, old_index) {
                (Some(old), Some(index))
                    if old.name == new.name && old.max_bound == new.max_bound =>
                {
                    Some(new.clamp(index))
                }
                _ => Some(new.start_pos),
            }
        })
        .collect()
}

/// Dimensions loaded in full for a grid type: the trailing two axes of
/// two-dimensional grids, the trailing axis of unstructured ones.
pub fn spatial_ignore_set(grid_type: GridType, ndim: usize) -> BTreeSet<usize> {
    let spatial = match grid_type {
        GridType::Error => 0,
        t if t.is_two_dimensional() => 2,
        _ => 1,
    };
    (ndim.saturating_sub(spatial)..ndim).collect()
}

/// Selection reading one slice at the given indices (`None` reads the whole axis).
pub fn selection_for(indices: &[Option<usize>]) -> Vec<Selection> {
    indices.iter().map(|&i| Selection::from(i)).collect()
}
