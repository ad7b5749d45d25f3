//! Stateful dimension resolver carrying slider state between variables.

use std::collections::{BTreeMap, BTreeSet};

use chunk_store::VariableHandle;
use geo_common::GridType;
use tracing::debug;

use super::{
    build_dimension_ranges, build_for_variable, materialize_indices, spatial_ignore_set,
    DimensionPresets, DimensionRange, RangeBuild, SliderState,
};
use crate::error::{GridError, Result};

/// Result of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ranges: Vec<Option<DimensionRange>>,
    pub indices: Vec<Option<usize>>,
    /// Dimensions whose start preset was applied by this call.
    pub consumed_presets: Vec<String>,
}

/// Resolves dimension ranges for the active variable and keeps the slider state.
///
/// Start presets are consumed by the first resolution after they are supplied,
/// whether or not they matched a dimension; a later variable switch never
/// re-applies them. Bound presets persist until replaced.
#[derive(Debug, Default)]
pub struct DimensionRangeResolver {
    pending_starts: Option<BTreeMap<String, String>>,
    min_bounds: BTreeMap<String, String>,
    max_bounds: BTreeMap<String, String>,
    state: Option<SliderState>,
}

impl DimensionRangeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presets(presets: DimensionPresets) -> Self {
        let mut resolver = Self::new();
        resolver.supply_presets(presets);
        resolver
    }

    /// Supply presets for the next resolution (e.g. from a deep link).
    pub fn supply_presets(&mut self, presets: DimensionPresets) {
        self.pending_starts = if presets.starts.is_empty() {
            None
        } else {
            Some(presets.starts)
        };
        self.min_bounds = presets.min_bounds;
        self.max_bounds = presets.max_bounds;
    }

    /// Whether start presets are waiting to be applied.
    pub fn has_pending_starts(&self) -> bool {
        self.pending_starts.is_some()
    }

    /// Ranges and indices for a variable with the given shape and dimension names.
    pub fn resolve(
        &mut self,
        shape: &[usize],
        names: &[String],
        ignore: &BTreeSet<usize>,
        preserve: bool,
    ) -> Result<Resolution> {
        let presets = self.take_presets();
        let build = build_dimension_ranges(shape, names, ignore, &presets);
        self.finish(build, presets, preserve)
    }

    /// Resolve a store variable, ignoring the spatial axes of `grid_type`.
    pub fn resolve_variable(
        &mut self,
        variable: &VariableHandle,
        grid_type: GridType,
        preserve: bool,
    ) -> Result<Resolution> {
        let ignore = spatial_ignore_set(grid_type, variable.ndim());
        let presets = self.take_presets();
        let build = build_for_variable(variable, &ignore, &presets);
        self.finish(build, presets, preserve)
    }

    /// Move the slider of dimension `dim`; the value is clamped into its bounds.
    pub fn set_index(&mut self, dim: usize, value: usize) -> Result<usize> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| GridError::UnknownDimension(format!("{} (nothing resolved)", dim)))?;

        let range = state
            .ranges
            .get(dim)
            .and_then(Option::as_ref)
            .ok_or_else(|| GridError::UnknownDimension(format!("{} is not navigable", dim)))?;

        let clamped = range.clamp(value);
        state.indices[dim] = Some(clamped);
        Ok(clamped)
    }

    pub fn state(&self) -> Option<&SliderState> {
        self.state.as_ref()
    }

    pub fn indices(&self) -> Vec<Option<usize>> {
        self.state
            .as_ref()
            .map(|s| s.indices.clone())
            .unwrap_or_default()
    }

    /// Forget slider state and presets.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn take_presets(&mut self) -> DimensionPresets {
        DimensionPresets {
            starts: self.pending_starts.take().unwrap_or_default(),
            min_bounds: self.min_bounds.clone(),
            max_bounds: self.max_bounds.clone(),
        }
    }

    fn finish(
        &mut self,
        build: Result<RangeBuild>,
        presets: DimensionPresets,
        preserve: bool,
    ) -> Result<Resolution> {
        let build = match build {
            Ok(build) => build,
            Err(e) => {
                // nothing was applied; keep the presets for the next attempt
                if !presets.starts.is_empty() {
                    self.pending_starts = Some(presets.starts);
                }
                return Err(e);
            }
        };

        let indices = materialize_indices(&build.ranges, self.state.as_ref(), preserve);
        if !build.consumed.is_empty() {
            debug!(consumed = ?build.consumed, "Applied start presets");
        }

        self.state = Some(SliderState {
            ranges: build.ranges.clone(),
            indices: indices.clone(),
        });

        Ok(Resolution {
            ranges: build.ranges,
            indices,
            consumed_presets: build.consumed,
        })
    }
}
