//! The probes of the grid classification chain.

use std::collections::HashSet;

use async_trait::async_trait;
use chunk_store::{ChunkedArrayStore, TypedBuffer, VariableHandle};
use geo_common::{DatasetLocator, GridType};
use std::sync::Arc;
use tracing::debug;

use crate::config::TopologyConfig;
use crate::error::{GridError, Result};

/// Message of the terminal classification failure.
pub const NO_MATCH: &str = "no matching grid type found";

/// Everything a probe may look at.
pub struct ProbeContext<'a> {
    pub store: &'a ChunkedArrayStore,
    /// Group holding the grid description (coordinates, connectivity)
    pub grid_source: &'a DatasetLocator,
    /// Group holding the variable
    pub variable_source: &'a DatasetLocator,
    pub variable: &'a str,
    pub config: &'a TopologyConfig,
}

impl ProbeContext<'_> {
    /// Resolve `name` in the grid source, then in the variable source.
    ///
    /// `Ok(None)` when neither holds it; other failures propagate.
    async fn find(&self, name: &str) -> Result<Option<(DatasetLocator, Arc<VariableHandle>)>> {
        for locator in [self.grid_source, self.variable_source] {
            match self.store.resolve_variable(locator, name).await {
                Ok(handle) => return Ok(Some((locator.clone(), handle))),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

/// One step of the classification chain.
///
/// Returns `Ok(Some(tag))` on a match and `Ok(None)` to pass to the next probe.
#[async_trait]
pub trait GridProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<GridType>>;
}

/// Matches when the grid source holds a cell connectivity array.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangularProbe;

#[async_trait]
impl GridProbe for TriangularProbe {
    fn name(&self) -> &'static str {
        "triangular"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<GridType>> {
        match ctx
            .store
            .resolve_variable(ctx.grid_source, &ctx.config.connectivity_variable)
            .await
        {
            Ok(_) => Ok(Some(GridType::Triangular)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Matches healpix and rotated-pole grids declared through a grid-mapping variable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridMappingProbe;

/// Name of the grid-mapping variable referenced by a `grid_mapping` attribute.
///
/// `"crs: lat lon"` and `"crs"` both name `crs`.
pub fn grid_mapping_reference(attribute: &str) -> Option<&str> {
    attribute
        .split(':')
        .next()
        .and_then(|head| head.split_whitespace().next())
}

#[async_trait]
impl GridProbe for GridMappingProbe {
    fn name(&self) -> &'static str {
        "grid_mapping"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<GridType>> {
        let variable = ctx
            .store
            .resolve_variable(ctx.variable_source, ctx.variable)
            .await?;

        let mapping = variable
            .attribute_str("grid_mapping")
            .and_then(grid_mapping_reference)
            .unwrap_or(ctx.config.default_grid_mapping.as_str())
            .to_string();

        let Some((_, crs)) = ctx.find(&mapping).await? else {
            return Ok(None);
        };

        Ok(match crs.attribute_str("grid_mapping_name") {
            Some("healpix") => Some(GridType::Healpix),
            Some("rotated_latitude_longitude") => Some(GridType::RegularRotated),
            _ => None,
        })
    }
}

/// Matches variables whose trailing dimensions are named latitude then longitude.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxisNameProbe;

#[async_trait]
impl GridProbe for AxisNameProbe {
    fn name(&self) -> &'static str {
        "axis_names"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<GridType>> {
        let variable = ctx
            .store
            .resolve_variable(ctx.variable_source, ctx.variable)
            .await?;
        let names = variable.dimension_names()?;

        Ok(match names.as_slice() {
            [.., lat, lon] if ctx.config.is_latitude_axis(lat) && ctx.config.is_longitude_axis(lon) => {
                Some(GridType::Regular)
            }
            _ => None,
        })
    }
}

/// Classifies by the shape and values of the latitude/longitude coordinate arrays.
///
/// Terminal probe: fails with [`NO_MATCH`] when no signature fits.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateShapeProbe;

impl CoordinateShapeProbe {
    async fn coordinates(&self, ctx: &ProbeContext<'_>) -> Result<(Arc<TypedBuffer>, Arc<TypedBuffer>)> {
        let variable = ctx
            .store
            .resolve_variable(ctx.variable_source, ctx.variable)
            .await?;

        // names listed in the variable's `coordinates` attribute come first
        let declared: Vec<String> = variable
            .attribute_str("coordinates")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        let lat = self
            .read_first(ctx, &declared, &ctx.config.latitude_coordinates)
            .await?;
        let lon = self
            .read_first(ctx, &declared, &ctx.config.longitude_coordinates)
            .await?;
        Ok((lat, lon))
    }

    async fn read_first(
        &self,
        ctx: &ProbeContext<'_>,
        declared: &[String],
        candidates: &[String],
    ) -> Result<Arc<TypedBuffer>> {
        let ordered = declared
            .iter()
            .filter(|name| candidates.contains(*name))
            .chain(candidates.iter());

        for name in ordered {
            if let Some((locator, _)) = ctx.find(name).await? {
                return Ok(ctx.store.read_all(&locator, name).await?);
            }
        }
        Err(GridError::Unclassifiable(format!(
            "no coordinate array among {:?}",
            candidates
        )))
    }
}

/// Number of distinct values, treating `-0.0` as `0.0`.
pub fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|&v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect::<HashSet<_>>()
        .len()
}

/// Shape/value signature rules over coordinate arrays.
pub fn classify_coordinates(lat: &TypedBuffer, lon: &TypedBuffer) -> Option<GridType> {
    let lat_values = lat.to_f64();
    let lon_values = lon.to_f64();
    let distinct_lat = distinct_count(&lat_values);
    let distinct_lon = distinct_count(&lon_values);

    if lat.shape.len() == 2
        && lon.shape.len() == 2
        && distinct_lat != lat_values.len()
        && distinct_lon != lon_values.len()
    {
        return Some(GridType::Curvilinear);
    }

    let first_two_equal = lat_values.len() >= 2 && lat_values[0] == lat_values[1];
    if distinct_lat * distinct_lon != lat_values.len() * lon_values.len() && first_two_equal {
        return Some(GridType::GaussianReduced);
    }

    if lat_values.len() == lon_values.len() {
        return Some(GridType::Irregular);
    }

    None
}

#[async_trait]
impl GridProbe for CoordinateShapeProbe {
    fn name(&self) -> &'static str {
        "coordinate_shape"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>) -> Result<Option<GridType>> {
        let (lat, lon) = self.coordinates(ctx).await?;
        debug!(lat_shape = ?lat.shape, lon_shape = ?lon.shape, "Inspecting coordinate arrays");

        classify_coordinates(&lat, &lon)
            .map(Some)
            .ok_or_else(|| GridError::Unclassifiable(NO_MATCH.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunk_store::BufferData;
    use test_utils::{curvilinear_mesh, meshgrid, reduced_gaussian_cells, regular_axes, scattered_cells};

    fn buffer(shape: &[usize], values: Vec<f64>) -> TypedBuffer {
        TypedBuffer {
            shape: shape.to_vec(),
            data: BufferData::Float64(values),
        }
    }

    #[test]
    fn test_grid_mapping_reference() {
        assert_eq!(grid_mapping_reference("crs"), Some("crs"));
        assert_eq!(grid_mapping_reference("crs: lat lon"), Some("crs"));
        assert_eq!(grid_mapping_reference(" rotated_pole "), Some("rotated_pole"));
        assert_eq!(grid_mapping_reference(""), None);
    }

    #[test]
    fn test_distinct_count() {
        assert_eq!(distinct_count(&[1.0, 1.0, 2.0, -0.0, 0.0]), 3);
    }

    #[test]
    fn test_curvilinear_signature() {
        let (lat, lon) = curvilinear_mesh(6, 8);
        let kind = classify_coordinates(&buffer(&[6, 8], lat), &buffer(&[6, 8], lon));
        assert_eq!(kind, Some(GridType::Curvilinear));
    }

    #[test]
    fn test_regular_meshgrid_in_two_dimensions_is_curvilinear() {
        let (lat, lon) = regular_axes(4, 8);
        let (lat2d, lon2d) = meshgrid(&lat, &lon);
        let kind = classify_coordinates(&buffer(&[4, 8], lat2d), &buffer(&[4, 8], lon2d));
        assert_eq!(kind, Some(GridType::Curvilinear));
    }

    #[test]
    fn test_reduced_gaussian_signature() {
        let (lat, lon) = reduced_gaussian_cells(&[4, 8, 12, 12, 8, 4]);
        let n = lat.len();
        let kind = classify_coordinates(&buffer(&[n], lat), &buffer(&[n], lon));
        assert_eq!(kind, Some(GridType::GaussianReduced));
    }

    #[test]
    fn test_irregular_signature() {
        let (lat, lon) = scattered_cells(100);
        let kind = classify_coordinates(&buffer(&[100], lat), &buffer(&[100], lon));
        assert_eq!(kind, Some(GridType::Irregular));
    }

    #[test]
    fn test_separable_axes_match_nothing() {
        let (lat, lon) = regular_axes(4, 8);
        assert_eq!(
            classify_coordinates(&buffer(&[4], lat), &buffer(&[8], lon)),
            None
        );
    }
}
