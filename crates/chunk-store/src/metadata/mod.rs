//! Group and variable handles resolved from zarr v2 metadata.

pub mod array;
pub mod dialect;

pub use array::ArrayLayout;
pub use dialect::{ConsolidatedMetadata, MetadataDialect};
pub use zarrs::array::DataType;

use std::sync::Arc;

use geo_common::DatasetLocator;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Attribute carrying per-axis dimension names (xarray convention).
pub const DIMENSIONS_ATTRIBUTE: &str = "_ARRAY_DIMENSIONS";

/// An opened group.
#[derive(Debug, Clone)]
pub struct GroupHandle {
    pub locator: DatasetLocator,
    pub dialect: MetadataDialect,
    pub attributes: Map<String, Value>,
    pub(crate) consolidated: Option<Arc<ConsolidatedMetadata>>,
}

impl GroupHandle {
    pub(crate) fn consolidated(locator: DatasetLocator, metadata: ConsolidatedMetadata) -> Self {
        Self {
            attributes: metadata.group_attributes(),
            locator,
            dialect: MetadataDialect::Consolidated,
            consolidated: Some(Arc::new(metadata)),
        }
    }

    pub(crate) fn per_node(locator: DatasetLocator, attributes: Map<String, Value>) -> Self {
        Self {
            locator,
            dialect: MetadataDialect::PerNode,
            attributes,
            consolidated: None,
        }
    }
}

/// Metadata-only descriptor of an array.
///
/// Immutable once resolved; the store hands out shared references.
#[derive(Debug, Clone)]
pub struct VariableHandle {
    pub locator: DatasetLocator,
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DataType,
    pub attributes: Map<String, Value>,
    layout: ArrayLayout,
}

impl VariableHandle {
    pub fn new(
        locator: DatasetLocator,
        name: impl Into<String>,
        layout: ArrayLayout,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            locator,
            name: name.into(),
            shape: layout.shape.clone(),
            dtype: layout.data_type.clone(),
            attributes,
            layout,
        }
    }

    pub fn layout(&self) -> &ArrayLayout {
        &self.layout
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension names, one per axis.
    ///
    /// Missing names or a count that differs from the rank is an upstream data
    /// contract violation and fails with `MalformedMetadata`.
    pub fn dimension_names(&self) -> Result<Vec<String>> {
        let value = self.attributes.get(DIMENSIONS_ATTRIBUTE).ok_or_else(|| {
            StoreError::malformed(format!(
                "{}: no {} attribute for shape {:?}",
                self.name, DIMENSIONS_ATTRIBUTE, self.shape
            ))
        })?;

        let names = value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(String::from))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                StoreError::malformed(format!(
                    "{}: {} is not a list of strings",
                    self.name, DIMENSIONS_ATTRIBUTE
                ))
            })?;

        if names.len() != self.shape.len() {
            return Err(StoreError::malformed(format!(
                "{}: {} dimension names for shape {:?}",
                self.name,
                names.len(),
                self.shape
            )));
        }
        Ok(names)
    }

    /// Fill sentinel: the array's `fill_value`, else the `_FillValue` attribute.
    pub fn fill_value(&self) -> Option<f64> {
        self.layout
            .fill_value
            .or_else(|| self.numeric_attribute("_FillValue"))
    }

    /// `missing_value` attribute (first element when given as a list).
    pub fn missing_value(&self) -> Option<f64> {
        self.numeric_attribute("missing_value")
    }

    pub fn units(&self) -> Option<&str> {
        self.attribute_str("units")
    }

    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    fn numeric_attribute(&self, name: &str) -> Option<f64> {
        let value = self.attributes.get(name)?;
        let scalar = match value {
            Value::Array(items) => items.first()?,
            other => other,
        };
        array::parse_fill_value(scalar).ok().flatten()
    }
}
