//! zarr v2 array documents (`.zarray`) and the zarrs arrays built from them.
//!
//! The document is checked for the structure this store relies on (format,
//! shape, chunk grid, fill value) and then handed to zarrs, which owns the
//! data type, codec chain and chunk key encoding.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use zarrs::array::{Array, ArrayMetadata, ArrayMetadataV2, DataType};
use zarrs_storage::store::MemoryStore;

use crate::buffer::BufferData;
use crate::error::{Result, StoreError};

/// Validated storage layout of one array node.
#[derive(Debug, Clone)]
pub struct ArrayLayout {
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub data_type: DataType,
    /// `fill_value` as written; `None` for `null`
    pub fill_value: Option<f64>,
    node_path: String,
    metadata: ArrayMetadataV2,
}

impl ArrayLayout {
    /// Validate the `.zarray` document of the array at `node_key` (relative to the store root).
    pub fn from_value(value: &Value, node_key: &str) -> Result<Self> {
        let doc = value
            .as_object()
            .ok_or_else(|| StoreError::malformed(format!("{}: .zarray is not an object", node_key)))?;

        match doc.get("zarr_format").and_then(Value::as_u64) {
            Some(2) => {}
            Some(other) => {
                return Err(StoreError::format_mismatch(format!(
                    "{}: zarr_format {} is not 2",
                    node_key, other
                )))
            }
            None => return Err(StoreError::malformed(format!("{}: no zarr_format", node_key))),
        }

        let shape = extents(doc.get("shape"), "shape", node_key)?;
        let chunks = extents(doc.get("chunks"), "chunks", node_key)?;
        if shape.len() != chunks.len() {
            return Err(StoreError::malformed(format!(
                "{}: chunks rank {} differs from shape rank {}",
                node_key,
                chunks.len(),
                shape.len()
            )));
        }
        if chunks.iter().any(|&c| c == 0) {
            return Err(StoreError::malformed(format!("{}: chunk extent of zero", node_key)));
        }

        let dtype = match doc.get("dtype") {
            Some(Value::String(dtype)) => dtype.clone(),
            Some(other) => return Err(StoreError::unsupported(format!("dtype {}", other))),
            None => return Err(StoreError::malformed(format!("{}: no dtype", node_key))),
        };
        let fill_value = parse_fill_value(doc.get("fill_value").unwrap_or(&Value::Null))?;

        let metadata: ArrayMetadataV2 = serde_json::from_value(Value::Object(normalized(doc, &dtype, fill_value)))
            .map_err(|e| StoreError::malformed(format!("{}: {}", node_key, e)))?;

        let node_path = format!("/{}", node_key.trim_matches('/'));

        // unknown codecs and dtypes fail here, at resolve time
        let array = open_array(Arc::new(MemoryStore::new()), &node_path, &metadata)?;
        let data_type = array.data_type().clone();
        BufferData::empty(&data_type)?;

        Ok(Self {
            shape,
            chunks,
            data_type,
            fill_value,
            node_path,
            metadata,
        })
    }

    /// The zarrs array of this node over `storage`.
    pub fn open(&self, storage: Arc<MemoryStore>) -> Result<Array<MemoryStore>> {
        open_array(storage, &self.node_path, &self.metadata)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.data_type, DataType::Float32 | DataType::Float64)
    }
}

fn open_array(
    storage: Arc<MemoryStore>,
    node_path: &str,
    metadata: &ArrayMetadataV2,
) -> Result<Array<MemoryStore>> {
    Array::new_with_metadata(storage, node_path, ArrayMetadata::V2(metadata.clone()))
        .map_err(|e| StoreError::unsupported(format!("{}: {}", node_path, e)))
}

fn extents(value: Option<&Value>, what: &str, node_key: &str) -> Result<Vec<usize>> {
    value
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_u64().map(|n| n as usize))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| StoreError::malformed(format!("{}: {} is not a list of extents", node_key, what)))
}

/// Fill in optional keys older writers omit.
///
/// A `null` fill reads back as NaN for floats and zero otherwise.
fn normalized(doc: &Map<String, Value>, dtype: &str, fill_value: Option<f64>) -> Map<String, Value> {
    let mut doc = doc.clone();
    doc.entry("order").or_insert_with(|| json!("C"));
    doc.entry("compressor").or_insert(Value::Null);
    doc.entry("filters").or_insert(Value::Null);
    if fill_value.is_none() {
        let fill = match dtype.get(1..2) {
            Some("f") => json!("NaN"),
            Some("b") => json!(false),
            _ => json!(0),
        };
        doc.insert("fill_value".to_string(), fill);
    }
    doc
}

/// Parse a JSON fill value (`null`, number, `"NaN"`, `"Infinity"`, `"-Infinity"`).
pub fn parse_fill_value(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(Some(f64::NAN)),
            "Infinity" => Ok(Some(f64::INFINITY)),
            "-Infinity" => Ok(Some(f64::NEG_INFINITY)),
            other => Err(StoreError::malformed(format!("fill_value {}", other))),
        },
        other => Err(StoreError::malformed(format!("fill_value {}", other))),
    }
}
