//! Metadata dialects: consolidated `.zmetadata` and per-node documents.
//!
//! Opening a group probes the consolidated document first and falls back to the
//! per-node `.zgroup` document when the first probe fails structurally. Transport
//! failures are never treated as a format mismatch.

use std::collections::BTreeMap;
use std::fmt;

use geo_common::DatasetLocator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::array::ArrayLayout;
use super::{GroupHandle, VariableHandle};
use crate::backend::StoreBackend;
use crate::error::{Result, StoreError};

/// On-disk metadata convention a group was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataDialect {
    /// Single `.zmetadata` document for the whole hierarchy
    Consolidated,
    /// `.zgroup` / `.zattrs` / `.zarray` next to each node
    PerNode,
}

impl fmt::Display for MetadataDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataDialect::Consolidated => write!(f, "consolidated"),
            MetadataDialect::PerNode => write!(f, "per_node"),
        }
    }
}

/// Parsed `.zmetadata` document: node documents keyed relative to the group.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMetadata {
    documents: BTreeMap<String, Value>,
}

impl ConsolidatedMetadata {
    /// Parse a consolidated document.
    ///
    /// Anything that is not a consolidated zarr v2 document is a `FormatMismatch`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root: Value = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::format_mismatch(format!("consolidated document: {}", e)))?;

        if let Some(format) = root.get("zarr_consolidated_format") {
            if format.as_u64() != Some(1) {
                return Err(StoreError::format_mismatch(format!(
                    "zarr_consolidated_format {}",
                    format
                )));
            }
        }

        let metadata = root
            .get("metadata")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::format_mismatch("consolidated document has no metadata map"))?;

        let group = metadata
            .get(".zgroup")
            .ok_or_else(|| StoreError::format_mismatch("consolidated document has no .zgroup"))?;
        check_group_document(group)?;

        Ok(Self {
            documents: metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    pub(crate) fn group_attributes(&self) -> Map<String, Value> {
        self.documents
            .get(".zattrs")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    fn array(&self, name: &str) -> Option<&Value> {
        self.documents.get(&format!("{}/.zarray", name))
    }

    fn attributes(&self, name: &str) -> Map<String, Value> {
        self.documents
            .get(&format!("{}/.zattrs", name))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Names of every array described by the document.
    pub fn array_names(&self) -> Vec<String> {
        self.documents
            .keys()
            .filter_map(|key| key.strip_suffix("/.zarray"))
            .map(String::from)
            .collect()
    }
}

fn check_group_document(doc: &Value) -> Result<()> {
    match doc.get("zarr_format").and_then(Value::as_u64) {
        Some(2) => Ok(()),
        Some(other) => Err(StoreError::format_mismatch(format!(
            "group zarr_format {} is not 2",
            other
        ))),
        None => Err(StoreError::format_mismatch("group document has no zarr_format")),
    }
}

fn parse_json(bytes: &[u8], what: &str) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::format_mismatch(format!("{}: {}", what, e)))
}

fn parse_attributes(bytes: &[u8], what: &str) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::malformed(format!("{} is not an object", what))),
        Err(e) => Err(StoreError::malformed(format!("{}: {}", what, e))),
    }
}

/// Open the group at `locator`, trying the consolidated dialect first.
pub(crate) async fn open_group(
    backend: &dyn StoreBackend,
    locator: &DatasetLocator,
    consolidated_key: &str,
) -> Result<GroupHandle> {
    let consolidated_failure = match backend.get(&locator.node_key(consolidated_key)).await? {
        Some(bytes) => match ConsolidatedMetadata::parse(&bytes) {
            Ok(metadata) => {
                debug!(group = %locator, "Opened group from consolidated metadata");
                return Ok(GroupHandle::consolidated(locator.clone(), metadata));
            }
            Err(e) => {
                debug!(group = %locator, error = %e, "Consolidated metadata unusable, trying per-node documents");
                Some(e)
            }
        },
        None => None,
    };

    let group_key = locator.node_key(".zgroup");
    let per_node = match backend.get(&group_key).await? {
        Some(bytes) => parse_json(&bytes, ".zgroup").and_then(|doc| check_group_document(&doc)),
        None => {
            return Err(match consolidated_failure {
                Some(e) => e,
                None => StoreError::not_found(format!("no group at {}", locator)),
            })
        }
    };

    if let Err(per_node_err) = per_node {
        return Err(match consolidated_failure {
            Some(consolidated_err) => StoreError::format_mismatch(format!(
                "{}: consolidated ({}); per-node ({})",
                locator, consolidated_err, per_node_err
            )),
            None => per_node_err,
        });
    }

    let attributes = match backend.get(&locator.node_key(".zattrs")).await? {
        Some(bytes) => parse_attributes(&bytes, ".zattrs")?,
        None => Map::new(),
    };

    debug!(group = %locator, "Opened group from per-node documents");
    Ok(GroupHandle::per_node(locator.clone(), attributes))
}

/// Resolve array `name` inside an opened group.
pub(crate) async fn open_variable(
    backend: &dyn StoreBackend,
    group: &GroupHandle,
    name: &str,
) -> Result<VariableHandle> {
    let name = name.trim_matches('/');
    let locator = group.locator.clone();

    if let Some(metadata) = &group.consolidated {
        let doc = metadata
            .array(name)
            .ok_or_else(|| StoreError::not_found(format!("variable {} in {}", name, locator)))?;
        let layout = ArrayLayout::from_value(doc, &locator.node_key(name))?;
        return Ok(VariableHandle::new(locator, name, layout, metadata.attributes(name)));
    }

    let array_key = locator.node_key(&format!("{}/.zarray", name));
    let bytes = backend
        .get(&array_key)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("variable {} in {}", name, locator)))?;
    let doc: Value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::malformed(format!("{}: {}", array_key, e)))?;
    let layout = ArrayLayout::from_value(&doc, &locator.node_key(name))?;

    let attrs_key = locator.node_key(&format!("{}/.zattrs", name));
    let attributes = match backend.get(&attrs_key).await? {
        Some(bytes) => parse_attributes(&bytes, &attrs_key)?,
        None => Map::new(),
    };

    Ok(VariableHandle::new(locator, name, layout, attributes))
}

/// Names of the arrays directly or transitively described by a group.
pub(crate) async fn list_arrays(backend: &dyn StoreBackend, group: &GroupHandle) -> Result<Vec<String>> {
    if let Some(metadata) = &group.consolidated {
        return Ok(metadata.array_names());
    }

    let mut names = Vec::new();
    for child in backend.list_dir(&group.locator.node_key("")).await? {
        if child.starts_with('.') {
            continue;
        }
        let entries = backend
            .list_dir(&group.locator.node_key(&child))
            .await?;
        if entries.iter().any(|entry| entry == ".zarray") {
            names.push(child);
        }
    }
    Ok(names)
}
