//! Dataset locators identifying a remote array group.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a remote array/group: a store root plus a dataset path inside it.
///
/// Locators are normalized on construction so that equal datasets produce equal
/// cache keys regardless of how many separators the caller used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawLocator")]
pub struct DatasetLocator {
    /// Store root, e.g. `https://data.example.org/run1.zarr`
    pub store: String,
    /// Path of the group inside the store, without leading or trailing `/`
    pub dataset: String,
}

#[derive(Deserialize)]
struct RawLocator {
    store: String,
    #[serde(default)]
    dataset: String,
}

impl From<RawLocator> for DatasetLocator {
    fn from(raw: RawLocator) -> Self {
        DatasetLocator::new(raw.store, raw.dataset)
    }
}

impl DatasetLocator {
    /// Create a normalized locator.
    pub fn new(store: impl AsRef<str>, dataset: impl AsRef<str>) -> Self {
        Self {
            store: normalize_store(store.as_ref()),
            dataset: normalize_path(dataset.as_ref()),
        }
    }

    /// Locator for the root group of a store.
    pub fn root(store: impl AsRef<str>) -> Self {
        Self::new(store, "")
    }

    /// Cache key: normalized store concatenated with the dataset path.
    pub fn cache_key(&self) -> String {
        if self.dataset.is_empty() {
            self.store.clone()
        } else {
            format!("{}/{}", self.store, self.dataset)
        }
    }

    /// Key of a document or chunk relative to the store root.
    ///
    /// `node_key("tas/.zarray")` on dataset `atm/2d` yields `atm/2d/tas/.zarray`.
    pub fn node_key(&self, relative: &str) -> String {
        let relative = normalize_path(relative);
        match (self.dataset.is_empty(), relative.is_empty()) {
            (true, _) => relative,
            (false, true) => self.dataset.clone(),
            (false, false) => format!("{}/{}", self.dataset, relative),
        }
    }
}

impl fmt::Display for DatasetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

/// Strip trailing separators and collapse repeated ones in the path part of a store root.
///
/// The `scheme://` prefix keeps its double slash.
fn normalize_store(store: &str) -> String {
    let trimmed = store.trim();
    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let path = collapse_separators(rest);
            format!("{}://{}", scheme, path.trim_end_matches('/'))
        }
        None => {
            let leading = trimmed.starts_with('/');
            let path = normalize_path(trimmed);
            if leading {
                format!("/{}", path)
            } else {
                path
            }
        }
    }
}

/// Collapse repeated `/` and strip leading/trailing ones.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
