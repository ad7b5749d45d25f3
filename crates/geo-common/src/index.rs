//! Dataset index documents.
//!
//! The index is authored outside this system. It lists, per resolution level, where
//! the grid description, the time axis and each variable live. Only presence is
//! checked here; the document is otherwise taken as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CommonError, CommonResult};
use crate::locator::DatasetLocator;

/// A parsed dataset index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetIndex {
    /// Human readable name
    #[serde(default)]
    pub name: Option<String>,
    /// Resolution levels, finest first
    pub levels: Vec<IndexLevel>,
}

/// One resolution level of a dataset index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexLevel {
    /// Where the grid coordinates live
    pub grid: DatasetLocator,
    /// Where the time axis lives
    #[serde(default)]
    pub time: Option<DatasetLocator>,
    /// Variable name -> source locator
    #[serde(default)]
    pub datasources: BTreeMap<String, DatasetLocator>,
}

impl DatasetIndex {
    /// Parse and presence-check an index document.
    pub fn from_json(text: &str) -> CommonResult<Self> {
        let index: DatasetIndex = serde_json::from_str(text)?;
        index.validate()?;
        Ok(index)
    }

    /// Check that the document has the parts the core consumes.
    pub fn validate(&self) -> CommonResult<()> {
        if self.levels.is_empty() {
            return Err(CommonError::InvalidIndex("no levels".to_string()));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if level.grid.store.is_empty() {
                return Err(CommonError::InvalidIndex(format!(
                    "level {} has an empty grid store",
                    i
                )));
            }
            if let Some((name, _)) = level.datasources.iter().find(|(_, l)| l.store.is_empty()) {
                return Err(CommonError::InvalidIndex(format!(
                    "level {} variable '{}' has an empty store",
                    i, name
                )));
            }
        }
        Ok(())
    }

    pub fn level(&self, level: usize) -> CommonResult<&IndexLevel> {
        self.levels.get(level).ok_or(CommonError::LevelNotFound(level))
    }

    /// Source locator of a variable at a level.
    pub fn source_for(&self, level: usize, variable: &str) -> CommonResult<&DatasetLocator> {
        self.level(level)?
            .datasources
            .get(variable)
            .ok_or_else(|| CommonError::VariableNotListed(variable.to_string()))
    }

    /// Variable names available at a level, sorted.
    pub fn variables(&self, level: usize) -> CommonResult<Vec<&str>> {
        Ok(self
            .level(level)?
            .datasources
            .keys()
            .map(String::as_str)
            .collect())
    }
}
