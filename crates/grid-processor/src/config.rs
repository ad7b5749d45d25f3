//! Configuration for grid topology classification.

use serde::{Deserialize, Serialize};

/// Names the classification probes look for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Cell connectivity array of triangular meshes.
    pub connectivity_variable: String,

    /// Coordinate-reference variable used when `grid_mapping` is not declared.
    pub default_grid_mapping: String,

    /// Trailing dimension names that identify a regular grid's latitude axis.
    pub latitude_axis_names: Vec<String>,

    /// Trailing dimension names that identify a regular grid's longitude axis.
    pub longitude_axis_names: Vec<String>,

    /// Candidate names of latitude coordinate arrays, in lookup order.
    pub latitude_coordinates: Vec<String>,

    /// Candidate names of longitude coordinate arrays, in lookup order.
    pub longitude_coordinates: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            connectivity_variable: "vertex_of_cell".to_string(),
            default_grid_mapping: "crs".to_string(),
            latitude_axis_names: names(&["lat", "latitude"]),
            longitude_axis_names: names(&["lon", "longitude"]),
            latitude_coordinates: names(&["lat", "latitude", "clat"]),
            longitude_coordinates: names(&["lon", "longitude", "clon"]),
        }
    }
}

impl TopologyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_CONNECTIVITY_VARIABLE") {
            config.connectivity_variable = val;
        }

        if let Ok(val) = std::env::var("GRID_DEFAULT_MAPPING") {
            config.default_grid_mapping = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.connectivity_variable.trim().is_empty() {
            return Err("connectivity_variable must not be empty".to_string());
        }

        if self.latitude_coordinates.is_empty() || self.longitude_coordinates.is_empty() {
            return Err("coordinate candidate lists must not be empty".to_string());
        }

        Ok(())
    }

    pub fn is_latitude_axis(&self, name: &str) -> bool {
        self.latitude_axis_names.iter().any(|n| n == name)
    }

    pub fn is_longitude_axis(&self, name: &str) -> bool {
        self.longitude_axis_names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TopologyConfig::default();
        assert_eq!(config.connectivity_variable, "vertex_of_cell");
        assert!(config.is_latitude_axis("latitude"));
        assert!(!config.is_latitude_axis("Lat"));
        assert!(!config.is_longitude_axis("clon"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TopologyConfig::default();
        config.connectivity_variable = " ".to_string();
        assert!(config.validate().is_err());
    }
}
