//! Histogram resolution and parallelism settings.

use serde::{Deserialize, Serialize};

/// Resolution of the canonical histogram kept per data slab.
pub const DEFAULT_BINS: usize = 4096;

/// Sample count from which [`crate::build`] switches to the parallel path.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Bins of the canonical histogram.
    pub num_bins: usize,

    /// Minimum number of samples for the rayon path.
    pub parallel_threshold: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_BINS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl HistogramConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HISTOGRAM_BINS") {
            if let Ok(n) = val.parse() {
                config.num_bins = n;
            }
        }

        if let Ok(val) = std::env::var("HISTOGRAM_PARALLEL_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.parallel_threshold = n;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_bins == 0 {
            return Err("num_bins must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HistogramConfig::default();
        assert_eq!(config.num_bins, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_bins_rejected() {
        let config = HistogramConfig {
            num_bins: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
