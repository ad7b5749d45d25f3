//! Spatial grid topology tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommonError;

/// The spatial grid encoding of a dataset.
///
/// Produced once per dataset+variable pair and consumed by the geometry
/// builder to pick a vertex-generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    /// Separable lat/lon axes
    Regular,
    /// Regular grid on a rotated pole
    RegularRotated,
    /// Hierarchical equal-area pixelization
    Healpix,
    /// Triangular mesh with explicit connectivity
    Triangular,
    /// Gaussian grid with a variable number of points per latitude row
    GaussianReduced,
    /// Two-dimensional lat/lon coordinate fields
    Curvilinear,
    /// One coordinate pair per cell, no connectivity
    Irregular,
    /// Classification failed
    Error,
}

impl GridType {
    /// All tags in declaration order.
    pub const ALL: [GridType; 8] = [
        GridType::Regular,
        GridType::RegularRotated,
        GridType::Healpix,
        GridType::Triangular,
        GridType::GaussianReduced,
        GridType::Curvilinear,
        GridType::Irregular,
        GridType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::Regular => "regular",
            GridType::RegularRotated => "regular_rotated",
            GridType::Healpix => "healpix",
            GridType::Triangular => "triangular",
            GridType::GaussianReduced => "gaussian_reduced",
            GridType::Curvilinear => "curvilinear",
            GridType::Irregular => "irregular",
            GridType::Error => "error",
        }
    }

    /// Whether the grid stores its horizontal plane on two array axes.
    ///
    /// Unstructured grids flatten all cells onto a single trailing axis.
    pub fn is_two_dimensional(&self) -> bool {
        matches!(
            self,
            GridType::Regular | GridType::RegularRotated | GridType::Curvilinear
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GridType::Error)
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GridType {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| CommonError::UnknownGridType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for tag in GridType::ALL {
            assert_eq!(tag.as_str().parse::<GridType>().unwrap(), tag);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            "hexagonal".parse::<GridType>(),
            Err(CommonError::UnknownGridType(_))
        ));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&GridType::GaussianReduced).unwrap();
        assert_eq!(json, "\"gaussian_reduced\"");
    }

    #[test]
    fn test_two_dimensional() {
        assert!(GridType::Regular.is_two_dimensional());
        assert!(GridType::Curvilinear.is_two_dimensional());
        assert!(!GridType::Healpix.is_two_dimensional());
        assert!(!GridType::Error.is_two_dimensional());
    }
}
