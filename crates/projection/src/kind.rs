//! Projection kinds and view centers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown projection name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown projection kind: {0}")]
pub struct ParseProjectionError(pub String);

/// The supported projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Orthographic sphere, the 3-D view
    Globe,
    Equirectangular,
    Mercator,
    CylindricalEqualArea,
    Robinson,
    Mollweide,
    AzimuthalEquidistant,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 7] = [
        ProjectionKind::Globe,
        ProjectionKind::Equirectangular,
        ProjectionKind::Mercator,
        ProjectionKind::CylindricalEqualArea,
        ProjectionKind::Robinson,
        ProjectionKind::Mollweide,
        ProjectionKind::AzimuthalEquidistant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionKind::Globe => "globe",
            ProjectionKind::Equirectangular => "equirectangular",
            ProjectionKind::Mercator => "mercator",
            ProjectionKind::CylindricalEqualArea => "cylindrical_equal_area",
            ProjectionKind::Robinson => "robinson",
            ProjectionKind::Mollweide => "mollweide",
            ProjectionKind::AzimuthalEquidistant => "azimuthal_equidistant",
        }
    }

    /// Every kind except the globe draws onto a plane.
    pub fn is_flat(&self) -> bool {
        !matches!(self, ProjectionKind::Globe)
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectionKind {
    type Err = ParseProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ProjectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseProjectionError(s.to_string()))
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A projection kind with the geographic point it is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub kind: ProjectionKind,
    pub center: LatLon,
}

impl ProjectionSpec {
    pub fn new(kind: ProjectionKind, center: LatLon) -> Self {
        Self { kind, center }
    }

    /// `kind` centered on (0, 0).
    pub fn centered(kind: ProjectionKind) -> Self {
        Self::new(kind, LatLon::default())
    }
}
