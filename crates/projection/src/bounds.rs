//! Extent of the projected sphere, for sizing the flat-mode canvas.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::debug;

use crate::helper::{project_rotated, AZIMUTHAL_CLIP};
use crate::kind::{ProjectionKind, ProjectionSpec};

/// Samples along each outline segment.
pub const OUTLINE_SAMPLES: usize = 720;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// `width / height`
    pub aspect: f64,
}

impl ProjectedBounds {
    fn from_extent(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        let width = max_x - min_x;
        let height = max_y - min_y;
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            width,
            height,
            center_x: 0.5 * (min_x + max_x),
            center_y: 0.5 * (min_y + max_y),
            aspect: if height > 0.0 { width / height } else { 0.0 },
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Rotated-frame points (radians) tracing the edge of the projected world.
fn outline(kind: ProjectionKind) -> Vec<(f64, f64)> {
    let n = OUTLINE_SAMPLES;
    let step = |i: usize| i as f64 / n as f64;

    if kind == ProjectionKind::AzimuthalEquidistant {
        let (sin_c, cos_c) = (AZIMUTHAL_CLIP.to_radians() - 1e-9).sin_cos();
        return (0..n)
            .map(|i| {
                let azimuth = 2.0 * PI * step(i);
                ((sin_c * azimuth.sin()).asin(), (sin_c * azimuth.cos()).atan2(cos_c))
            })
            .collect();
    }

    let east = PI - 1e-12;
    let mut points = Vec::with_capacity(5 * (n + 1));
    for i in 0..=n {
        let lat = -FRAC_PI_2 + PI * step(i);
        points.push((lat, -PI));
        points.push((lat, east));
    }
    for i in 0..=n {
        let lon = -PI + (PI + east) * step(i);
        points.push((FRAC_PI_2, lon));
        points.push((0.0, lon));
        points.push((-FRAC_PI_2, lon));
    }
    points
}

/// Bounds of the whole sphere under `spec`, in the output frame at `radius`.
pub fn projected_bounds(spec: &ProjectionSpec, radius: f64) -> ProjectedBounds {
    if !spec.kind.is_flat() {
        return ProjectedBounds::from_extent(-radius, radius, -radius, radius);
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (lat, lon) in outline(spec.kind) {
        let Some((x, y)) = project_rotated(spec.kind, lat, lon) else {
            continue;
        };
        let (x, y) = (x * radius, -y * radius);
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let bounds = ProjectedBounds::from_extent(min_x, max_x, min_y, max_y);
    debug!(kind = %spec.kind, width = bounds.width, height = bounds.height, "Computed projected bounds");
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::LatLon;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_equirectangular_bounds() {
        let b = projected_bounds(&ProjectionSpec::centered(ProjectionKind::Equirectangular), 1.0);
        assert_approx_eq!(b.min_x, -PI, 1e-9);
        assert_approx_eq!(b.max_x, PI, 1e-9);
        assert_approx_eq!(b.min_y, -FRAC_PI_2, 1e-9);
        assert_approx_eq!(b.max_y, FRAC_PI_2, 1e-9);
        assert_approx_eq!(b.aspect, 2.0, 1e-9);
        assert_approx_eq!(b.center_x, 0.0, 1e-9);
    }

    #[test]
    fn test_bounds_do_not_depend_on_center() {
        let a = projected_bounds(&ProjectionSpec::centered(ProjectionKind::Robinson), 2.0);
        let b = projected_bounds(
            &ProjectionSpec::new(ProjectionKind::Robinson, LatLon::new(40.0, 100.0)),
            2.0,
        );
        assert_eq!(a, b);
        assert_approx_eq!(a.max_x, 2.0 * 0.8487 * PI, 1e-6);
        assert_approx_eq!(a.max_y, 2.0 * 1.3523, 1e-9);
    }

    #[test]
    fn test_mercator_height_is_clamped() {
        let b = projected_bounds(&ProjectionSpec::centered(ProjectionKind::Mercator), 1.0);
        assert_approx_eq!(b.max_y, 3.1313013, 1e-6);
        assert_approx_eq!(b.min_y, -3.1313013, 1e-6);
    }

    #[test]
    fn test_azimuthal_disc() {
        let b = projected_bounds(
            &ProjectionSpec::centered(ProjectionKind::AzimuthalEquidistant),
            1.0,
        );
        let clip = AZIMUTHAL_CLIP.to_radians();
        assert_approx_eq!(b.max_x, clip, 1e-6);
        assert_approx_eq!(b.min_y, -clip, 1e-6);
        assert_approx_eq!(b.aspect, 1.0, 1e-6);
    }

    #[test]
    fn test_globe_bounds() {
        let b = projected_bounds(&ProjectionSpec::centered(ProjectionKind::Globe), 3.0);
        assert_eq!(b.width, 6.0);
        assert!(b.contains(0.0, -3.0));
        assert!(!b.contains(3.1, 0.0));
    }
}
