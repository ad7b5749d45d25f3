//! Scalar reference path.
//!
//! Double precision, one point at a time. Used for camera framing, picking
//! and as the reference the parallel kernel is checked against.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

use crate::kind::{LatLon, ProjectionKind, ProjectionSpec};
use crate::robinson;
use crate::rotation::{normalize_longitude, rotate_from_center, rotate_to_center};

/// Mercator latitude limit, degrees.
pub const MERCATOR_MAX_LAT: f64 = 85.0;

/// Cylindrical equal-area stretch factor.
pub const CEA_K: f64 = 1.2792006328649603;

/// Angular distance beyond which azimuthal samples are not drawn, degrees.
pub const AZIMUTHAL_CLIP: f64 = 173.0;

pub const MOLLWEIDE_ITERATIONS: usize = 5;

/// Mollweide auxiliary angle: solves `2t + sin(2t) = pi * sin(lat)` by Newton.
pub fn mollweide_theta(lat: f64) -> f64 {
    let target = PI * lat.sin();
    let mut theta = lat;
    for _ in 0..MOLLWEIDE_ITERATIONS {
        let derivative = 2.0 + 2.0 * (2.0 * theta).cos();
        if derivative.abs() < 1e-10 {
            break;
        }
        theta -= (2.0 * theta + (2.0 * theta).sin() - target) / derivative;
    }
    theta
}

/// Forward formula of a flat kind on center-rotated radians.
///
/// Returns the raw `(x, y)` before the output flip, or `None` where the
/// point must not be drawn.
pub fn project_rotated(kind: ProjectionKind, lat: f64, lon: f64) -> Option<(f64, f64)> {
    match kind {
        ProjectionKind::Globe => None,
        ProjectionKind::Equirectangular => Some((lon, lat)),
        ProjectionKind::Mercator => {
            let lat = lat.clamp(-MERCATOR_MAX_LAT.to_radians(), MERCATOR_MAX_LAT.to_radians());
            Some((lon, (FRAC_PI_4 + lat / 2.0).tan().ln()))
        }
        ProjectionKind::CylindricalEqualArea => Some((lon / CEA_K, lat.sin() * CEA_K)),
        ProjectionKind::Robinson => Some(robinson::forward(lat, lon)),
        ProjectionKind::Mollweide => {
            let theta = mollweide_theta(lat);
            Some((2.0 * SQRT_2 / PI * lon * theta.cos(), SQRT_2 * theta.sin()))
        }
        ProjectionKind::AzimuthalEquidistant => {
            let c = (lat.cos() * lon.cos()).clamp(-1.0, 1.0).acos();
            if c > AZIMUTHAL_CLIP.to_radians() {
                return None;
            }
            let k = if c < 1e-12 { 1.0 } else { c / c.sin() };
            Some((k * lat.cos() * lon.sin(), k * lat.sin()))
        }
    }
}

/// Inverse of [`project_rotated`]; radians in, rotated radians out.
pub fn unproject_rotated(kind: ProjectionKind, x: f64, y: f64) -> Option<(f64, f64)> {
    let (lat, lon) = match kind {
        ProjectionKind::Globe => return None,
        ProjectionKind::Equirectangular => (y, x),
        ProjectionKind::Mercator => {
            let lat = 2.0 * y.exp().atan() - FRAC_PI_2;
            if lat.abs() > MERCATOR_MAX_LAT.to_radians() + 1e-9 {
                return None;
            }
            (lat, x)
        }
        ProjectionKind::CylindricalEqualArea => {
            let s = y / CEA_K;
            if s.abs() > 1.0 {
                return None;
            }
            (s.asin(), x * CEA_K)
        }
        ProjectionKind::Robinson => robinson::inverse(x, y)?,
        ProjectionKind::Mollweide => {
            let s = y / SQRT_2;
            if s.abs() > 1.0 {
                return None;
            }
            let theta = s.asin();
            let lat = ((2.0 * theta + (2.0 * theta).sin()) / PI).clamp(-1.0, 1.0).asin();
            let lon = if theta.cos() < 1e-12 {
                0.0
            } else {
                PI * x / (2.0 * SQRT_2 * theta.cos())
            };
            (lat, lon)
        }
        ProjectionKind::AzimuthalEquidistant => {
            let rho = x.hypot(y);
            if rho > AZIMUTHAL_CLIP.to_radians() {
                return None;
            }
            if rho < 1e-12 {
                (0.0, 0.0)
            } else {
                let (sin_c, cos_c) = rho.sin_cos();
                ((y * sin_c / rho).clamp(-1.0, 1.0).asin(), (x * sin_c).atan2(rho * cos_c))
            }
        }
    };

    if lat.abs() > FRAC_PI_2 + 1e-9 || lon.abs() > PI + 1e-9 {
        return None;
    }
    Some((lat, lon))
}

/// Reference projector for one [`ProjectionSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionHelper {
    spec: ProjectionSpec,
    radius: f64,
}

impl ProjectionHelper {
    pub fn new(spec: ProjectionSpec) -> Self {
        Self { spec, radius: 1.0 }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Project a point at the default radius; `None` when it must not be drawn.
    pub fn project(&self, lat: f64, lon: f64) -> Option<[f64; 3]> {
        self.project_with_radius(lat, lon, self.radius)
    }

    pub fn project_with_radius(&self, lat: f64, lon: f64, radius: f64) -> Option<[f64; 3]> {
        let lon = normalize_longitude(lon);

        if !self.spec.kind.is_flat() {
            let (lat, lon) = (lat.to_radians(), lon.to_radians());
            return Some([
                radius * lat.cos() * lon.cos(),
                radius * lat.cos() * lon.sin(),
                radius * lat.sin(),
            ]);
        }

        let rotated = rotate_to_center(LatLon::new(lat, lon), self.spec.center);
        let (x, y) = project_rotated(
            self.spec.kind,
            rotated.lat.to_radians(),
            rotated.lon.to_radians(),
        )?;
        Some([x * radius, -y * radius, 0.0])
    }

    /// Geographic position under a flat-mode output coordinate.
    ///
    /// `None` for the globe and for points outside the projected outline.
    pub fn invert(&self, x: f64, y: f64) -> Option<LatLon> {
        if !self.spec.kind.is_flat() || self.radius == 0.0 {
            return None;
        }
        let (lat, lon) = unproject_rotated(self.spec.kind, x / self.radius, -y / self.radius)?;
        let rotated = LatLon::new(lat.to_degrees(), normalize_longitude(lon.to_degrees()));
        Some(rotate_from_center(rotated, self.spec.center))
    }
}

/// [`ProjectionHelper::invert`] for a one-off spec and radius.
pub fn invert(spec: ProjectionSpec, x: f64, y: f64, radius: f64) -> Option<LatLon> {
    ProjectionHelper::new(spec).with_radius(radius).invert(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    fn centered(kind: ProjectionKind) -> ProjectionHelper {
        ProjectionHelper::new(ProjectionSpec::centered(kind))
    }

    #[test]
    fn test_globe_ignores_center() {
        let helper = ProjectionHelper::new(ProjectionSpec::new(
            ProjectionKind::Globe,
            LatLon::new(45.0, 90.0),
        ));
        let [x, y, z] = helper.with_radius(2.0).project(0.0, 90.0).unwrap();
        assert_approx_eq!(x, 0.0, 1e-12);
        assert_approx_eq!(y, 2.0, 1e-12);
        assert_approx_eq!(z, 0.0, 1e-12);
    }

    #[test]
    fn test_flat_output_flips_y() {
        let [x, y, z] = centered(ProjectionKind::Equirectangular)
            .project(30.0, 60.0)
            .unwrap();
        assert_approx_eq!(x, 60f64.to_radians(), 1e-12);
        assert_approx_eq!(y, -30f64.to_radians(), 1e-12);
        assert_eq!(z, 0.0);
    }

    #[test]
    fn test_mercator_clamps_latitude() {
        let helper = centered(ProjectionKind::Mercator);
        assert_eq!(helper.project(89.0, 0.0), helper.project(85.0, 0.0));
        let [_, y, _] = helper.project(85.0, 0.0).unwrap();
        assert_approx_eq!(y, -3.1313013, 1e-6);
    }

    #[test]
    fn test_cylindrical_equal_area() {
        let [x, y, _] = centered(ProjectionKind::CylindricalEqualArea)
            .project(90.0, 180.0)
            .unwrap();
        // 180 wraps to -180
        assert_approx_eq!(x, -PI / CEA_K, 1e-12);
        assert_approx_eq!(y, -CEA_K, 1e-12);
    }

    #[test]
    fn test_mollweide_extent() {
        let helper = centered(ProjectionKind::Mollweide);
        let [x, _, _] = helper.project(0.0, -180.0).unwrap();
        assert_approx_eq!(x, -2.0 * SQRT_2, 1e-9);
        let [_, y, _] = helper.project(90.0, 0.0).unwrap();
        assert_approx_eq!(y, -SQRT_2, 1e-9);
    }

    #[test]
    fn test_azimuthal_clip() {
        let helper = centered(ProjectionKind::AzimuthalEquidistant);
        assert!(helper.project(0.0, 172.0).is_some());
        assert!(helper.project(0.0, 175.0).is_none());
        assert!(helper.project(0.0, -179.0).is_none());

        let [x, y, _] = helper.project(0.0, 90.0).unwrap();
        assert_approx_eq!(x, FRAC_PI_2, 1e-12);
        assert_approx_eq!(y, 0.0, 1e-12);
    }

    #[test]
    fn test_center_projects_to_origin() {
        let center = LatLon::new(-33.9, 18.4);
        for kind in ProjectionKind::ALL.into_iter().filter(|k| k.is_flat()) {
            let helper = ProjectionHelper::new(ProjectionSpec::new(kind, center));
            let [x, y, _] = helper.project(center.lat, center.lon).unwrap();
            assert_coords_approx_eq!((x, y), (0.0, 0.0), 1e-9);
        }
    }

    #[test]
    fn test_invert_globe_is_undefined() {
        assert!(centered(ProjectionKind::Globe).invert(0.0, 0.0).is_none());
    }

    #[test]
    fn test_invert_outside_outline() {
        assert!(centered(ProjectionKind::Equirectangular).invert(4.0, 0.0).is_none());
        assert!(centered(ProjectionKind::Mollweide).invert(0.0, 1.5).is_none());
        assert!(centered(ProjectionKind::AzimuthalEquidistant).invert(3.1, 0.0).is_none());
    }
}
