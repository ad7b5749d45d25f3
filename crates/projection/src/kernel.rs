//! Parallel per-sample path.
//!
//! Mirrors the vertex stage of the renderer: single precision, uniforms
//! computed once per spec, one independent evaluation per sample. Samples
//! that must not be drawn come back as a NaN triple.
//!
//! Every formula here must agree with [`crate::helper`] to within 1e-4.

use rayon::prelude::*;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

use crate::kind::{ProjectionKind, ProjectionSpec};

/// Marker for samples that must be omitted.
pub const INVALID: [f32; 3] = [f32::NAN, f32::NAN, f32::NAN];

const MERCATOR_LIMIT: f32 = 85.0 * PI / 180.0;
const CEA_K: f32 = 1.279_200_6;
const AZIMUTHAL_CLIP: f32 = 173.0 * PI / 180.0;

const ROBINSON_PLEN: [f32; 19] = [
    1.0000, 0.9986, 0.9954, 0.9900, 0.9822, 0.9730, 0.9600, 0.9427, 0.9216, 0.8962, 0.8679,
    0.8350, 0.7986, 0.7597, 0.7186, 0.6732, 0.6213, 0.5722, 0.5322,
];
const ROBINSON_PDFE: [f32; 19] = [
    0.0000, 0.0620, 0.1240, 0.1860, 0.2480, 0.3100, 0.3720, 0.4340, 0.4958, 0.5571, 0.6176,
    0.6769, 0.7346, 0.7903, 0.8435, 0.8936, 0.9394, 0.9761, 1.0000,
];

/// Per-spec constants, the equivalent of shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionKernel {
    kind: ProjectionKind,
    center_lon: f32,
    sin_center_lat: f32,
    cos_center_lat: f32,
    radius: f32,
}

impl ProjectionKernel {
    pub fn new(spec: &ProjectionSpec) -> Self {
        let center_lat = (spec.center.lat as f32).to_radians();
        Self {
            kind: spec.kind,
            center_lon: spec.center.lon as f32,
            sin_center_lat: center_lat.sin(),
            cos_center_lat: center_lat.cos(),
            radius: 1.0,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Project one sample given in degrees.
    #[inline]
    pub fn project(&self, lat: f32, lon: f32) -> [f32; 3] {
        let lon = wrap(lon);
        let r = self.radius;

        if self.kind == ProjectionKind::Globe {
            let (phi, lambda) = (lat.to_radians(), lon.to_radians());
            return [
                r * phi.cos() * lambda.cos(),
                r * phi.cos() * lambda.sin(),
                r * phi.sin(),
            ];
        }

        let (phi, lambda) = self.rotate(lat, lon);
        let (x, y) = match self.kind {
            ProjectionKind::Globe | ProjectionKind::Equirectangular => (lambda, phi),
            ProjectionKind::Mercator => {
                let phi = phi.clamp(-MERCATOR_LIMIT, MERCATOR_LIMIT);
                (lambda, (FRAC_PI_4 + 0.5 * phi).tan().ln())
            }
            ProjectionKind::CylindricalEqualArea => (lambda / CEA_K, phi.sin() * CEA_K),
            ProjectionKind::Robinson => {
                let deg = phi.abs().to_degrees();
                (
                    0.8487 * robinson_lookup(&ROBINSON_PLEN, deg) * lambda,
                    1.3523 * robinson_lookup(&ROBINSON_PDFE, deg) * phi.signum(),
                )
            }
            ProjectionKind::Mollweide => {
                let mut theta = phi;
                let rhs = PI * phi.sin();
                for _ in 0..5 {
                    let d = 2.0 + 2.0 * (2.0 * theta).cos();
                    if d.abs() < 1e-10 {
                        break;
                    }
                    theta -= (2.0 * theta + (2.0 * theta).sin() - rhs) / d;
                }
                (2.0 * SQRT_2 / PI * lambda * theta.cos(), SQRT_2 * theta.sin())
            }
            ProjectionKind::AzimuthalEquidistant => {
                let c = (phi.cos() * lambda.cos()).clamp(-1.0, 1.0).acos();
                if c > AZIMUTHAL_CLIP {
                    return INVALID;
                }
                let k = if c < 1e-6 { 1.0 } else { c / c.sin() };
                (k * phi.cos() * lambda.sin(), k * phi.sin())
            }
        };

        [x * r, -y * r, 0.0]
    }

    /// Center rotation; degrees in, radians out.
    #[inline]
    fn rotate(&self, lat: f32, lon: f32) -> (f32, f32) {
        let phi = lat.to_radians();
        let dlambda = (lon - self.center_lon).to_radians();

        let px = phi.cos() * dlambda.cos();
        let py = phi.cos() * dlambda.sin();
        let pz = phi.sin();

        let qx = px * self.cos_center_lat + pz * self.sin_center_lat;
        let qz = pz * self.cos_center_lat - px * self.sin_center_lat;

        let phi = qz.clamp(-1.0, 1.0).asin();
        let lambda = wrap(py.atan2(qx).to_degrees()).to_radians();
        (phi.clamp(-FRAC_PI_2, FRAC_PI_2), lambda)
    }

    /// Project `(lat, lon)` samples in parallel.
    pub fn project_points(&self, points: &[(f32, f32)]) -> Vec<[f32; 3]> {
        points
            .par_iter()
            .map(|&(lat, lon)| self.project(lat, lon))
            .collect()
    }

    /// Project the cross product of separable axes into packed position triples,
    /// latitude-major (`lats.len() * lons.len() * 3` floats).
    pub fn project_grid(&self, lats: &[f32], lons: &[f32]) -> Vec<f32> {
        let mut positions = vec![0.0f32; lats.len() * lons.len() * 3];
        if lons.is_empty() {
            return positions;
        }
        positions
            .par_chunks_mut(lons.len() * 3)
            .zip(lats.par_iter())
            .for_each(|(row, &lat)| {
                for (out, &lon) in row.chunks_exact_mut(3).zip(lons) {
                    out.copy_from_slice(&self.project(lat, lon));
                }
            });
        positions
    }
}

#[inline]
fn wrap(lon: f32) -> f32 {
    let w = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if w >= 180.0 {
        w - 360.0
    } else {
        w
    }
}

#[inline]
fn robinson_lookup(table: &[f32; 19], deg: f32) -> f32 {
    let deg = deg.clamp(0.0, 90.0);
    let i = ((deg / 5.0) as usize).min(16);
    let t = deg / 5.0 - i as f32;
    let (a, b, c) = (table[i], table[i + 1], table[i + 2]);
    0.5 * a * (t - 1.0) * (t - 2.0) - b * t * (t - 2.0) + 0.5 * c * t * (t - 1.0)
}

/// Whether a kernel output is the omission marker.
pub fn is_invalid(position: &[f32; 3]) -> bool {
    position.iter().any(|v| v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::LatLon;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(200.0), -160.0);
        assert_eq!(wrap(-200.0), 160.0);
        assert_eq!(wrap(180.0), -180.0);
    }

    #[test]
    fn test_invalid_marker_beyond_clip() {
        let kernel = ProjectionKernel::new(&ProjectionSpec::centered(
            ProjectionKind::AzimuthalEquidistant,
        ));
        assert!(is_invalid(&kernel.project(0.0, 178.0)));
        assert!(!is_invalid(&kernel.project(0.0, 100.0)));
    }

    #[test]
    fn test_project_grid_layout() {
        let kernel = ProjectionKernel::new(&ProjectionSpec::new(
            ProjectionKind::Equirectangular,
            LatLon::default(),
        ))
        .with_radius(2.0);
        let positions = kernel.project_grid(&[10.0, -10.0], &[0.0, 90.0, 200.0]);
        assert_eq!(positions.len(), 18);

        // second row, second column
        let p = &positions[(3 + 1) * 3..(3 + 1) * 3 + 3];
        assert_approx_eq!(p[0], 2.0 * 90f32.to_radians(), 1e-5);
        assert_approx_eq!(p[1], 2.0 * 10f32.to_radians(), 1e-5);
        assert_eq!(p[2], 0.0);

        // 200 wraps to -160
        assert_approx_eq!(positions[6], -2.0 * 160f32.to_radians(), 1e-5);
    }

    #[test]
    fn test_project_points_matches_single_projection() {
        let kernel = ProjectionKernel::new(&ProjectionSpec::new(
            ProjectionKind::Robinson,
            LatLon::new(20.0, 30.0),
        ));
        let points = [(0.0, 0.0), (45.0, 45.0), (-60.0, 170.0)];
        let projected = kernel.project_points(&points);
        for (p, &(lat, lon)) in projected.iter().zip(&points) {
            assert_eq!(*p, kernel.project(lat, lon));
        }
    }
}
