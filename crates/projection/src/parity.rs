//! Agreement check between the scalar path and the parallel kernel.

use serde::Serialize;

use crate::helper::{ProjectionHelper, AZIMUTHAL_CLIP};
use crate::kernel::{is_invalid, ProjectionKernel};
use crate::kind::{LatLon, ProjectionKind, ProjectionSpec};
use crate::rotation::{normalize_longitude, rotate_to_center};

/// Largest tolerated absolute difference between the two paths.
pub const PARITY_TOLERANCE: f64 = 1e-4;

/// Whether a sample is away from the singularities where single precision
/// cannot follow the reference: the rotated poles, the rotated antimeridian,
/// the Mollweide polar caps and the azimuthal clip rim.
pub fn in_parity_domain(spec: &ProjectionSpec, lat: f64, lon: f64) -> bool {
    if !spec.kind.is_flat() {
        return true;
    }
    let rotated = rotate_to_center(LatLon::new(lat, normalize_longitude(lon)), spec.center);
    if rotated.lat.abs() > 88.0 || rotated.lon.abs() > 179.9 {
        return false;
    }
    match spec.kind {
        ProjectionKind::Mollweide => rotated.lat.abs() <= 80.0,
        ProjectionKind::AzimuthalEquidistant => {
            let c = (rotated.lat.to_radians().cos() * rotated.lon.to_radians().cos())
                .clamp(-1.0, 1.0)
                .acos()
                .to_degrees();
            (c - AZIMUTHAL_CLIP).abs() > 3.0
        }
        _ => true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParityReport {
    pub kind: ProjectionKind,
    pub compared: usize,
    pub skipped: usize,
    /// Samples where exactly one path declared the point undrawable.
    pub validity_mismatches: usize,
    pub max_deviation: f64,
    pub worst: Option<LatLon>,
}

impl ParityReport {
    pub fn passes(&self) -> bool {
        self.validity_mismatches == 0 && self.max_deviation <= PARITY_TOLERANCE
    }
}

/// Project `points` (`(lat, lon)` degrees) through both paths and compare.
pub fn check_parity(spec: &ProjectionSpec, points: &[(f64, f64)]) -> ParityReport {
    let helper = ProjectionHelper::new(*spec);
    let kernel = ProjectionKernel::new(spec);

    let (inside, skipped): (Vec<(f64, f64)>, Vec<(f64, f64)>) = points
        .iter()
        .partition(|&&(lat, lon)| in_parity_domain(spec, lat, lon));

    let single: Vec<(f32, f32)> = inside
        .iter()
        .map(|&(lat, lon)| (lat as f32, lon as f32))
        .collect();
    let parallel = kernel.project_points(&single);

    let mut report = ParityReport {
        kind: spec.kind,
        compared: inside.len(),
        skipped: skipped.len(),
        validity_mismatches: 0,
        max_deviation: 0.0,
        worst: None,
    };

    for (&(lat, lon), fast) in inside.iter().zip(&parallel) {
        let deviation = match (helper.project(lat, lon), is_invalid(fast)) {
            (None, true) => continue,
            (Some(reference), false) => reference
                .iter()
                .zip(fast)
                .map(|(a, &b)| (a - b as f64).abs())
                .fold(0.0, f64::max),
            _ => {
                report.validity_mismatches += 1;
                report.worst.get_or_insert(LatLon::new(lat, lon));
                continue;
            }
        };
        if deviation > report.max_deviation {
            report.max_deviation = deviation;
            report.worst = Some(LatLon::new(lat, lon));
        }
    }
    report
}
