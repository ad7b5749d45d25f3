//! Robinson projection coefficient table.
//!
//! The table lists, every 5 degrees of absolute latitude from 0 to 90, the
//! relative parallel length and the relative distance from the equator.
//! Values in between are interpolated quadratically through three
//! consecutive entries.

/// Latitude spacing of the table, degrees.
pub const BAND: f64 = 5.0;

/// Parallel length relative to the equator.
pub const PLEN: [f64; 19] = [
    1.0000, 0.9986, 0.9954, 0.9900, 0.9822, 0.9730, 0.9600, 0.9427, 0.9216, 0.8962, 0.8679,
    0.8350, 0.7986, 0.7597, 0.7186, 0.6732, 0.6213, 0.5722, 0.5322,
];

/// Distance of the parallel from the equator relative to the pole's.
pub const PDFE: [f64; 19] = [
    0.0000, 0.0620, 0.1240, 0.1860, 0.2480, 0.3100, 0.3720, 0.4340, 0.4958, 0.5571, 0.6176,
    0.6769, 0.7346, 0.7903, 0.8435, 0.8936, 0.9394, 0.9761, 1.0000,
];

pub const X_SCALE: f64 = 0.8487;
pub const Y_SCALE: f64 = 1.3523;

/// Quadratic Lagrange interpolation of `table` at absolute latitude `abs_lat` (degrees).
pub fn interpolate(table: &[f64; 19], abs_lat: f64) -> f64 {
    let abs_lat = abs_lat.clamp(0.0, 90.0);
    let i = ((abs_lat / BAND).floor() as usize).min(table.len() - 3);
    let t = (abs_lat - i as f64 * BAND) / BAND;

    let (f0, f1, f2) = (table[i], table[i + 1], table[i + 2]);
    f0 * (t - 1.0) * (t - 2.0) / 2.0 - f1 * t * (t - 2.0) + f2 * t * (t - 1.0) / 2.0
}

/// Forward Robinson on radians; `(x, y)` before output scaling.
pub fn forward(lat: f64, lon: f64) -> (f64, f64) {
    let abs_lat = lat.abs().to_degrees();
    let x = X_SCALE * interpolate(&PLEN, abs_lat) * lon;
    let y = Y_SCALE * interpolate(&PDFE, abs_lat) * lat.signum();
    (x, y)
}

/// Inverse Robinson; `None` outside the projected outline.
pub fn inverse(x: f64, y: f64) -> Option<(f64, f64)> {
    let target = y.abs() / Y_SCALE;
    if target > 1.0 + 1e-12 {
        return None;
    }

    // PDFE grows with latitude, so bisect on it
    let (mut lo, mut hi) = (0.0f64, 90.0f64);
    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        if interpolate(&PDFE, mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let abs_lat = 0.5 * (lo + hi);

    let lon = x / (X_SCALE * interpolate(&PLEN, abs_lat));
    if lon.abs() > std::f64::consts::PI + 1e-9 {
        return None;
    }
    Some((abs_lat.to_radians().copysign(y), lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_interpolation_hits_table_nodes() {
        for (k, &expected) in PDFE.iter().enumerate() {
            assert_approx_eq!(interpolate(&PDFE, k as f64 * BAND), expected, 1e-12);
        }
        assert_approx_eq!(interpolate(&PLEN, 90.0), 0.5322, 1e-12);
    }

    #[test]
    fn test_pole_and_equator() {
        let (x, y) = forward(0.0, std::f64::consts::PI);
        assert_approx_eq!(x, X_SCALE * std::f64::consts::PI, 1e-12);
        assert_approx_eq!(y, 0.0, 1e-12);

        let (_, y) = forward(-std::f64::consts::FRAC_PI_2, 0.0);
        assert_approx_eq!(y, -Y_SCALE, 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        for &(lat, lon) in &[(12.5f64, 40.0f64), (-63.0, -175.0), (88.0, 3.0), (0.0, 0.0)] {
            let (x, y) = forward(lat.to_radians(), lon.to_radians());
            let (ilat, ilon) = inverse(x, y).unwrap();
            assert_approx_eq!(ilat.to_degrees(), lat, 1e-9);
            assert_approx_eq!(ilon.to_degrees(), lon, 1e-9);
        }
        assert!(inverse(0.0, 1.5).is_none());
        assert!(inverse(3.0, 0.0).is_none());
    }
}
