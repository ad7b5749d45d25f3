//! Synthetic coordinate and sample generators.
//!
//! These generators create predictable grid signatures so the grid topology
//! probes and projection sweeps can be exercised without real datasets.

/// Cell-center latitudes and longitudes of a global regular grid.
///
/// Latitudes run north to south, longitudes west to east starting at -180.
///
/// # Example
///
/// ```
/// use test_utils::regular_axes;
///
/// let (lat, lon) = regular_axes(4, 8);
/// assert_eq!(lat.len(), 4);
/// assert_eq!(lon.len(), 8);
/// assert_eq!(lat[0], 67.5);
/// assert_eq!(lon[0], -157.5);
/// ```
pub fn regular_axes(nlat: usize, nlon: usize) -> (Vec<f64>, Vec<f64>) {
    let dlat = 180.0 / nlat as f64;
    let dlon = 360.0 / nlon as f64;
    let lat = (0..nlat).map(|i| 90.0 - dlat * (i as f64 + 0.5)).collect();
    let lon = (0..nlon).map(|j| -180.0 + dlon * (j as f64 + 0.5)).collect();
    (lat, lon)
}

/// Two-dimensional lat/lon fields of a regular grid (meshgrid), row-major `[nlat, nlon]`.
pub fn meshgrid(lat: &[f64], lon: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut lat2d = Vec::with_capacity(lat.len() * lon.len());
    let mut lon2d = Vec::with_capacity(lat.len() * lon.len());
    for &la in lat {
        for &lo in lon {
            lat2d.push(la);
            lon2d.push(lo);
        }
    }
    (lat2d, lon2d)
}

/// A rotated, stretched 2-D mesh where most coordinates repeat only along diagonals.
///
/// Row and column each contribute to both coordinates, which is the signature of an
/// ocean-model style curvilinear grid.
pub fn curvilinear_mesh(ny: usize, nx: usize) -> (Vec<f64>, Vec<f64>) {
    let mut lat = Vec::with_capacity(ny * nx);
    let mut lon = Vec::with_capacity(ny * nx);
    for j in 0..ny {
        for i in 0..nx {
            lat.push(-60.0 + 2.0 * j as f64 + 0.5 * i as f64);
            lon.push(-150.0 + 3.0 * i as f64 + 1.0 * j as f64);
        }
    }
    (lat, lon)
}

/// Per-cell coordinates of a reduced Gaussian grid.
///
/// `points_per_row[k]` cells share the latitude of row `k`, so the first two
/// latitude samples are equal whenever the first row has more than one point.
pub fn reduced_gaussian_cells(points_per_row: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let rows = points_per_row.len();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    for (k, &n) in points_per_row.iter().enumerate() {
        let row_lat = 90.0 - 180.0 * (k as f64 + 0.5) / rows as f64;
        for p in 0..n {
            lat.push(row_lat);
            lon.push(-180.0 + 360.0 * p as f64 / n as f64);
        }
    }
    (lat, lon)
}

/// Scattered per-cell coordinates with no shared rows (a golden-angle spiral).
pub fn scattered_cells(n: usize) -> (Vec<f64>, Vec<f64>) {
    let golden = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
    let mut lat = Vec::with_capacity(n);
    let mut lon = Vec::with_capacity(n);
    for k in 0..n {
        let z = 1.0 - 2.0 * (k as f64 + 0.5) / n as f64;
        lat.push(z.asin().to_degrees());
        let theta = (golden * k as f64).to_degrees();
        lon.push((theta + 180.0).rem_euclid(360.0) - 180.0);
    }
    (lat, lon)
}

/// Lattice of `(lat, lon)` pairs covering `[-lat_limit, lat_limit] x [-180, 180)`.
pub fn lat_lon_lattice(step: f64, lat_limit: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut lat = -lat_limit;
    while lat <= lat_limit + 1e-9 {
        let mut lon = -180.0;
        while lon < 180.0 {
            points.push((lat, lon));
            lon += step;
        }
        lat += step;
    }
    points
}

/// Deterministic pseudo-random samples in `[low, high)`.
pub fn uniform_samples(n: usize, low: f64, high: f64, seed: u32) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let h = simple_hash(i as u32, seed);
            low + (high - low) * (h as f64 / u32::MAX as f64)
        })
        .collect()
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
