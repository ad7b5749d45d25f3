//! Longitude normalization and the spherical rotation that brings a
//! projection center to the origin.

use crate::kind::LatLon;

/// Wrap a longitude in degrees into `[-180, 180)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Rotate `point` so that `center` lands on (0, 0).
///
/// A rotation about the polar axis by `-center.lon` followed by a rotation
/// about the new y axis by `center.lat`. Inputs and outputs in degrees.
pub fn rotate_to_center(point: LatLon, center: LatLon) -> LatLon {
    let lat = point.lat.to_radians();
    let dlon = (point.lon - center.lon).to_radians();
    let (sin_c, cos_c) = center.lat.to_radians().sin_cos();

    let x = lat.cos() * dlon.cos();
    let y = lat.cos() * dlon.sin();
    let z = lat.sin();

    let xr = x * cos_c + z * sin_c;
    let zr = -x * sin_c + z * cos_c;

    LatLon {
        lat: zr.clamp(-1.0, 1.0).asin().to_degrees(),
        lon: normalize_longitude(y.atan2(xr).to_degrees()),
    }
}

/// Inverse of [`rotate_to_center`].
pub fn rotate_from_center(point: LatLon, center: LatLon) -> LatLon {
    let lat = point.lat.to_radians();
    let lon = point.lon.to_radians();
    let (sin_c, cos_c) = center.lat.to_radians().sin_cos();

    let xr = lat.cos() * lon.cos();
    let y = lat.cos() * lon.sin();
    let zr = lat.sin();

    let x = xr * cos_c - zr * sin_c;
    let z = xr * sin_c + zr * cos_c;

    LatLon {
        lat: z.clamp(-1.0, 1.0).asin().to_degrees(),
        lon: normalize_longitude(y.atan2(x).to_degrees() + center.lon),
    }
}
