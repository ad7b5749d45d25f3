//! Test tooling shared by the viewer-core crates.
//!
//! - [`ZarrFixture`]: zarr v2 stores built in memory, with consolidated or per-node
//!   metadata and raw, zlib, gzip or blosc chunks
//! - generators for coordinate arrays, lattices and sample data
//! - float assertions that treat two NaNs as equal, since NaN is the fill value for
//!   missing chunks and the sentinel for unprojectable points
//!
//! Only ever used as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// `true` when `a` and `b` differ by at most `epsilon`, or are both NaN.
#[doc(hidden)]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= epsilon
}

/// Assert two numbers agree within `epsilon`. Operands are widened to `f64`.
///
/// ```ignore
/// assert_approx_eq!(kernel_x, helper_x, 1e-5);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if !$crate::approx_eq(left, right, epsilon) {
            panic!(
                "assertion failed: {} ≈ {}\n  left: {:?}\n right: {:?}\n  diff: {:?} > {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right,
                (left - right).abs(),
                epsilon
            );
        }
    }};
}

/// Assert two coordinate tuples agree component-wise within `epsilon`.
///
/// ```ignore
/// assert_coords_approx_eq!((lat, lon), (52.0, 13.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($($left:expr),+), ($($right:expr),+), $epsilon:expr) => {{
        $( $crate::assert_approx_eq!($left, $right, $epsilon); )+
    }};
}
