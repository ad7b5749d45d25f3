//! Map projections for the viewer's globe and flat modes.
//!
//! Two paths compute the same transforms:
//!
//! - [`ProjectionHelper`]: double-precision scalar reference, used for camera
//!   framing, picking ([`ProjectionHelper::invert`]) and outline sizing
//! - [`ProjectionKernel`]: single-precision per-sample kernel evaluated in
//!   parallel over vertex buffers, the CPU twin of the vertex shader
//!
//! [`check_parity`] compares them; any kind whose paths drift apart by more
//! than [`PARITY_TOLERANCE`] is a bug.

pub mod bounds;
pub mod helper;
pub mod kernel;
pub mod kind;
pub mod parity;
pub mod robinson;
pub mod rotation;

pub use bounds::{projected_bounds, ProjectedBounds};
pub use helper::{invert, ProjectionHelper};
pub use kernel::{is_invalid, ProjectionKernel, INVALID};
pub use kind::{LatLon, ParseProjectionError, ProjectionKind, ProjectionSpec};
pub use parity::{check_parity, in_parity_domain, ParityReport, PARITY_TOLERANCE};
pub use rotation::{normalize_longitude, rotate_from_center, rotate_to_center};
