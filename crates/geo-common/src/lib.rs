//! Common types shared by the gridded-data viewer core crates.

pub mod error;
pub mod grid;
pub mod index;
pub mod locator;
pub mod report;

pub use error::{CommonError, CommonResult};
pub use grid::GridType;
pub use index::{DatasetIndex, IndexLevel};
pub use locator::DatasetLocator;
pub use report::{ErrorReporter, TracingErrorReporter};
