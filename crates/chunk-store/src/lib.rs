//! Caching access layer over remote zarr v2 chunked array stores.
//!
//! [`ChunkedArrayStore`] resolves [`DatasetLocator`]s to group and variable handles
//! and reads hyperslabs from chunk objects fetched through a [`StoreBackend`] and
//! decoded by zarrs.
//!
//! # Caching
//!
//! - Group and variable handles are cached per normalized locator until
//!   [`ChunkedArrayStore::invalidate`].
//! - Identical concurrent requests share one fetch.
//! - Data reads are not kept after completion, except for allow-listed axis
//!   variables ([`StoreConfig::cached_axis_variables`]).
//! - A failed fetch purges its own entry so the next call retries.
//!
//! # Example
//!
//! ```ignore
//! use chunk_store::{ChunkedArrayStore, Selection};
//! use geo_common::DatasetLocator;
//!
//! let store = ChunkedArrayStore::from_env()?;
//! let locator = DatasetLocator::new("https://data.example.org/run1.zarr", "atm/2d");
//! let tas = store.resolve_variable(&locator, "tas").await?;
//! let slab = store
//!     .read_selection(&locator, "tas", &[Selection::Index(0), Selection::All, Selection::All])
//!     .await?;
//! ```

pub mod backend;
pub mod buffer;
pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
pub mod selection;
pub mod store;

pub use backend::{
    BackendResolver, DefaultBackendResolver, MemoryBackend, ObjectStoreBackend,
    StaticBackendResolver, StoreBackend,
};
pub use buffer::{BufferData, TypedBuffer};
pub use cache::StoreStats;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use geo_common::DatasetLocator;
pub use metadata::{DataType, GroupHandle, MetadataDialect, VariableHandle};
pub use selection::Selection;
pub use store::ChunkedArrayStore;
