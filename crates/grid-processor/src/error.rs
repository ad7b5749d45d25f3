//! Error types for dimension resolution and grid classification.

use chunk_store::StoreError;
use thiserror::Error;

/// Errors that can occur while resolving dimensions or classifying grids.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Shape and dimension metadata disagree.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// No probe in the classification chain matched.
    #[error("{0}")]
    Unclassifiable(String),

    /// Time units or calendar could not be decoded.
    #[error("invalid time axis: {0}")]
    InvalidTime(String),

    /// A dimension referenced by name or position does not exist.
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    /// Failure from the chunked array store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GridError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMetadata(msg.into())
    }

    pub fn invalid_time(msg: impl Into<String>) -> Self {
        Self::InvalidTime(msg.into())
    }

    /// Whether the underlying cause is an absent group or variable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMetadata(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridError>;
