//! Error types for chunked array access.

use thiserror::Error;

/// Errors that can occur while resolving metadata or reading chunks.
///
/// `Clone` so a coalesced request can hand the same failure to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Group or variable absent at the expected path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A metadata document did not have the structure of the probed dialect.
    #[error("metadata format mismatch: {0}")]
    FormatMismatch(String),

    /// The backend could not be reached or returned a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Metadata is present but violates its contract (e.g. dimension names vs shape).
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Codec, dtype or layout this store does not implement.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Selection does not fit the array.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A chunk could not be decoded by its codec chain.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn format_mismatch(msg: impl Into<String>) -> Self {
        Self::FormatMismatch(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMetadata(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<object_store::Error> for StoreError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => Self::NotFound(path),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
