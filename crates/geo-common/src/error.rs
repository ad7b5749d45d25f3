//! Error types for the shared vocabulary crate.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while parsing shared types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommonError {
    #[error("Unknown grid type: {0}")]
    UnknownGridType(String),

    #[error("Invalid dataset index: {0}")]
    InvalidIndex(String),

    #[error("Dataset index level {0} does not exist")]
    LevelNotFound(usize),

    #[error("Variable '{0}' is not listed in the dataset index")]
    VariableNotListed(String),
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        CommonError::InvalidIndex(format!("JSON error: {}", err))
    }
}
