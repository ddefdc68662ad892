use thiserror::Error;

/// Every fallible outcome the engine can produce, grouped by caller-visible
/// behavior rather than by originating module.
#[derive(Error, Debug)]
pub enum BlzError {
    #[error("index out of range: {0}")]
    Index(String),

    #[error("dtype mismatch: {0}")]
    Dtype(String),

    #[error("array is read-only: {0}")]
    ReadOnly(String),

    #[error("invalid value: {0}")]
    Value(String),

    #[error("not implemented: {0}")]
    Unimplemented(String),

    #[error("corrupted data: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BlzError>;
