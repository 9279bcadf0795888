//! Error types for relprep.

use thiserror::Error;

/// Result type for relprep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relprep operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A record line was structurally malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An annotation file has no sibling text file, or vice versa.
    #[error("Missing counterpart: {0}")]
    MissingCounterpart(String),

    /// A span's offsets fall outside the document text.
    #[error("Offset out of range: {0}")]
    OffsetOutOfRange(String),

    /// Configuration rejected before extraction started.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a missing-counterpart error.
    pub fn missing_counterpart(msg: impl Into<String>) -> Self {
        Error::MissingCounterpart(msg.into())
    }

    /// Create an offset-out-of-range error.
    pub fn offset_out_of_range(msg: impl Into<String>) -> Self {
        Error::OffsetOutOfRange(msg.into())
    }

    /// Create an invalid-config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
