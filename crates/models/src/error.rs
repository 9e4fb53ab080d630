//! Model Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload is not a `data:<mime>;base64,<content>` URI.
    #[display("malformed data URI")]
    MalformedDataUri,
    /// The base64 content of a data URI could not be decoded.
    #[display("invalid base64 content")]
    InvalidBase64,
    /// A JSON document did not have the expected shape.
    #[display("invalid record: {_0}")]
    InvalidRecord(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MalformedDataUri.to_string(), "malformed data URI");
        assert_eq!(ErrorKind::InvalidRecord("name".to_string()).to_string(), "invalid record: name");
    }

    #[test]
    fn error_kind_never_retryable() {
        assert!(!ErrorKind::InvalidBase64.is_retryable());
    }
}
