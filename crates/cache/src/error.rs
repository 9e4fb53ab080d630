//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Reads never produce these: a cache that can't be read
//! is treated as empty. Only writes the caller must know about do.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The local slot could not be written (quota, permissions, disk).
    #[display("could not write local cache slot `{_0}`")]
    LocalWrite(#[error(not(source))] String),
    /// A record was rejected before anything was written.
    #[display("invalid record: {_0}")]
    InvalidRecord(#[error(not(source))] String),
    /// An attachment with this id is already cached.
    #[display("duplicate attachment id: {_0}")]
    DuplicateId(#[error(not(source))] String),
    /// Serialization of records failed.
    #[display("invalid cache data")]
    InvalidData,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LocalWrite(_))
    }
}
