//! Library Error Types
//!
//! Errors from the lower crates are wrapped in the category the caller acts
//! on, carrying the inner message so it can be shown without walking the
//! error tree.

use derive_more::{Display, Error};
use exn::ResultExt;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nobody is signed in. Raised before anything is read or written.
    #[display("not signed in")]
    Unauthenticated,
    #[display("attachment not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The attachment store refused a write.
    #[display("{_0}")]
    Store(#[error(not(source))] String),
    /// Clipboard export or import failed.
    #[display("{_0}")]
    Transfer(#[error(not(source))] String),
    /// A stored attachment could not be written back out as a file.
    #[display("could not download attachment: {_0}")]
    Download(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Download(_))
    }
}

/// Re-raise a lower-level error as `kind`, keeping its message.
pub(crate) fn wrap<T, K>(result: std::result::Result<T, exn::Exn<K>>, kind: fn(String) -> ErrorKind) -> Result<T>
where
    K: std::error::Error + Send + Sync + 'static,
{
    match result {
        Ok(value) => Ok(value),
        Err(error) => {
            let message = error.to_string();
            Err(error).or_raise(|| kind(message))
        },
    }
}
