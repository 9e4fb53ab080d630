//! Error types for the [`intake`](super) module.

use derive_more::{Display, Error};
use desk_cache::format_size;

/// An intake error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for intake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single file was not taken in.
///
/// ### Rejections
/// - [`ErrorKind::Unsupported`]
/// - [`ErrorKind::TooLarge`]
///
/// ### Operational Errors
/// - [`ErrorKind::Read`]
/// - [`ErrorKind::Store`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Only images are accepted.
    #[display("{name} is not supported; only images can be attached")]
    Unsupported { name: String },
    /// The file is over the intake size cap.
    #[display("{name} is too large ({}, the limit is {})", format_size(*size), format_size(*limit))]
    TooLarge {
        name: String,
        size: u64,
        limit: u64,
    },
    #[display("could not read {_0}")]
    Read(#[error(not(source))] String),
    #[display("could not save {_0}")]
    Store(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Store(_))
    }

    /// Whether the file itself was refused, as opposed to failing to load.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::TooLarge { .. })
    }
}
