//! Transfer Error Types
//!
//! Every failure here happens before the store is touched, except
//! [`Store`](ErrorKind::Store).

use derive_more::{Display, Error};

/// A transfer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No attachment has the requested id.
    #[display("attachment not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// There is nothing to export.
    #[display("there are no attachments to export")]
    Empty,
    /// The clipboard holds no text.
    #[display("the clipboard is empty")]
    ClipboardEmpty,
    /// The clipboard text is not an attachment or package this desk accepts.
    #[display("invalid clipboard content: {_0}")]
    Validation(#[error(not(source))] String),
    /// Reading or writing the clipboard failed.
    #[display("clipboard unavailable")]
    Clipboard,
    /// The attachment store rejected the write.
    #[display("could not save imported attachments")]
    Store,
    #[display("could not serialize attachments")]
    Serialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Clipboard | Self::Store)
    }
}
