//! Turning files on disk into attachment records.
//!
//! [`intake_file`] handles one file: the type is checked from its extension
//! and the size from its metadata before anything is read, then the content
//! is embedded as a data URI and the record appended to the store. [`intake`]
//! streams a batch through it; a rejected file is reported and the rest of
//! the batch carries on.

pub mod error;
mod file;
mod stream;

pub use self::file::{Target, intake_file};
pub use self::stream::{IntakeEvent, intake};
