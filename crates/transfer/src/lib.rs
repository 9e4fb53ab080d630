//! Clipboard export and import of attachments.
//!
//! Single records travel as their JSON form; whole collections travel inside
//! a [`TransferPackage`] envelope. Imports validate everything first, mint new
//! identities, and then write the store once.

mod clipboard;
mod codec;
pub mod error;
mod package;

pub use crate::clipboard::{Clipboard, ClipboardHandle, MemoryClipboard, StdioClipboard};
pub use crate::codec::Transfer;
pub use crate::package::{LEGACY_PACKAGE_KIND, PACKAGE_KIND, PACKAGE_VERSION, PackageSummary, TransferPackage};
