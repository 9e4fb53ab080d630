//! Storage for the complaint desk.
//!
//! Two kinds of storage back every collection the desk works with:
//!
//! - [`LocalStore`]: durable key/value slots on this device (the fallback
//!   copy, read first and written first).
//! - [`RemoteCollection`]: the shared realtime document store every device
//!   synchronizes through.
//!
//! Both come with a directory-backed implementation, an in-memory one behind
//! the `mock` feature, and a read-only decorator for dry runs.

mod atomic;
pub mod error;
mod key;
pub mod local;
pub mod remote;
mod ro;

pub use crate::key::{validate_collection, validate_key};
#[cfg(any(test, feature = "mock"))]
pub use crate::local::MemoryStore;
pub use crate::local::{FileStore, LocalStore};
#[cfg(any(test, feature = "mock"))]
pub use crate::remote::MemoryRemote;
pub use crate::remote::{ChangeStream, DirectoryRemote, RemoteCollection};
pub use crate::ro::{ReadOnlyRemote, ReadOnlyStore};
use std::sync::Arc;

pub type LocalHandle = Arc<dyn LocalStore + Send + Sync>;
pub type RemoteHandle = Arc<dyn RemoteCollection + Send + Sync>;
