//! Remote document collections.
//!
//! The shared copy of each collection is a JSON document stored at a path
//! (e.g. `documents`). Writers replace the whole document; every subscriber
//! receives the new value when it changes, including changes made by other
//! devices.

mod directory;
#[cfg(any(test, feature = "mock"))]
mod memory;

pub use self::directory::DirectoryRemote;
#[cfg(any(test, feature = "mock"))]
pub use self::memory::MemoryRemote;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Stream of snapshots of one collection path.
///
/// `None` means nothing is stored at the path. The stream is `'static` so it
/// can be moved into a spawned task.
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<Option<Value>>> + Send>>;

/// A shared, realtime JSON document store.
///
/// # Examples
///
/// ```
/// use futures::TryStreamExt;
/// use desk_storage::{RemoteCollection, error::Result};
///
/// async fn wait_for_first_document(remote: &dyn RemoteCollection) -> Result<()> {
///     let mut changes = remote.subscribe("documents");
///     while let Some(snapshot) = changes.try_next().await? {
///         if snapshot.is_some() {
///             break;
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Name of the configured collection backend, for logging only.
    fn name(&self) -> &str;

    /// One-shot read of the value at `path`.
    async fn fetch(&self, path: &str) -> Result<Option<Value>>;

    /// Replace the value at `path`. Storing [`Value::Null`] deletes it.
    async fn store(&self, path: &str, value: Value) -> Result<()>;

    /// Subscribe to the value at `path`.
    ///
    /// The first item is the value at the time of subscribing; later items
    /// follow every change until the stream is dropped. Errors are reported
    /// in-band and do not end the stream.
    fn subscribe(&self, path: &str) -> ChangeStream;
}
