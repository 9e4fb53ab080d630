//! Local slot stores.
//!
//! A slot store is a flat map of string keys to string values that survives
//! restarts: the on-device copy of each collection lives in one slot, written
//! and read as a whole.

mod file;
#[cfg(any(test, feature = "mock"))]
mod memory;

pub use self::file::FileStore;
#[cfg(any(test, feature = "mock"))]
pub use self::memory::MemoryStore;
use crate::error::Result;
use async_trait::async_trait;

/// Durable key/value slots on the local device.
///
/// Values are opaque strings (in practice, serialized JSON). Every write
/// replaces the whole slot.
///
/// # Examples
///
/// ```
/// use desk_storage::{LocalStore, error::Result};
///
/// async fn slot_len(store: &dyn LocalStore) -> Result<usize> {
///     Ok(store.get("complaints_documents").await?.map(|blob| blob.len()).unwrap_or(0))
/// }
/// ```
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Name of the configured store, for logging only.
    fn name(&self) -> &str;

    /// Read a slot, or `None` if it has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the contents of a slot.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a slot. Returns whether anything was there.
    async fn remove(&self, key: &str) -> Result<bool>;
}
