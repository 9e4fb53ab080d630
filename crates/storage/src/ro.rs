//! Read-only decorators.
//!
//! Wrap another store or collection so that reads pass through and writes are
//! dropped while still reporting success. Used for `--dry-run`.

use crate::error::Result;
use crate::remote::ChangeStream;
use crate::{LocalHandle, LocalStore, RemoteCollection, RemoteHandle};
use async_trait::async_trait;
use serde_json::Value;

/// Read-only slot store.
///
/// Wraps another store and silently drops all writes, logging an
/// [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyStore {
    inner: LocalHandle,
}
impl ReadOnlyStore {
    pub fn new(inner: LocalHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LocalStore for ReadOnlyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tracing::info!(store = self.inner.name(), key, bytes = value.len(), "Skipping slot write during read-only mode");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        tracing::info!(store = self.inner.name(), key, "Skipping slot removal during read-only mode");
        Ok(false)
    }
}

/// Read-only remote collection.
///
/// Wraps another collection and silently drops all stores, logging an
/// [`info event`](tracing::Event). Subscriptions still deliver changes made
/// by other devices.
#[derive(Clone)]
pub struct ReadOnlyRemote {
    inner: RemoteHandle,
}
impl ReadOnlyRemote {
    pub fn new(inner: RemoteHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RemoteCollection for ReadOnlyRemote {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, path: &str) -> Result<Option<Value>> {
        self.inner.fetch(path).await
    }

    async fn store(&self, path: &str, _value: Value) -> Result<()> {
        tracing::info!(remote = self.inner.name(), path, "Skipping remote store during read-only mode");
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ChangeStream {
        self.inner.subscribe(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryRemote, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_reads_through_and_drops_writes() {
        let inner = Arc::new(MemoryStore::with_slots([("slot", "original")]));
        let store = ReadOnlyStore::new(inner.clone());
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("original"));
        store.set("slot", "changed").await.unwrap();
        assert!(!store.remove("slot").await.unwrap());
        assert_eq!(inner.get("slot").await.unwrap().as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_remote_reads_through_and_drops_stores() {
        let inner = MemoryRemote::with_documents([("documents", json!({"a": 1}))]);
        let remote = ReadOnlyRemote::new(Arc::new(inner.clone()));
        remote.store("documents", json!({})).await.unwrap();
        assert_eq!(remote.fetch("documents").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(inner.store_count(), 0);
    }
}
