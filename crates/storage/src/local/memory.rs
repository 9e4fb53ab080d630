//! In-memory slot store for testing.

use crate::error::{ErrorKind, Result};
use crate::{LocalStore, validate_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory slot store for testing.
///
/// Slots live in a `HashMap` behind a [`RwLock`]. Writes can be made to fail
/// on demand to exercise quota and permission failures.
pub struct MemoryStore {
    name: String,
    slots: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}
impl MemoryStore {
    /// Create a store pre-populated with slots.
    ///
    /// Panics on an invalid key; a broken test setup should not pass.
    pub fn with_slots(slots: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut map = HashMap::new();
        for (key, value) in slots {
            let key = key.into();
            if validate_key(&key).is_err() {
                panic!("MemoryStore::with_slots: invalid key {key}");
            }
            map.insert(key, value.into());
        }
        Self {
            name: "memory".to_string(),
            slots: RwLock::new(map),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent `set`/`remove` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::BackendError(format!("{} is not accepting writes", self.name)));
        }
        Ok(())
    }
}
impl Default for MemoryStore {
    fn default() -> Self {
        let slots: [(&str, &str); 0] = [];
        Self::with_slots(slots)
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = validate_key(key)?;
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = validate_key(key)?;
        self.check_writable()?;
        self.slots.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let key = validate_key(key)?;
        self.check_writable()?;
        Ok(self.slots.write().await.remove(key).is_some())
    }
}
