//! In-memory remote collection for testing.

use super::ChangeStream;
use crate::error::{ErrorKind, Result};
use crate::{RemoteCollection, validate_collection};
use async_stream::stream;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

const CHANNEL_CAPACITY: usize = 64;

struct Shared {
    documents: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<String>,
}
impl Shared {
    async fn current(&self, path: &str) -> Option<Value> {
        self.documents.read().await.get(path).cloned()
    }
}

/// In-memory remote collection for testing.
///
/// Clones share the same documents, so two clones behave like two devices
/// connected to one project. The collection can be taken offline and given
/// artificial latency to exercise failure and ordering paths.
#[derive(Clone)]
pub struct MemoryRemote {
    name: String,
    shared: Arc<Shared>,
    offline: Arc<AtomicBool>,
    stores: Arc<AtomicUsize>,
    latency: Option<Duration>,
}
impl MemoryRemote {
    /// Create a collection pre-populated with documents.
    ///
    /// Panics on an invalid path; a broken test setup should not pass.
    pub fn with_documents(documents: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        let mut map = HashMap::new();
        for (path, value) in documents {
            let path = path.into();
            let Ok(validated) = validate_collection(&path) else {
                panic!("MemoryRemote::with_documents: invalid path {path}");
            };
            map.insert(validated, value);
        }
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            name: "memory".to_string(),
            shared: Arc::new(Shared { documents: RwLock::new(map), changes }),
            offline: Arc::new(AtomicBool::new(false)),
            stores: Arc::new(AtomicUsize::new(0)),
            latency: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Delay every `fetch` and `store` by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// While offline, `fetch` and `store` fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful `store` calls, across all clones.
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Network(format!("{} is offline", self.name)));
        }
        Ok(())
    }
}
impl Default for MemoryRemote {
    fn default() -> Self {
        Self::with_documents(std::iter::empty::<(String, Value)>())
    }
}

#[async_trait]
impl RemoteCollection for MemoryRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &str) -> Result<Option<Value>> {
        let path = validate_collection(path)?;
        self.round_trip().await?;
        Ok(self.shared.current(&path).await)
    }

    async fn store(&self, path: &str, value: Value) -> Result<()> {
        let path = validate_collection(path)?;
        self.round_trip().await?;
        {
            let mut documents = self.shared.documents.write().await;
            if value.is_null() {
                documents.remove(&path);
            } else {
                documents.insert(path.clone(), value);
            }
        }
        self.stores.fetch_add(1, Ordering::SeqCst);
        // No receivers is fine; nobody is subscribed yet.
        _ = self.shared.changes.send(path);
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ChangeStream {
        let shared = self.shared.clone();
        let path = validate_collection(path);
        // Subscribe before reading the initial value so no change is missed.
        let mut receiver = shared.changes.subscribe();
        Box::pin(stream! {
            let path = match path {
                Ok(path) => path,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            yield Ok(shared.current(&path).await);
            loop {
                match receiver.recv().await {
                    Ok(changed) if changed == path => yield Ok(shared.current(&path).await),
                    Ok(_) => {},
                    // Missed some notifications; the latest value covers them.
                    Err(broadcast::error::RecvError::Lagged(_)) => yield Ok(shared.current(&path).await),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
