//! Remote collection backed by a shared directory.
//!
//! Each collection path maps to `<root>/<path>.json`. Several desks pointed
//! at the same directory (a network share, a synced folder) see each other's
//! writes; subscriptions notice them by polling.

use super::ChangeStream;
use crate::atomic::{self, map_io_error};
use crate::error::{ErrorKind, Result};
use crate::{RemoteCollection, validate_collection};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::MissedTickBehavior;

const DOCUMENT_EXTENSION: &str = "json";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Remote collection stored as JSON files under a directory.
///
/// # Examples
///
/// ```no_run
/// use desk_storage::DirectoryRemote;
/// use std::time::Duration;
///
/// # fn example() -> desk_storage::error::Result<()> {
/// let remote = DirectoryRemote::new("office-share", "/mnt/share/complaints")?
///     .with_poll_interval(Duration::from_secs(2));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DirectoryRemote {
    name: String,
    root: PathBuf,
    poll_interval: Duration,
}
impl DirectoryRemote {
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!("collection root `{}` is not absolute", root.display())));
        }
        if root.exists() && !root.is_dir() {
            exn::bail!(ErrorKind::BackendError(format!("collection root `{}` is a file", root.display())));
        }
        Ok(Self {
            name: name.into(),
            root,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn document_path(&self, path: &str) -> Result<PathBuf> {
        let path = validate_collection(path)?;
        Ok(self.root.join(format!("{path}.{DOCUMENT_EXTENSION}")))
    }
}

async fn read_raw(file: &Path) -> Result<Option<String>> {
    match fs::read_to_string(file).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(map_io_error(e, file).into()),
    }
}

fn parse(file: &Path, raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value =
        serde_json::from_str(raw).or_raise(|| ErrorKind::InvalidDocument(file.display().to_string()))?;
    Ok((!value.is_null()).then_some(value))
}

#[async_trait]
impl RemoteCollection for DirectoryRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &str) -> Result<Option<Value>> {
        let file = self.document_path(path)?;
        let raw = read_raw(&file).await?;
        parse(&file, raw.as_deref())
    }

    async fn store(&self, path: &str, value: Value) -> Result<()> {
        let file = self.document_path(path)?;
        if value.is_null() {
            return match fs::remove_file(&file).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(map_io_error(e, &file).into()),
            };
        }
        let data = serde_json::to_vec(&value).or_raise(|| ErrorKind::InvalidDocument(file.display().to_string()))?;
        atomic::write(&file, &data).await?;
        tracing::trace!(remote = %self.name, path, bytes = data.len(), "Document stored");
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ChangeStream {
        let file = self.document_path(path);
        let poll_interval = self.poll_interval;
        Box::pin(stream! {
            let file = match file {
                Ok(file) => file,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // `None` until the first successful read, so the initial value is
            // always delivered.
            let mut last_seen: Option<Option<String>> = None;
            loop {
                interval.tick().await;
                match read_raw(&file).await {
                    Ok(raw) => {
                        if last_seen.as_ref() == Some(&raw) {
                            continue;
                        }
                        let parsed = parse(&file, raw.as_deref());
                        last_seen = Some(raw);
                        yield parsed;
                    },
                    Err(e) => yield Err(e),
                }
            }
        })
    }
}
