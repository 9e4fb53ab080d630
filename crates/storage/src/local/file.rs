//! Directory-backed slot store.
//!
//! Each slot is one `<key>.json` file inside the configured directory.
//! Writes go through a sibling temp file and a rename so a crash mid-write
//! leaves the previous value intact.

use crate::atomic::{self, map_io_error};
use crate::error::{ErrorKind, Result};
use crate::{LocalStore, validate_key};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

const SLOT_EXTENSION: &str = "json";

/// Slot store kept in a directory on the local filesystem.
///
/// # Examples
///
/// ```no_run
/// use desk_storage::FileStore;
///
/// # fn example() -> desk_storage::error::Result<()> {
/// let store = FileStore::new("device", "/var/lib/complaint-desk")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileStore {
    name: String,
    root: PathBuf,
}
impl FileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!("slot directory `{}` is not absolute", root.display())));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::BackendError(format!("slot directory `{}` is a file", root.display())));
            }
        } else {
            // Only happens once at startup; not worth an async constructor.
            sync_create_dir(&root).map_err(|e| map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let key = validate_key(key)?;
        Ok(self.root.join(format!("{key}.{SLOT_EXTENSION}")))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(e, &path).into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        atomic::write(&path, value.as_bytes()).await?;
        tracing::trace!(store = %self.name, key, bytes = value.len(), "Slot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io_error(e, &path).into()),
        }
    }
}
