//! The attachment store: the single owner of the local attachment list.
//!
//! Every mutation is a read-modify-write of the whole local slot, serialized
//! by an async mutex, followed by a push of the full collection to the remote
//! mirror. The push runs in the background; local success never waits for
//! (or depends on) the remote.

use crate::error::{ErrorKind, Result};
use crate::mirror;
use desk_models::{AttachmentId, AttachmentRecord};
use desk_storage::{LocalHandle, RemoteHandle};
use exn::ResultExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::instrument;

pub const DEFAULT_SLOT: &str = "complaints_documents";
pub const DEFAULT_REMOTE_PATH: &str = "documents";
const EMPTY_LIST: &str = "[]";

/// Handle to a background push of the collection to the remote mirror.
///
/// Dropping it does not cancel the push.
#[derive(Debug)]
pub struct RemotePush(Option<JoinHandle<bool>>);
impl RemotePush {
    pub(crate) fn skipped() -> Self {
        Self(None)
    }

    /// Wait for the push to finish. Returns whether the snapshot was written
    /// remotely; `false` if it failed, was superseded by a newer snapshot, or
    /// there was nothing to push.
    pub async fn settled(self) -> bool {
        match self.0 {
            Some(handle) => handle.await.unwrap_or(false),
            None => false,
        }
    }
}

/// Orders background pushes so an older snapshot never lands after a newer
/// one.
#[derive(Default)]
struct PushSequence {
    issued: AtomicU64,
    // Sequence number of the last snapshot written (or given up on).
    landed: Mutex<u64>,
}

/// Single source of truth for the local attachment list.
///
/// # Examples
///
/// ```no_run
/// use desk_cache::AttachmentStore;
/// use desk_storage::{DirectoryRemote, FileStore};
/// use std::sync::Arc;
///
/// # async fn example() -> desk_storage::error::Result<()> {
/// let local = Arc::new(FileStore::new("device", "/var/lib/complaint-desk")?);
/// let remote = Arc::new(DirectoryRemote::new("share", "/mnt/share/desk")?);
/// let store = AttachmentStore::new(local, remote);
/// for record in store.list().await {
///     println!("{} ({} bytes)", record.name, record.size_bytes);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AttachmentStore {
    local: LocalHandle,
    remote: RemoteHandle,
    slot: String,
    remote_path: String,
    write_lock: Mutex<()>,
    pushes: Arc<PushSequence>,
}
impl AttachmentStore {
    pub fn new(local: LocalHandle, remote: RemoteHandle) -> Self {
        Self {
            local,
            remote,
            slot: DEFAULT_SLOT.to_string(),
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            write_lock: Mutex::new(()),
            pushes: Arc::new(PushSequence::default()),
        }
    }

    /// Use a different local slot key.
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Use a different remote collection path.
    pub fn with_remote_path(mut self, remote_path: impl Into<String>) -> Self {
        self.remote_path = remote_path.into();
        self
    }

    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Current list of attachments. Never fails.
    ///
    /// A missing, malformed or non-list slot reads as empty and is rewritten
    /// as an empty list. A slot that can't be read at all also reads as empty
    /// but is left untouched.
    pub async fn list(&self) -> Vec<AttachmentRecord> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }

    /// Look up one attachment by id.
    pub async fn get(&self, id: &AttachmentId) -> Option<AttachmentRecord> {
        self.list().await.into_iter().find(|record| &record.id == id)
    }

    /// Append one record, persist, then push the collection.
    ///
    /// A record with an empty id is ignored (logged, nothing written, no
    /// error).
    ///
    /// # Errors
    ///
    /// [`DuplicateId`](ErrorKind::DuplicateId) if the id is already cached,
    /// or [`LocalWrite`](ErrorKind::LocalWrite) if the slot can't be written.
    /// Remote failures are never reported here.
    #[instrument(skip_all, fields(id = %record.id))]
    pub async fn add(&self, record: AttachmentRecord) -> Result<RemotePush> {
        if record.id.is_empty() {
            tracing::warn!(name = %record.name, "Refusing to cache attachment without an id");
            return Ok(RemotePush::skipped());
        }
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await;
        if records.iter().any(|existing| existing.id == record.id) {
            exn::bail!(ErrorKind::DuplicateId(record.id.to_string()));
        }
        records.push(record);
        self.persist(&records).await?;
        Ok(self.push(&records))
    }

    /// Append a batch with a single read-modify-write.
    ///
    /// Either every record lands or none does: an empty or duplicate id
    /// anywhere in the batch rejects the whole batch before writing.
    #[instrument(skip_all, fields(count = batch.len()))]
    pub async fn extend(&self, batch: Vec<AttachmentRecord>) -> Result<RemotePush> {
        if batch.is_empty() {
            return Ok(RemotePush::skipped());
        }
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await;
        let mut seen: HashSet<&AttachmentId> = records.iter().map(|record| &record.id).collect();
        for record in &batch {
            if record.id.is_empty() {
                exn::bail!(ErrorKind::InvalidRecord(format!("`{}` has no id", record.name)));
            }
            if !seen.insert(&record.id) {
                exn::bail!(ErrorKind::DuplicateId(record.id.to_string()));
            }
        }
        records.extend(batch);
        self.persist(&records).await?;
        Ok(self.push(&records))
    }

    /// Remove one record by id, persist, then push the collection.
    ///
    /// Returns `None` (and writes nothing) if no record has that id.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &AttachmentId) -> Result<Option<RemotePush>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await;
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            tracing::debug!("Nothing to remove");
            return Ok(None);
        }
        self.persist(&records).await?;
        Ok(Some(self.push(&records)))
    }

    /// Install a snapshot received from the remote mirror. Nothing is pushed
    /// back.
    pub async fn replace_all(&self, records: Vec<AttachmentRecord>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist(&records).await
    }

    async fn load(&self) -> Vec<AttachmentRecord> {
        let blob = match self.local.get(&self.slot).await {
            Ok(blob) => blob,
            Err(error) => {
                tracing::warn!(slot = %self.slot, store = self.local.name(), ?error, "Could not read local cache");
                return Vec::new();
            },
        };
        match blob.as_deref().and_then(mirror::from_local) {
            Some(records) => records,
            None => {
                tracing::info!(slot = %self.slot, "Resetting local cache to an empty list");
                if let Err(error) = self.local.set(&self.slot, EMPTY_LIST).await {
                    tracing::warn!(slot = %self.slot, ?error, "Could not reset local cache");
                }
                Vec::new()
            },
        }
    }

    async fn persist(&self, records: &[AttachmentRecord]) -> Result<()> {
        let blob = mirror::to_local(records)?;
        self.local.set(&self.slot, &blob).await.or_raise(|| ErrorKind::LocalWrite(self.slot.clone()))?;
        tracing::debug!(slot = %self.slot, count = records.len(), "Local cache written");
        Ok(())
    }

    fn push(&self, records: &[AttachmentRecord]) -> RemotePush {
        let snapshot = match mirror::to_remote(records) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(?error, "Could not build remote snapshot");
                return RemotePush::skipped();
            },
        };
        let remote = self.remote.clone();
        let path = self.remote_path.clone();
        let pushes = self.pushes.clone();
        let sequence = pushes.issued.fetch_add(1, Ordering::SeqCst) + 1;
        RemotePush(Some(tokio::spawn(async move {
            let mut landed = pushes.landed.lock().await;
            if *landed > sequence {
                tracing::debug!(sequence, "Skipping remote push superseded by a newer snapshot");
                return false;
            }
            let written = match remote.store(&path, snapshot).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(remote = remote.name(), %path, ?error, "Remote mirror push failed");
                    false
                },
            };
            *landed = sequence;
            written
        })))
    }
}
