//! Bootstrap fetch plus standing subscriptions, feeding one render loop.
//!
//! On start the reconciler fires a one-shot fetch of the attachment mirror
//! and, without waiting for it, subscribes to the attachment, complaint and
//! supervisor collections. Every snapshot overwrites the matching local cache
//! and asks for a render; renders are deferred briefly and coalesced.

use crate::error::{ErrorKind, Result};
use crate::frame::{Frame, View};
use crate::selection::Selection;
use derive_more::Display;
use desk_cache::{AttachmentStore, LookupCache, mirror};
use desk_models::ComplaintId;
use desk_storage::{ChangeStream, RemoteHandle};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

pub const DEFAULT_RENDER_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_COMPLAINTS_PATH: &str = "complaints";
pub const DEFAULT_SUPERVISORS_PATH: &str = "supervisors";
const EVENT_CAPACITY: usize = 256;

/// Remote collection a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Collection {
    #[display("attachments")]
    Attachments,
    #[display("complaints")]
    Complaints,
    #[display("supervisors")]
    Supervisors,
}

/// Progress published on the reconciler's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The one-shot fetch was installed into the local cache.
    Bootstrapped { count: usize },
    /// The one-shot fetch arrived after a live snapshot and was discarded.
    BootstrapSuperseded,
    /// A live snapshot overwrote a local cache.
    Applied { collection: Collection, count: usize },
    /// A live notification carried no data and was ignored.
    Absent { collection: Collection },
    /// A fetch or notification failed; the local cache was left as it was.
    Failed { collection: Collection, message: String },
    Rendered { selection: Option<ComplaintId>, shown: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderRequest {
    /// Draw as if nothing were selected (after bootstrap).
    Unselected,
    /// Draw the selection current at render time.
    Current,
}

/// Builder and shared state for a sync session.
pub struct Reconciler {
    store: Arc<AttachmentStore>,
    lookup: Arc<LookupCache>,
    selection: Selection,
    view: Arc<dyn View>,
    complaints_path: String,
    supervisors_path: String,
    render_delay: Duration,
    events: broadcast::Sender<SyncEvent>,
}
impl Reconciler {
    pub fn new(store: Arc<AttachmentStore>, lookup: Arc<LookupCache>, selection: Selection, view: Arc<dyn View>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            lookup,
            selection,
            view,
            complaints_path: DEFAULT_COMPLAINTS_PATH.to_string(),
            supervisors_path: DEFAULT_SUPERVISORS_PATH.to_string(),
            render_delay: DEFAULT_RENDER_DELAY,
            events,
        }
    }

    pub fn with_render_delay(mut self, render_delay: Duration) -> Self {
        self.render_delay = render_delay;
        self
    }

    pub fn with_directory_paths(mut self, complaints: impl Into<String>, supervisors: impl Into<String>) -> Self {
        self.complaints_path = complaints.into();
        self.supervisors_path = supervisors.into();
        self
    }

    /// Subscribe to [`SyncEvent`]s. Subscribe before [`start`](Self::start)
    /// to see the bootstrap.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Start the session: bootstrap, live subscriptions and the render loop
    /// run until [`SyncTask::stop`] is called.
    pub fn start(self) -> SyncTask {
        let token = CancellationToken::new();
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session {
            remote: self.store.remote().clone(),
            store: self.store,
            lookup: self.lookup,
            selection: self.selection,
            view: self.view,
            render_delay: self.render_delay,
            events: self.events.clone(),
            renders: render_tx,
            applied: Mutex::new(0),
        });
        let mut tasks = JoinSet::new();
        tasks.spawn(session.clone().render_loop(render_rx, token.clone()));
        tasks.spawn(session.clone().bootstrap(token.clone()));

        let documents = session.remote.subscribe(session.store.remote_path());
        tasks.spawn(session.clone().follow(Collection::Attachments, documents, token.clone()));
        let complaints = session.remote.subscribe(&self.complaints_path);
        tasks.spawn(session.clone().follow(Collection::Complaints, complaints, token.clone()));
        let supervisors = session.remote.subscribe(&self.supervisors_path);
        tasks.spawn(session.clone().follow(Collection::Supervisors, supervisors, token.clone()));
        tasks.spawn(session.clone().follow_selection(token.clone()));

        tracing::info!(remote = session.remote.name(), "Sync started");
        SyncTask { token, tasks, events: self.events }
    }
}

/// A running sync session.
pub struct SyncTask {
    token: CancellationToken,
    tasks: JoinSet<()>,
    events: broadcast::Sender<SyncEvent>,
}
impl SyncTask {
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Cancel the subscriptions and wait for every task to finish.
    pub async fn stop(mut self) -> Result<()> {
        self.token.cancel();
        let mut failed = None;
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(error) = joined {
                tracing::error!(%error, "Sync task failed");
                failed = Some(error.to_string());
            }
        }
        tracing::info!("Sync stopped");
        match failed {
            Some(message) => Err(ErrorKind::Task(message).into()),
            None => Ok(()),
        }
    }
}

struct Session {
    store: Arc<AttachmentStore>,
    lookup: Arc<LookupCache>,
    remote: RemoteHandle,
    selection: Selection,
    view: Arc<dyn View>,
    render_delay: Duration,
    events: broadcast::Sender<SyncEvent>,
    renders: mpsc::UnboundedSender<RenderRequest>,
    // Number of live attachment snapshots applied; guards the bootstrap
    // against overwriting a newer live snapshot.
    applied: Mutex<u64>,
}
impl Session {
    fn publish(&self, event: SyncEvent) {
        // No subscribers is normal.
        _ = self.events.send(event);
    }

    fn request_render(&self, request: RenderRequest) {
        _ = self.renders.send(request);
    }

    #[instrument(skip_all)]
    async fn bootstrap(self: Arc<Self>, token: CancellationToken) {
        let fetched = tokio::select! {
            _ = token.cancelled() => return,
            fetched = self.remote.fetch(self.store.remote_path()) => fetched,
        };
        match fetched {
            Ok(snapshot) => {
                let records = mirror::from_remote(snapshot);
                let count = records.len();
                let applied = self.applied.lock().await;
                if *applied > 0 {
                    tracing::debug!("Discarding bootstrap snapshot; a live snapshot already landed");
                    self.publish(SyncEvent::BootstrapSuperseded);
                } else if let Err(error) = self.store.replace_all(records).await {
                    tracing::warn!(?error, "Could not install bootstrap snapshot");
                    self.publish(SyncEvent::Failed { collection: Collection::Attachments, message: error.to_string() });
                } else {
                    tracing::info!(count, "Bootstrap snapshot installed");
                    self.publish(SyncEvent::Bootstrapped { count });
                }
            },
            Err(error) => {
                tracing::warn!(?error, "Bootstrap fetch failed");
                self.publish(SyncEvent::Failed { collection: Collection::Attachments, message: error.to_string() });
            },
        }
        self.request_render(RenderRequest::Unselected);
    }

    #[instrument(skip(self, changes, token))]
    async fn follow(self: Arc<Self>, collection: Collection, mut changes: ChangeStream, token: CancellationToken) {
        loop {
            let next = tokio::select! {
                _ = token.cancelled() => break,
                next = changes.next() => next,
            };
            match next {
                None => {
                    tracing::debug!("Subscription ended");
                    break;
                },
                Some(Err(error)) => {
                    tracing::warn!(?error, "Subscription error");
                    self.publish(SyncEvent::Failed { collection, message: error.to_string() });
                },
                Some(Ok(snapshot)) => self.apply(collection, snapshot).await,
            }
        }
    }

    async fn apply(&self, collection: Collection, snapshot: Option<Value>) {
        match collection {
            Collection::Attachments => {
                let Some(snapshot) = snapshot else {
                    tracing::debug!("Ignoring absent attachment snapshot");
                    self.publish(SyncEvent::Absent { collection });
                    return;
                };
                let records = mirror::from_remote(Some(snapshot));
                let count = records.len();
                let mut applied = self.applied.lock().await;
                if let Err(error) = self.store.replace_all(records).await {
                    tracing::warn!(?error, "Could not install live snapshot");
                    self.publish(SyncEvent::Failed { collection, message: error.to_string() });
                    return;
                }
                *applied += 1;
                self.publish(SyncEvent::Applied { collection, count });
            },
            Collection::Complaints => {
                // Absent still clears the in-memory directory and re-renders.
                let absent = snapshot.is_none();
                self.lookup.apply_complaints(snapshot).await;
                if absent {
                    self.publish(SyncEvent::Absent { collection });
                } else {
                    let count = self.lookup.snapshot().complaint_count();
                    self.publish(SyncEvent::Applied { collection, count });
                }
            },
            Collection::Supervisors => {
                let Some(snapshot) = snapshot else {
                    self.publish(SyncEvent::Absent { collection });
                    return;
                };
                self.lookup.apply_supervisors(Some(snapshot)).await;
                let count = self.lookup.snapshot().supervisor_count();
                self.publish(SyncEvent::Applied { collection, count });
            },
        }
        self.request_render(RenderRequest::Current);
    }

    async fn follow_selection(self: Arc<Self>, token: CancellationToken) {
        let mut watcher = self.selection.watch();
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                changed = watcher.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.request_render(RenderRequest::Current);
                },
            }
        }
    }

    async fn render_loop(self: Arc<Self>, mut requests: mpsc::UnboundedReceiver<RenderRequest>, token: CancellationToken) {
        loop {
            let first = tokio::select! {
                _ = token.cancelled() => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.render_delay) => {},
            }
            // Everything queued during the deferral is covered by one render.
            let mut request = first;
            while let Ok(queued) = requests.try_recv() {
                if queued == RenderRequest::Current {
                    request = RenderRequest::Current;
                }
            }
            self.render(request).await;
        }
    }

    async fn render(&self, request: RenderRequest) {
        let selection = match request {
            RenderRequest::Unselected => None,
            RenderRequest::Current => self.selection.current(),
        };
        let frame = Frame::new(selection, self.store.list().await, self.lookup.snapshot());
        let shown = frame.attachments().len();
        self.view.render(&frame);
        tracing::trace!(shown, "Rendered");
        self.publish(SyncEvent::Rendered { selection: frame.selection, shown });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_cache::mirror::to_remote;
    use desk_models::{AttachmentId, AttachmentRecord, Category, ComplaintReference, DataUri, DocumentType};
    use desk_storage::{MemoryRemote, MemoryStore, RemoteCollection};
    use serde_json::json;
    use std::sync::PoisonError;
    use time::macros::datetime;

    #[derive(Default)]
    struct Recorder {
        frames: std::sync::Mutex<Vec<Frame>>,
    }
    impl Recorder {
        fn last(&self) -> Option<Frame> {
            self.frames.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
        }
    }
    impl View for Recorder {
        fn render(&self, frame: &Frame) {
            self.frames.lock().unwrap_or_else(PoisonError::into_inner).push(frame.clone());
        }
    }

    struct Harness {
        remote: MemoryRemote,
        store: Arc<AttachmentStore>,
        selection: Selection,
        view: Arc<Recorder>,
        task: SyncTask,
        events: broadcast::Receiver<SyncEvent>,
    }

    fn start(remote: MemoryRemote) -> Harness {
        let local = Arc::new(MemoryStore::default());
        let store = Arc::new(AttachmentStore::new(local.clone(), Arc::new(remote.clone())));
        let lookup = Arc::new(LookupCache::new(local));
        let selection = Selection::new();
        let view = Arc::new(Recorder::default());
        let reconciler = Reconciler::new(store.clone(), lookup, selection.clone(), view.clone());
        let events = reconciler.events();
        let task = reconciler.start();
        Harness { remote, store, selection, view, task, events }
    }

    fn record(id: &str, complaint_id: Option<&str>, reference: Option<&str>) -> AttachmentRecord {
        AttachmentRecord {
            id: AttachmentId::new(id),
            name: format!("{id}.jpg"),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 3,
            category: Category::Image,
            payload: DataUri::encode("image/jpeg", b"abc"),
            uploaded_at: datetime!(2025-01-01 00:00:00 UTC),
            complaint_id: complaint_id.map(ComplaintId::from),
            complaint_reference: reference.map(ComplaintReference::from),
            document_type: DocumentType::Before,
        }
    }

    async fn wait_for(events: &mut broadcast::Receiver<SyncEvent>, wanted: impl Fn(&SyncEvent) -> bool) -> SyncEvent {
        let found = tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                let event = events.recv().await.unwrap();
                if wanted(&event) {
                    return event;
                }
            }
        });
        found.await.unwrap()
    }

    fn ids(records: &[AttachmentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_installs_remote_and_shows_nothing_unselected() {
        let snapshot = to_remote(&[record("a", Some("c1"), None)]).unwrap();
        let mut h = start(MemoryRemote::with_documents([("documents", snapshot)]));
        let rendered = wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { .. })).await;
        assert_eq!(rendered, SyncEvent::Rendered { selection: None, shown: 0 });
        assert_eq!(ids(&h.store.list().await), vec!["a"]);
        assert!(h.view.last().unwrap().attachments().is_empty());
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_bootstrap_does_not_overwrite_live_snapshot() {
        let snapshot = to_remote(&[record("a", None, None)]).unwrap();
        let remote = MemoryRemote::with_documents([("documents", snapshot)]).with_latency(Duration::from_millis(50));
        let mut h = start(remote);
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Applied { collection: Collection::Attachments, .. })).await;
        wait_for(&mut h.events, |e| *e == SyncEvent::BootstrapSuperseded).await;
        assert_eq!(ids(&h.store.list().await), vec!["a"]);
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_change_renders_current_selection() {
        let mut h = start(MemoryRemote::default());
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { .. })).await;

        h.selection.select(Some("c1".into()));
        let rendered = wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { selection: Some(_), .. })).await;
        assert_eq!(rendered, SyncEvent::Rendered { selection: Some("c1".into()), shown: 0 });

        // Another device adds a photo for c1.
        let other_device = h.remote.clone();
        let snapshot = to_remote(&[record("p1", Some("c1"), None), record("p2", Some("c2"), None)]).unwrap();
        other_device.store("documents", snapshot).await.unwrap();
        let rendered = wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { shown: 1, .. })).await;
        assert_eq!(rendered, SyncEvent::Rendered { selection: Some("c1".into()), shown: 1 });
        assert_eq!(ids(&h.store.list().await), vec!["p1", "p2"]);
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_snapshot_is_ignored() {
        let snapshot = to_remote(&[record("keep", None, None)]).unwrap();
        let mut h = start(MemoryRemote::with_documents([("documents", snapshot)]));
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Applied { collection: Collection::Attachments, .. })).await;

        h.remote.store("documents", Value::Null).await.unwrap();
        wait_for(&mut h.events, |e| *e == SyncEvent::Absent { collection: Collection::Attachments }).await;
        assert_eq!(ids(&h.store.list().await), vec!["keep"]);
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_snapshot_is_idempotent() {
        let mut h = start(MemoryRemote::default());
        let snapshot = to_remote(&[record("a", None, None), record("b", None, None)]).unwrap();
        h.remote.store("documents", snapshot.clone()).await.unwrap();
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Applied { count: 2, .. })).await;
        let once = h.store.list().await;
        h.remote.store("documents", snapshot).await.unwrap();
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Applied { count: 2, .. })).await;
        assert_eq!(h.store.list().await, once);
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_bootstrap_still_renders_empty_frame() {
        let remote = MemoryRemote::default();
        remote.set_offline(true);
        let mut h = start(remote);
        let failed = wait_for(&mut h.events, |e| matches!(e, SyncEvent::Failed { .. })).await;
        assert!(matches!(failed, SyncEvent::Failed { collection: Collection::Attachments, .. }));
        let rendered = wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { .. })).await;
        assert_eq!(rendered, SyncEvent::Rendered { selection: None, shown: 0 });
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_complaint_directory_enables_reference_links() {
        let snapshot = to_remote(&[record("legacy", None, Some("2025/007"))]).unwrap();
        let mut h = start(MemoryRemote::with_documents([("documents", snapshot)]));
        h.selection.select(Some("c1".into()));
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { selection: Some(_), shown: 0 })).await;

        h.remote.store("complaints", json!({ "c1": { "complaintId": "2025/007", "customerName": "Omar" } })).await.unwrap();
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { shown: 1, .. })).await;
        let frame = h.view.last().unwrap();
        assert_eq!(frame.reference.as_ref().map(ComplaintReference::as_str), Some("2025/007"));
        assert_eq!(frame.complaint().map(|c| c.customer_name.as_str()), Some("Omar"));
        h.task.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_subscriptions() {
        let mut h = start(MemoryRemote::default());
        wait_for(&mut h.events, |e| matches!(e, SyncEvent::Rendered { .. })).await;
        h.task.stop().await.unwrap();

        let snapshot = to_remote(&[record("late", None, None)]).unwrap();
        h.remote.store("documents", snapshot).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.store.list().await.is_empty());
    }
}
