use crate::auth::AuthHandle;
use crate::context::Context;
use crate::download::download;
use crate::error::{ErrorKind, Result, wrap};
use crate::intake::{IntakeEvent, Target, intake};
use desk_cache::{Query, RemotePush, Stats, attachments_for, count_for};
use desk_models::{AttachmentId, AttachmentRecord, ComplaintId, ComplaintReference, ComplaintStatus};
use desk_sync::{Reconciler, View};
use desk_transfer::{ClipboardHandle, PackageSummary, Transfer};
use exn::OptionExt;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One line of the complaint directory, with its attachment count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRow {
    pub id: ComplaintId,
    pub reference: Option<ComplaintReference>,
    pub customer: String,
    pub supervisor: Option<String>,
    pub status: ComplaintStatus,
    pub attachments: usize,
}

/// The attachment desk, as the operator sees it.
///
/// Every entry point asks the [`AuthGate`](crate::AuthGate) first and fails
/// with [`ErrorKind::Unauthenticated`] before touching any store, remote or
/// clipboard.
pub struct Desk {
    ctx: Context,
    auth: AuthHandle,
    transfer: Transfer,
}
impl Desk {
    pub fn new(ctx: Context, auth: AuthHandle, clipboard: ClipboardHandle) -> Self {
        let transfer = Transfer::new(ctx.store.clone(), clipboard, ctx.minter.clone());
        Self { ctx, auth, transfer }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The signed-in operator.
    pub async fn operator(&self) -> Result<String> {
        let operator = self.auth.operator().await.ok_or_raise(|| ErrorKind::Unauthenticated)?;
        tracing::trace!(%operator, "Authorized");
        Ok(operator)
    }

    /// Change the selected complaint.
    pub async fn select(&self, complaint_id: Option<ComplaintId>) -> Result<()> {
        self.operator().await?;
        self.ctx.selection.select(complaint_id);
        Ok(())
    }

    /// Every attachment matching `query` (the global documents view).
    pub async fn attachments(&self, query: &Query) -> Result<Vec<AttachmentRecord>> {
        self.operator().await?;
        let records = self.ctx.store.list().await;
        Ok(query.apply(&records).into_iter().cloned().collect())
    }

    /// Attachments linked to `complaint_id` that match `query`. Without a
    /// complaint nothing is linked.
    pub async fn attachments_for(&self, complaint_id: Option<&ComplaintId>, query: &Query) -> Result<Vec<AttachmentRecord>> {
        self.operator().await?;
        let records = self.ctx.store.list().await;
        let directory = self.ctx.directory();
        let reference = complaint_id.and_then(|id| directory.reference_of(id));
        let linked = attachments_for(&records, complaint_id, reference);
        Ok(query.apply(linked).into_iter().cloned().collect())
    }

    /// Attachments linked to the selected complaint.
    pub async fn selected_attachments(&self, query: &Query) -> Result<Vec<AttachmentRecord>> {
        let selection = self.ctx.selection.current();
        self.attachments_for(selection.as_ref(), query).await
    }

    pub async fn count_for(&self, complaint_id: Option<&ComplaintId>) -> Result<usize> {
        self.operator().await?;
        let records = self.ctx.store.list().await;
        let directory = self.ctx.directory();
        let reference = complaint_id.and_then(|id| directory.reference_of(id));
        Ok(count_for(&records, complaint_id, reference))
    }

    pub async fn stats(&self, query: &Query) -> Result<Stats> {
        let records = self.attachments(query).await?;
        Ok(Stats::of(&records))
    }

    /// The complaint directory, oldest reference first.
    pub async fn complaints(&self) -> Result<Vec<ComplaintRow>> {
        self.operator().await?;
        let records = self.ctx.store.list().await;
        let directory = self.ctx.directory();
        let rows = directory
            .complaints_by_reference()
            .into_iter()
            .map(|(id, complaint)| ComplaintRow {
                id: id.clone(),
                reference: complaint.reference().cloned(),
                customer: complaint.customer_display_name(),
                supervisor: directory.supervisor_name(complaint),
                status: complaint.status,
                attachments: count_for(&records, Some(id), complaint.reference()),
            })
            .collect();
        Ok(rows)
    }

    /// Take in a batch of files. See [`intake`](crate::intake::intake).
    pub async fn intake(&self, target: Target, paths: Vec<PathBuf>) -> Result<impl Stream<Item = IntakeEvent> + Send + 'static> {
        self.operator().await?;
        Ok(intake(self.ctx.clone(), target, paths))
    }

    /// Delete one attachment. Returns `None` when no attachment has that id;
    /// nothing is written in that case.
    pub async fn remove(&self, id: &AttachmentId) -> Result<Option<RemotePush>> {
        self.operator().await?;
        let removed = wrap(self.ctx.store.remove(id).await, ErrorKind::Store)?;
        match &removed {
            Some(_) => tracing::info!(%id, "Attachment removed"),
            None => tracing::debug!(%id, "No attachment to remove"),
        }
        Ok(removed)
    }

    pub async fn download(&self, id: &AttachmentId, destination: &Path) -> Result<PathBuf> {
        self.operator().await?;
        download(&self.ctx, id, destination).await
    }

    pub async fn export_one(&self, id: &AttachmentId) -> Result<String> {
        self.operator().await?;
        wrap(self.transfer.export_one(id).await, ErrorKind::Transfer)
    }

    pub async fn export_all(&self) -> Result<String> {
        self.operator().await?;
        wrap(self.transfer.export_all().await, ErrorKind::Transfer)
    }

    pub async fn import_one(&self, text: &str) -> Result<(AttachmentRecord, RemotePush)> {
        self.operator().await?;
        wrap(self.transfer.import_one(text).await, ErrorKind::Transfer)
    }

    pub async fn import_many(&self, text: &str) -> Result<(PackageSummary, RemotePush)> {
        self.operator().await?;
        wrap(self.transfer.import_many(text).await, ErrorKind::Transfer)
    }

    /// Import one attachment from the clipboard.
    pub async fn paste_one(&self) -> Result<(AttachmentRecord, RemotePush)> {
        self.operator().await?;
        wrap(self.transfer.paste_one().await, ErrorKind::Transfer)
    }

    /// Import a package from the clipboard.
    pub async fn paste_many(&self) -> Result<(PackageSummary, RemotePush)> {
        self.operator().await?;
        wrap(self.transfer.paste_many().await, ErrorKind::Transfer)
    }

    pub async fn summarize(&self, text: &str) -> Result<PackageSummary> {
        self.operator().await?;
        wrap(Transfer::summarize(text), ErrorKind::Transfer)
    }

    /// A sync session for this desk's store, directories and selection,
    /// ready to be configured and started.
    pub async fn reconciler(&self, view: Arc<dyn View>) -> Result<Reconciler> {
        self.operator().await?;
        Ok(Reconciler::new(self.ctx.store.clone(), self.ctx.lookup.clone(), self.ctx.selection.clone(), view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;
    use desk_cache::{AttachmentStore, Filter, LookupCache};
    use desk_models::{Category, DataUri, DocumentType};
    use desk_storage::{MemoryRemote, MemoryStore};
    use desk_transfer::MemoryClipboard;
    use serde_json::json;

    fn record(id: &str, complaint_id: Option<&str>, reference: Option<&str>, document_type: DocumentType) -> AttachmentRecord {
        AttachmentRecord {
            id: AttachmentId::new(id),
            name: format!("{id}.jpg"),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 10,
            category: Category::Image,
            payload: DataUri::encode("image/jpeg", b"0123456789"),
            uploaded_at: time::OffsetDateTime::UNIX_EPOCH,
            complaint_id: complaint_id.map(ComplaintId::from),
            complaint_reference: reference.map(ComplaintReference::from),
            document_type,
        }
    }

    async fn desk(auth: StaticAuth) -> (Desk, Arc<MemoryRemote>, Arc<MemoryClipboard>) {
        let local = Arc::new(MemoryStore::default());
        let remote = Arc::new(MemoryRemote::default());
        let store = Arc::new(AttachmentStore::new(local.clone(), remote.clone()));
        store
            .extend(vec![
                record("by-id", Some("c1"), None, DocumentType::Before),
                record("by-ref", None, Some("2025/007"), DocumentType::After),
                record("other", Some("c2"), Some("2025/008"), DocumentType::Before),
                record("loose", None, None, DocumentType::Document),
            ])
            .await
            .unwrap()
            .settled()
            .await;
        let lookup = Arc::new(LookupCache::new(local));
        lookup
            .apply_complaints(Some(json!({
                "c1": { "complaintId": "2025/007", "customerName": "Omar", "supervisorId": "s1", "status": "processing" },
                "c2": { "complaintId": "2025/008", "customerName": "Sara" },
            })))
            .await;
        lookup.apply_supervisors(Some(json!({ "s1": { "name": "Mahmoud", "title": "Eng." } }))).await;
        let clipboard = Arc::new(MemoryClipboard::default());
        let desk = Desk::new(Context::new(store, lookup), Arc::new(auth), clipboard.clone());
        (desk, remote, clipboard)
    }

    fn ids(records: Vec<AttachmentRecord>) -> Vec<String> {
        records.into_iter().map(|r| r.id.as_str().to_string()).collect()
    }

    #[tokio::test]
    async fn test_signed_out_touches_nothing() {
        let (desk, remote, clipboard) = desk(StaticAuth::signed_out()).await;
        let stores_before = remote.store_count();
        let before = desk.context().store.list().await;

        let id = AttachmentId::new("by-id");
        let errors = vec![
            desk.attachments(&Query::default()).await.map(|_| ()).unwrap_err(),
            desk.count_for(None).await.map(|_| ()).unwrap_err(),
            desk.remove(&id).await.map(|_| ()).unwrap_err(),
            desk.export_all().await.map(|_| ()).unwrap_err(),
            desk.export_one(&id).await.map(|_| ()).unwrap_err(),
            desk.import_many("{}").await.map(|_| ()).unwrap_err(),
            desk.select(Some("c1".into())).await.unwrap_err(),
            desk.intake(Target::default(), vec![]).await.map(|_| ()).unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(&*err, ErrorKind::Unauthenticated));
        }
        assert_eq!(desk.context().store.list().await, before);
        assert_eq!(remote.store_count(), stores_before);
        assert_eq!(clipboard.contents().await, None);
        assert_eq!(desk.context().selection.current(), None);
    }

    #[tokio::test]
    async fn test_linkage_uses_directory_reference() {
        let (desk, _remote, _clipboard) = desk(StaticAuth::signed_in("reception")).await;
        let linked = desk.attachments_for(Some(&"c1".into()), &Query::default()).await.unwrap();
        assert_eq!(ids(linked), vec!["by-id", "by-ref"]);
        let before = desk.attachments_for(Some(&"c1".into()), &Query::new(Filter::Before)).await.unwrap();
        assert_eq!(ids(before), vec!["by-id"]);
        assert_eq!(desk.count_for(Some(&"c1".into())).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_nothing_selected_shows_nothing() {
        let (desk, _remote, _clipboard) = desk(StaticAuth::signed_in("reception")).await;
        assert!(desk.selected_attachments(&Query::default()).await.unwrap().is_empty());
        assert_eq!(desk.count_for(None).await.unwrap(), 0);

        desk.select(Some("c2".into())).await.unwrap();
        assert_eq!(ids(desk.selected_attachments(&Query::default()).await.unwrap()), vec!["other"]);
    }

    #[tokio::test]
    async fn test_complaint_rows() {
        let (desk, _remote, _clipboard) = desk(StaticAuth::signed_in("reception")).await;
        let rows = desk.complaints().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "c1".into());
        assert_eq!(rows[0].supervisor.as_deref(), Some("Eng. Mahmoud"));
        assert_eq!(rows[0].status, ComplaintStatus::Processing);
        assert_eq!(rows[0].attachments, 2);
        assert_eq!(rows[1].attachments, 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_changes_nothing() {
        let (desk, remote, _clipboard) = desk(StaticAuth::signed_in("reception")).await;
        let before = desk.attachments(&Query::default()).await.unwrap();
        let stores_before = remote.store_count();
        assert!(desk.remove(&"nope".into()).await.unwrap().is_none());
        assert_eq!(desk.attachments(&Query::default()).await.unwrap(), before);
        assert_eq!(remote.store_count(), stores_before);

        let push = desk.remove(&"loose".into()).await.unwrap().unwrap();
        assert!(push.settled().await);
        assert_eq!(desk.attachments(&Query::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stats_over_everything() {
        let (desk, _remote, _clipboard) = desk(StaticAuth::signed_in("reception")).await;
        let stats = desk.stats(&Query::default()).await.unwrap();
        assert_eq!((stats.total, stats.before, stats.after, stats.total_bytes), (4, 2, 1, 40));
    }
}
