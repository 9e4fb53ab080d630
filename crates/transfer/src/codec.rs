//! Export to and import from the clipboard.

use crate::clipboard::ClipboardHandle;
use crate::error::{ErrorKind, Result};
use crate::package::{self, PackageSummary, TransferPackage};
use desk_cache::{AttachmentStore, RemotePush};
use desk_models::{AttachmentId, AttachmentRecord, IdMinter};
use exn::{OptionExt, ResultExt};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::instrument;

/// Moves attachments between desks (or processes) as clipboard text.
///
/// Exports carry records verbatim; imports never trust the pasted `id` or
/// `uploadDate` and mint fresh ones, so pasting the same text twice yields
/// two independent copies.
pub struct Transfer {
    store: Arc<AttachmentStore>,
    clipboard: ClipboardHandle,
    minter: Arc<IdMinter>,
}
impl Transfer {
    pub fn new(store: Arc<AttachmentStore>, clipboard: ClipboardHandle, minter: Arc<IdMinter>) -> Self {
        Self { store, clipboard, minter }
    }

    /// Copy one record, as JSON, to the clipboard. Returns the copied text.
    #[instrument(skip(self))]
    pub async fn export_one(&self, id: &AttachmentId) -> Result<String> {
        let record = self.store.get(id).await.ok_or_raise(|| ErrorKind::NotFound(id.to_string()))?;
        let text = serde_json::to_string_pretty(&record).or_raise(|| ErrorKind::Serialize)?;
        self.clipboard.write_text(&text).await?;
        tracing::info!(name = %record.name, "Attachment copied");
        Ok(text)
    }

    /// Copy every record, wrapped in a [`TransferPackage`], to the clipboard.
    ///
    /// Refuses (without touching the clipboard) when there is nothing to copy.
    #[instrument(skip(self))]
    pub async fn export_all(&self) -> Result<String> {
        let records = self.store.list().await;
        if records.is_empty() {
            exn::bail!(ErrorKind::Empty);
        }
        let count = records.len();
        let package = TransferPackage::new(records, OffsetDateTime::now_utc());
        let text = serde_json::to_string_pretty(&package).or_raise(|| ErrorKind::Serialize)?;
        self.clipboard.write_text(&text).await?;
        tracing::info!(count, "Attachment package copied");
        Ok(text)
    }

    /// Import one record from text. Nothing is written unless it validates.
    #[instrument(skip_all)]
    pub async fn import_one(&self, text: &str) -> Result<(AttachmentRecord, RemotePush)> {
        let incoming = package::parse_one(text)?;
        let now = OffsetDateTime::now_utc();
        let record = incoming.into_record(self.minter.mint_at(now), now);
        let push = self.store.add(record.clone()).await.or_raise(|| ErrorKind::Store)?;
        tracing::info!(id = %record.id, name = %record.name, "Attachment imported");
        Ok((record, push))
    }

    /// Import a whole package from text, in one store write.
    ///
    /// Every element must validate before anything is written.
    #[instrument(skip_all)]
    pub async fn import_many(&self, text: &str) -> Result<(PackageSummary, RemotePush)> {
        let incoming = package::parse_package(text)?;
        let summary = PackageSummary::of(&incoming);
        let now = OffsetDateTime::now_utc();
        let records: Vec<_> =
            incoming.into_iter().map(|attachment| attachment.into_record(self.minter.mint_at(now), now)).collect();
        let push = self.store.extend(records).await.or_raise(|| ErrorKind::Store)?;
        tracing::info!(total = summary.total, "Attachment package imported");
        Ok((summary, push))
    }

    /// Summarize a package without importing it (for confirmation prompts).
    pub fn summarize(text: &str) -> Result<PackageSummary> {
        Ok(PackageSummary::of(&package::parse_package(text)?))
    }

    /// [`import_one`](Self::import_one) from the clipboard.
    pub async fn paste_one(&self) -> Result<(AttachmentRecord, RemotePush)> {
        let text = self.clipboard.read_text().await?;
        self.import_one(&text).await
    }

    /// [`import_many`](Self::import_many) from the clipboard.
    pub async fn paste_many(&self) -> Result<(PackageSummary, RemotePush)> {
        let text = self.clipboard.read_text().await?;
        self.import_many(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{Clipboard, MemoryClipboard};
    use crate::package::PACKAGE_KIND;
    use desk_models::{Category, ComplaintId, ComplaintReference, DataUri, DocumentType};
    use desk_storage::{MemoryRemote, MemoryStore};
    use serde_json::{Value, json};
    use std::collections::HashSet;
    use time::macros::datetime;

    fn record(id: &str, document_type: DocumentType) -> AttachmentRecord {
        AttachmentRecord {
            id: AttachmentId::new(id),
            name: format!("{id}.jpg"),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 3,
            category: Category::Image,
            payload: DataUri::encode("image/jpeg", b"abc"),
            uploaded_at: datetime!(2025-01-01 00:00:00 UTC),
            complaint_id: Some(ComplaintId::from("c1")),
            complaint_reference: Some(ComplaintReference::from("2025/007")),
            document_type,
        }
    }

    fn setup() -> (Arc<AttachmentStore>, Arc<MemoryClipboard>, Transfer) {
        let store = Arc::new(AttachmentStore::new(Arc::new(MemoryStore::default()), Arc::new(MemoryRemote::default())));
        let clipboard = Arc::new(MemoryClipboard::default());
        let transfer = Transfer::new(store.clone(), clipboard.clone(), Arc::new(IdMinter::new()));
        (store, clipboard, transfer)
    }

    #[tokio::test]
    async fn test_export_then_import_one_copies_with_new_identity() {
        let (store, clipboard, transfer) = setup();
        let original = record("orig", DocumentType::After);
        store.add(original.clone()).await.unwrap();

        let text = transfer.export_one(&original.id).await.unwrap();
        assert_eq!(clipboard.contents().await.as_deref(), Some(text.as_str()));

        let (copy, _push) = transfer.paste_one().await.unwrap();
        assert_ne!(copy.id, original.id);
        assert_ne!(copy.uploaded_at, original.uploaded_at);
        assert_eq!(
            AttachmentRecord { id: original.id.clone(), uploaded_at: original.uploaded_at, ..copy.clone() },
            original
        );
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_export_one_unknown_id_leaves_clipboard() {
        let (_store, clipboard, transfer) = setup();
        let err = transfer.export_one(&AttachmentId::new("nope")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(clipboard.contents().await, None);
    }

    #[tokio::test]
    async fn test_export_all_empty_store_refuses() {
        let (_store, clipboard, transfer) = setup();
        let err = transfer.export_all().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Empty));
        assert_eq!(clipboard.contents().await, None);
    }

    #[tokio::test]
    async fn test_export_all_wraps_package() {
        let (store, _clipboard, transfer) = setup();
        store.extend(vec![record("a", DocumentType::Before), record("b", DocumentType::After)]).await.unwrap();
        let text = transfer.export_all().await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], PACKAGE_KIND);
        assert_eq!(value["totalCount"], 2);
        assert_eq!(value["attachments"][0]["id"], "a");
    }

    #[tokio::test]
    async fn test_import_many_mints_distinct_ids_in_one_write() {
        let (store, _clipboard, transfer) = setup();
        store.extend(vec![record("a", DocumentType::Before), record("b", DocumentType::After)]).await.unwrap();
        let text = transfer.export_all().await.unwrap();

        let (summary, push) = transfer.paste_many().await.unwrap();
        assert!(push.settled().await);
        assert_eq!(summary, PackageSummary { total: 2, before: 1, after: 1, linked: 2 });
        assert_eq!(Transfer::summarize(&text).unwrap(), summary);

        let records = store.list().await;
        assert_eq!(records.len(), 4);
        let unique: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_import_many_is_non_destructive() {
        let (store, clipboard, transfer) = setup();
        store.add(record("keep", DocumentType::Before)).await.unwrap();
        let before = store.list().await;

        let broken = json!({
            "kind": PACKAGE_KIND,
            "attachments": [serde_json::to_value(record("x", DocumentType::Before)).unwrap(), { "name": "no data" }]
        });
        clipboard.write_text(&broken.to_string()).await.unwrap();
        let err = transfer.paste_many().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_paste_from_empty_clipboard() {
        let (store, _clipboard, transfer) = setup();
        assert!(matches!(&*transfer.paste_one().await.unwrap_err(), ErrorKind::ClipboardEmpty));
        assert!(matches!(&*transfer.paste_many().await.unwrap_err(), ErrorKind::ClipboardEmpty));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_import_one_rejects_missing_payload() {
        let (store, _clipboard, transfer) = setup();
        let text = json!({ "name": "a.jpg", "type": "image/jpeg" }).to_string();
        let err = transfer.import_one(&text).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert!(store.list().await.is_empty());
    }
}
