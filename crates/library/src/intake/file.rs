use crate::Context;
use crate::intake::error::{ErrorKind, Result};
use desk_cache::RemotePush;
use desk_models::{AttachmentRecord, Category, ComplaintId, DataUri, DocumentType, mime};
use exn::ResultExt;
use std::path::Path;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;

/// Where new attachments go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// `None` files the attachments as general documents.
    pub complaint_id: Option<ComplaintId>,
    pub document_type: DocumentType,
}
impl Target {
    pub fn new(complaint_id: Option<ComplaintId>, document_type: DocumentType) -> Self {
        Self { complaint_id, document_type }
    }

    /// The complaint currently selected in `ctx`.
    pub fn selected(ctx: &Context, document_type: DocumentType) -> Self {
        Self::new(ctx.selection.current(), document_type)
    }
}

/// Read at most `limit` bytes; a file that grew past the cap since its
/// metadata was checked is still rejected.
async fn read_capped(path: &Path, name: &str, limit: u64) -> Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await.or_raise(|| ErrorKind::Read(name.to_string()))?;
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).await.or_raise(|| ErrorKind::Read(name.to_string()))?;
    if bytes.len() as u64 > limit {
        exn::bail!(ErrorKind::TooLarge { name: name.to_string(), size: bytes.len() as u64, limit });
    }
    Ok(bytes)
}

fn display_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

/// Take in one file and append it to the store.
///
/// The complaint reference is copied from the directory as it is right now;
/// it is not updated if the complaint is renumbered later.
///
/// # Errors
/// [`Unsupported`](ErrorKind::Unsupported) and [`TooLarge`](ErrorKind::TooLarge)
/// are raised without opening the file.
pub async fn intake_file(ctx: &Context, target: &Target, path: &Path) -> Result<(AttachmentRecord, RemotePush)> {
    let name = display_name(path);
    let mime_type = mime::from_path(path);
    if !mime::is_image(mime_type) {
        exn::bail!(ErrorKind::Unsupported { name });
    }

    let metadata = tokio::fs::metadata(path).await.or_raise(|| ErrorKind::Read(name.clone()))?;
    let limit = ctx.limits.max_file_bytes;
    if metadata.len() > limit {
        exn::bail!(ErrorKind::TooLarge { name, size: metadata.len(), limit });
    }

    let bytes = read_capped(path, &name, limit).await?;
    let now = OffsetDateTime::now_utc();
    let complaint_reference =
        target.complaint_id.as_ref().and_then(|complaint_id| ctx.directory().reference_of(complaint_id).cloned());
    let record = AttachmentRecord {
        id: ctx.minter.mint_at(now),
        name,
        mime_type: mime_type.to_string(),
        size_bytes: bytes.len() as u64,
        category: Category::from_mime(mime_type),
        payload: DataUri::encode(mime_type, &bytes),
        uploaded_at: now,
        complaint_id: target.complaint_id.clone(),
        complaint_reference,
        document_type: target.document_type,
    };
    let push = ctx.store.add(record.clone()).await.or_raise(|| ErrorKind::Store(record.name.clone()))?;
    tracing::info!(
        id = %record.id,
        name = %record.name,
        size = record.size_bytes,
        complaint = ?record.complaint_reference,
        "Attachment taken in"
    );
    Ok((record, push))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Limits;
    use desk_cache::{AttachmentStore, LookupCache};
    use desk_storage::{MemoryRemote, MemoryStore};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    async fn context() -> Context {
        let local = Arc::new(MemoryStore::default());
        let store = Arc::new(AttachmentStore::new(local.clone(), Arc::new(MemoryRemote::default())));
        let lookup = Arc::new(LookupCache::new(local));
        lookup.apply_complaints(Some(json!({ "c1": { "complaintId": "2025/007", "customerName": "Omar" } }))).await;
        Context::new(store, lookup).with_limits(Limits { max_file_bytes: 16 })
    }

    #[tokio::test]
    async fn test_intake_embeds_content_and_reference() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Leak.JPG");
        std::fs::write(&path, b"\xff\xd8\xff\xe0jpeg").unwrap();

        let target = Target::new(Some("c1".into()), DocumentType::Before);
        let (record, _push) = intake_file(&ctx, &target, &path).await.unwrap();
        assert_eq!(record.name, "Leak.JPG");
        assert_eq!(record.mime_type, "image/jpeg");
        assert_eq!(record.category, Category::Image);
        assert_eq!(record.size_bytes, 8);
        assert_eq!(record.payload.decode().unwrap(), b"\xff\xd8\xff\xe0jpeg");
        assert_eq!(record.complaint_reference.as_ref().map(|r| r.as_str()), Some("2025/007"));
        assert_eq!(ctx.store.list().await, vec![record]);
    }

    #[tokio::test]
    async fn test_unknown_complaint_has_no_reference() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"png").unwrap();

        let (record, _push) = intake_file(&ctx, &Target::new(Some("c9".into()), DocumentType::After), &path).await.unwrap();
        assert_eq!(record.complaint_id, Some("c9".into()));
        assert_eq!(record.complaint_reference, None);
    }

    #[rstest]
    #[case("notes.pdf", b"%PDF".as_slice())]
    #[case("README", b"hello".as_slice())]
    #[tokio::test]
    async fn test_non_images_rejected(#[case] name: &str, #[case] contents: &[u8]) {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();

        let err = intake_file(&ctx, &Target::default(), &path).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported { .. }));
        assert!(err.is_rejection());
        assert!(ctx.store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_size_checked_before_reading() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        std::fs::write(&path, [0u8; 17]).unwrap();

        let err = intake_file(&ctx, &Target::default(), &path).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::TooLarge { size: 17, limit: 16, .. }));
        assert!(ctx.store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_capped_stops_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grown.jpg");
        std::fs::write(&path, [0u8; 40]).unwrap();

        let err = read_capped(&path, "grown.jpg", 16).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::TooLarge { size: 17, limit: 16, .. }));
        assert_eq!(read_capped(&path, "grown.jpg", 40).await.unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let err = intake_file(&ctx, &Target::default(), &dir.path().join("gone.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
        assert!(!err.is_rejection());
    }
}
