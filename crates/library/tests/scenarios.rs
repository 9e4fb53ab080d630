use desk_cache::{AttachmentStore, LookupCache, Query};
use desk_library::error::ErrorKind;
use desk_library::intake::IntakeEvent;
use desk_library::intake::Target;
use desk_library::{Context, Desk, StaticAuth};
use desk_models::{ComplaintId, DocumentType};
use desk_storage::{MemoryRemote, MemoryStore, RemoteCollection};
use desk_transfer::MemoryClipboard;
use futures::StreamExt;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

const MIB: u64 = 1024 * 1024;

struct Fixture {
    desk: Desk,
    remote: Arc<MemoryRemote>,
    clipboard: Arc<MemoryClipboard>,
    dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let local = Arc::new(MemoryStore::default());
    let remote = Arc::new(MemoryRemote::default());
    let store = Arc::new(AttachmentStore::new(local.clone(), remote.clone()));
    let lookup = Arc::new(LookupCache::new(local));
    lookup.apply_complaints(Some(json!({ "c1": { "complaintId": "2025/007", "customerName": "Omar" } }))).await;
    let clipboard = Arc::new(MemoryClipboard::default());
    let desk = Desk::new(Context::new(store, lookup), Arc::new(StaticAuth::signed_in("reception")), clipboard.clone());
    Fixture { desk, remote, clipboard, dir: tempfile::tempdir().unwrap() }
}

fn sparse_file(dir: &tempfile::TempDir, name: &str, len: u64) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::File::create(&path).unwrap().set_len(len).unwrap();
    path
}

#[tokio::test]
async fn test_photo_linked_counted_and_removed() {
    let Fixture { desk, remote, dir, .. } = fixture().await;
    let c1 = ComplaintId::from("c1");
    let photo = sparse_file(&dir, "leak.jpg", 2 * MIB);

    desk.select(Some(c1.clone())).await.unwrap();
    let target = Target::selected(desk.context(), DocumentType::Before);
    let mut events = desk.intake(target, vec![photo]).await.unwrap().boxed();
    while let Some(event) = events.next().await {
        if let IntakeEvent::Accepted { record, push } = event {
            assert!(push.settled().await);
            assert_eq!(record.size_bytes, 2 * MIB);
            assert_eq!(record.complaint_reference.as_ref().map(|r| r.as_str()), Some("2025/007"));
        }
    }

    assert_eq!(desk.attachments(&Query::default()).await.unwrap().len(), 1);
    assert_eq!(desk.count_for(Some(&c1)).await.unwrap(), 1);
    let mirrored = remote.fetch("documents").await.unwrap().unwrap();
    assert_eq!(mirrored.as_object().map(|m| m.len()), Some(1));

    let id = desk.selected_attachments(&Query::default()).await.unwrap()[0].id.clone();
    assert!(desk.remove(&id).await.unwrap().unwrap().settled().await);
    assert_eq!(desk.count_for(Some(&c1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_oversized_photo_rejected() {
    let Fixture { desk, dir, .. } = fixture().await;
    let photo = sparse_file(&dir, "huge.jpg", 60 * MIB);

    let events: Vec<_> = desk.intake(Target::default(), vec![photo]).await.unwrap().collect().await;
    let message = events
        .iter()
        .find_map(|event| match event {
            IntakeEvent::Rejected { error, .. } => Some(error.to_string()),
            _ => None,
        })
        .unwrap();
    assert!(message.contains("too large"), "{message}");
    assert!(message.contains("50 MB"), "{message}");
    assert!(desk.attachments(&Query::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_all_on_empty_store() {
    let Fixture { desk, clipboard, .. } = fixture().await;
    let err = desk.export_all().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Transfer(message) if message.contains("no attachments")));
    assert_eq!(clipboard.contents().await, None);
}

#[tokio::test]
async fn test_copy_paste_between_desks() {
    let source = fixture().await;
    let photo = sparse_file(&source.dir, "wall.png", 1024);
    let target = Target::new(Some("c1".into()), DocumentType::After);
    let _: Vec<_> = source.desk.intake(target, vec![photo]).await.unwrap().collect().await;
    source.desk.export_all().await.unwrap();
    let text = source.clipboard.contents().await.unwrap();

    let destination = fixture().await;
    let summary = destination.desk.summarize(&text).await.unwrap();
    assert_eq!((summary.total, summary.after, summary.linked), (1, 1, 1));
    let (imported, push) = destination.desk.import_many(&text).await.unwrap();
    assert!(push.settled().await);
    assert_eq!(imported, summary);
    assert_eq!(destination.desk.count_for(Some(&"c1".into())).await.unwrap(), 1);
}
