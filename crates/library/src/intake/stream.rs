use crate::Context;
use crate::intake::error::Error as IntakeError;
use crate::intake::{Target, intake_file};
use async_stream::stream;
use desk_cache::RemotePush;
use desk_models::AttachmentRecord;
use futures::Stream;
use std::path::PathBuf;

pub enum IntakeEvent {
    Started { files: usize },
    /// The push completes in the background; await it before exiting.
    Accepted { record: Box<AttachmentRecord>, push: RemotePush },
    Rejected { path: PathBuf, error: IntakeError },
    Complete { accepted: usize, rejected: usize },
}

/// Take in a batch of files, one at a time, in order.
pub fn intake(ctx: Context, target: Target, paths: Vec<PathBuf>) -> impl Stream<Item = IntakeEvent> + Send + 'static {
    stream! {
        yield IntakeEvent::Started { files: paths.len() };
        let (mut accepted, mut rejected) = (0, 0);
        for path in paths {
            match intake_file(&ctx, &target, &path).await {
                Ok((record, push)) => {
                    accepted += 1;
                    yield IntakeEvent::Accepted { record: Box::new(record), push };
                },
                Err(error) => {
                    tracing::warn!(path = %path.display(), ?error, "File not taken in");
                    rejected += 1;
                    yield IntakeEvent::Rejected { path, error };
                },
            }
        }
        yield IntakeEvent::Complete { accepted, rejected };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Limits;
    use crate::intake::error::ErrorKind;
    use desk_cache::{AttachmentStore, LookupCache};
    use desk_models::DocumentType;
    use desk_storage::{MemoryRemote, MemoryStore};
    use futures::StreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rejection_does_not_stop_batch() {
        let local = Arc::new(MemoryStore::default());
        let store = Arc::new(AttachmentStore::new(local.clone(), Arc::new(MemoryRemote::default())));
        let ctx = Context::new(store.clone(), Arc::new(LookupCache::new(local))).with_limits(Limits { max_file_bytes: 4 });

        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = [("a.jpg", 3), ("b.pdf", 3), ("c.png", 9), ("d.gif", 4)]
            .into_iter()
            .map(|(name, len)| {
                let path = dir.path().join(name);
                std::fs::write(&path, vec![1u8; len]).unwrap();
                path
            })
            .collect();

        let events: Vec<_> = intake(ctx, Target::new(None, DocumentType::Document), paths).collect().await;
        let mut names = vec![];
        let mut reasons = vec![];
        for event in events {
            match event {
                IntakeEvent::Started { files } => assert_eq!(files, 4),
                IntakeEvent::Accepted { record, .. } => names.push(record.name),
                IntakeEvent::Rejected { error, .. } => reasons.push(matches!(&*error, ErrorKind::TooLarge { .. })),
                IntakeEvent::Complete { accepted, rejected } => assert_eq!((accepted, rejected), (2, 2)),
            }
        }
        assert_eq!(names, vec!["a.jpg", "d.gif"]);
        assert_eq!(reasons, vec![false, true]);
        assert_eq!(store.list().await.len(), 2);
    }
}
