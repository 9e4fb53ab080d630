//! Writing a stored attachment back out as a file.

use crate::Context;
use crate::error::{ErrorKind, Result};
use desk_models::AttachmentId;
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// Decode attachment `id` into `destination`.
///
/// When `destination` is an existing directory the file keeps its original
/// name inside it. Returns the path written.
pub async fn download(ctx: &Context, id: &AttachmentId, destination: &Path) -> Result<PathBuf> {
    let record = ctx.store.get(id).await.ok_or_raise(|| ErrorKind::NotFound(id.to_string()))?;
    let bytes = record.payload.decode().or_raise(|| ErrorKind::Download(record.name.clone()))?;

    let target = match tokio::fs::metadata(destination).await {
        Ok(metadata) if metadata.is_dir() => {
            // Names come from other desks; never let one climb out of the directory.
            let name = Path::new(&record.name).file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(id.as_str()));
            destination.join(name)
        },
        _ => destination.to_path_buf(),
    };
    tokio::fs::write(&target, &bytes).await.or_raise(|| ErrorKind::Download(target.display().to_string()))?;
    tracing::info!(%id, path = %target.display(), bytes = bytes.len(), "Attachment downloaded");
    Ok(target)
}
