//! Whole-file replacement that readers never observe half-written.

use crate::error::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}

/// Sibling temp file, unique per process and per call, hidden by the leading
/// dot (which valid keys can never start with).
fn temp_path(target: &Path) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
    target.with_file_name(format!(".{file_name}.{}.{n}.tmp", std::process::id()))
}

/// Write `data` to a temp file next to `target`, then rename it into place.
pub(crate) async fn write(target: &Path, data: &[u8]) -> Result<(), ErrorKind> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await.map_err(|e| map_io_error(e, parent))?;
    }
    let temp = temp_path(target);
    if let Err(e) = fs::write(&temp, data).await {
        return Err(map_io_error(e, &temp));
    }
    if let Err(e) = fs::rename(&temp, target).await {
        // Leave nothing behind; the original error is what matters.
        _ = fs::remove_file(&temp).await;
        return Err(map_io_error(e, target));
    }
    Ok(())
}
