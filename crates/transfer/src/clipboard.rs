//! Plain-text clipboards.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;

pub type ClipboardHandle = Arc<dyn Clipboard + Send + Sync>;

/// A text-only clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Current clipboard text; empty if there is none.
    async fn read_text(&self) -> Result<String>;

    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RwLock<Option<String>>,
}
impl MemoryClipboard {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: RwLock::new(Some(text.into())) }
    }

    /// What was last written, if anything.
    pub async fn contents(&self) -> Option<String> {
        self.text.read().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn read_text(&self) -> Result<String> {
        Ok(self.text.read().await.clone().unwrap_or_default())
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        *self.text.write().await = Some(text.to_string());
        Ok(())
    }
}

/// Standard streams as a clipboard: exports are printed to stdout, imports
/// are read from stdin until EOF.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioClipboard;

#[async_trait]
impl Clipboard for StdioClipboard {
    async fn read_text(&self) -> Result<String> {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await.or_raise(|| ErrorKind::Clipboard)?;
        Ok(text)
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await.or_raise(|| ErrorKind::Clipboard)?;
        stdout.write_all(b"\n").await.or_raise(|| ErrorKind::Clipboard)?;
        stdout.flush().await.or_raise(|| ErrorKind::Clipboard)
    }
}
