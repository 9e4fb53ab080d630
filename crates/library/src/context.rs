use desk_cache::{AttachmentStore, Directory, LookupCache};
use desk_config::DEFAULT_MAX_FILE_BYTES;
use desk_models::IdMinter;
use desk_sync::Selection;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Files larger than this are rejected before they are read.
    pub max_file_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self { max_file_bytes: DEFAULT_MAX_FILE_BYTES }
    }
}

/// Everything a desk operation needs, handed over at construction.
///
/// Cloning is cheap; every clone shares the same store, caches and selection.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<AttachmentStore>,
    pub(crate) lookup: Arc<LookupCache>,
    pub minter: Arc<IdMinter>,
    pub selection: Selection,
    pub limits: Limits,
}
impl Context {
    pub fn new(store: Arc<AttachmentStore>, lookup: Arc<LookupCache>) -> Self {
        Self { store, lookup, minter: Arc::new(IdMinter::new()), selection: Selection::new(), limits: Limits::default() }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Current snapshot of the complaint and supervisor directories.
    pub fn directory(&self) -> Arc<Directory> {
        self.lookup.snapshot()
    }
}
