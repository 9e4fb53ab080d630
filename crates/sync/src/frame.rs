//! What a view is asked to draw.

use desk_cache::{Directory, attachments_for};
use desk_models::{AttachmentRecord, Complaint, ComplaintId, ComplaintReference};
use std::sync::Arc;

/// Everything needed to draw the attachment panel at one point in time.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Selected complaint, if any.
    pub selection: Option<ComplaintId>,
    /// Reference of the selected complaint, resolved through the directory.
    pub reference: Option<ComplaintReference>,
    /// The whole local attachment list.
    pub records: Vec<AttachmentRecord>,
    pub directory: Arc<Directory>,
}
impl Frame {
    pub fn new(selection: Option<ComplaintId>, records: Vec<AttachmentRecord>, directory: Arc<Directory>) -> Self {
        let reference = selection.as_ref().and_then(|id| directory.reference_of(id)).cloned();
        Self { selection, reference, records, directory }
    }

    /// Attachments linked to the selection (none without one).
    pub fn attachments(&self) -> Vec<&AttachmentRecord> {
        attachments_for(&self.records, self.selection.as_ref(), self.reference.as_ref())
    }

    pub fn complaint(&self) -> Option<&Complaint> {
        self.selection.as_ref().and_then(|id| self.directory.complaint(id))
    }
}

/// Anything that draws frames: a window, a terminal, a test recorder.
pub trait View: Send + Sync {
    fn render(&self, frame: &Frame);
}
