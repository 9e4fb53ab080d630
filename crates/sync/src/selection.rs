//! The complaint currently selected by the operator.

use desk_models::ComplaintId;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, observable complaint selection.
///
/// Clones observe and change the same selection. Nothing is selected until
/// the operator selects something; the desk never auto-selects.
#[derive(Debug, Clone)]
pub struct Selection {
    sender: Arc<watch::Sender<Option<ComplaintId>>>,
}
impl Selection {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender: Arc::new(sender) }
    }

    /// Change the selection. Selecting the current complaint again is not a
    /// change.
    pub fn select(&self, complaint_id: Option<ComplaintId>) {
        self.sender.send_if_modified(|current| {
            if *current == complaint_id {
                return false;
            }
            *current = complaint_id;
            true
        });
    }

    pub fn current(&self) -> Option<ComplaintId> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn watch(&self) -> watch::Receiver<Option<ComplaintId>> {
        self.sender.subscribe()
    }
}
impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_select_notifies_watchers_once() {
        let selection = Selection::new();
        let mut watcher = selection.watch();
        assert_eq!(selection.current(), None);

        selection.select(Some("c1".into()));
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow_and_update().as_ref().map(ComplaintId::as_str), Some("c1"));

        selection.select(Some("c1".into()));
        assert!(!watcher.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_selection() {
        let selection = Selection::new();
        let other = selection.clone();
        other.select(Some("c9".into()));
        assert_eq!(selection.current().as_ref().map(ComplaintId::as_str), Some("c9"));
    }
}
