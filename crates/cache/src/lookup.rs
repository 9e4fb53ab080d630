//! Cached complaint and supervisor directories.
//!
//! Both collections belong to the complaint screens; the desk only reads them
//! to resolve reference codes and names. Each has its own local slot so the
//! first paint doesn't wait on the network, refreshed on every remote
//! notification.

use crate::mirror;
use desk_models::{Complaint, ComplaintId, ComplaintReference, StaffMember, by_reference};
use desk_storage::LocalHandle;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

pub const DEFAULT_COMPLAINTS_SLOT: &str = "complaints_cache";
pub const DEFAULT_SUPERVISORS_SLOT: &str = "supervisors_cache";

/// Immutable snapshot of both directories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    complaints: BTreeMap<ComplaintId, Complaint>,
    supervisors: BTreeMap<String, StaffMember>,
}
impl Directory {
    pub fn new(complaints: BTreeMap<ComplaintId, Complaint>, supervisors: BTreeMap<String, StaffMember>) -> Self {
        Self { complaints, supervisors }
    }

    pub fn complaint(&self, id: &ComplaintId) -> Option<&Complaint> {
        self.complaints.get(id)
    }

    /// Reference code of a complaint, if the complaint is known and has one.
    pub fn reference_of(&self, id: &ComplaintId) -> Option<&ComplaintReference> {
        self.complaint(id).and_then(Complaint::reference)
    }

    pub fn complaint_count(&self) -> usize {
        self.complaints.len()
    }

    pub fn supervisor_count(&self) -> usize {
        self.supervisors.len()
    }

    /// All complaints, oldest reference first.
    pub fn complaints_by_reference(&self) -> Vec<(&ComplaintId, &Complaint)> {
        let mut complaints: Vec<_> = self.complaints.iter().collect();
        complaints.sort_by(|(_, a), (_, b)| by_reference(a, b));
        complaints
    }

    /// Display name of the supervisor assigned to a complaint.
    ///
    /// Looked up by `supervisorId`, then by `supervisor` used as a key, and
    /// finally `supervisor` is shown verbatim.
    pub fn supervisor_name(&self, complaint: &Complaint) -> Option<String> {
        let by_id = complaint.supervisor_id.as_ref().and_then(|id| self.supervisors.get(id));
        let by_key = || complaint.supervisor.as_ref().and_then(|key| self.supervisors.get(key));
        match by_id.or_else(by_key) {
            Some(supervisor) => Some(supervisor.display_name()),
            None => complaint.supervisor.clone().filter(|name| !name.trim().is_empty()),
        }
    }
}

/// Lookup cache for the complaint and supervisor directories.
///
/// Accessors hand out an [`Arc`] snapshot, so readers never block writers for
/// longer than a pointer swap.
pub struct LookupCache {
    local: LocalHandle,
    complaints_slot: String,
    supervisors_slot: String,
    snapshot: RwLock<Arc<Directory>>,
}
impl LookupCache {
    pub fn new(local: LocalHandle) -> Self {
        Self {
            local,
            complaints_slot: DEFAULT_COMPLAINTS_SLOT.to_string(),
            supervisors_slot: DEFAULT_SUPERVISORS_SLOT.to_string(),
            snapshot: RwLock::new(Arc::new(Directory::default())),
        }
    }

    pub fn with_slots(mut self, complaints_slot: impl Into<String>, supervisors_slot: impl Into<String>) -> Self {
        self.complaints_slot = complaints_slot.into();
        self.supervisors_slot = supervisors_slot.into();
        self
    }

    /// Current snapshot of both directories.
    pub fn snapshot(&self) -> Arc<Directory> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, change: impl FnOnce(&mut Directory)) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        change(Arc::make_mut(&mut *guard));
    }

    /// Populate both directories from their local slots. Unreadable or
    /// malformed slots load as empty.
    pub async fn load(&self) {
        let complaints = self.read_slot(&self.complaints_slot).await;
        let supervisors = self.read_slot(&self.supervisors_slot).await;
        let complaints = into_complaints(mirror::keyed_from_value("complaints", complaints));
        let supervisors = mirror::keyed_from_value("supervisors", supervisors);
        tracing::debug!(complaints = complaints.len(), supervisors = supervisors.len(), "Loaded directory caches");
        self.update(|directory| *directory = Directory::new(complaints, supervisors));
    }

    /// Install a complaints notification.
    ///
    /// An absent snapshot clears the in-memory directory but leaves the slot
    /// alone, so the next start still paints from the last known list.
    pub async fn apply_complaints(&self, snapshot: Option<Value>) {
        let Some(value) = snapshot else {
            self.update(|directory| directory.complaints.clear());
            return;
        };
        self.write_slot(&self.complaints_slot, &value).await;
        let complaints = into_complaints(mirror::keyed_from_value("complaints", Some(value)));
        self.update(|directory| directory.complaints = complaints);
    }

    /// Install a supervisors notification. An absent snapshot is ignored.
    pub async fn apply_supervisors(&self, snapshot: Option<Value>) {
        let Some(value) = snapshot else {
            return;
        };
        self.write_slot(&self.supervisors_slot, &value).await;
        let supervisors = mirror::keyed_from_value("supervisors", Some(value));
        self.update(|directory| directory.supervisors = supervisors);
    }

    async fn read_slot(&self, slot: &str) -> Option<Value> {
        let blob = match self.local.get(slot).await {
            Ok(blob) => blob?,
            Err(error) => {
                tracing::warn!(slot, ?error, "Could not read directory cache");
                return None;
            },
        };
        match serde_json::from_str(&blob) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(slot, %error, "Ignoring malformed directory cache");
                None
            },
        }
    }

    async fn write_slot(&self, slot: &str, value: &Value) {
        let result = match serde_json::to_string(value) {
            Ok(blob) => self.local.set(slot, &blob).await,
            Err(error) => {
                tracing::warn!(slot, %error, "Could not serialize directory cache");
                return;
            },
        };
        if let Err(error) = result {
            tracing::warn!(slot, ?error, "Could not write directory cache");
        }
    }
}

fn into_complaints(keyed: BTreeMap<String, Complaint>) -> BTreeMap<ComplaintId, Complaint> {
    keyed.into_iter().map(|(id, complaint)| (ComplaintId::new(id), complaint)).collect()
}
