//! Complaint linkage queries over the attachment list.
//!
//! Attachments are linked to a complaint by internal id, by reference code,
//! or both (older records carry only one of the two). Every query here treats
//! either match as a link. Pure functions; nothing here touches storage.

use derive_more::Display;
use desk_models::{AttachmentRecord, Category, ComplaintId, ComplaintReference, DocumentType};
use std::str::FromStr;

/// Whether `record` belongs to the complaint identified by `complaint_id`
/// and (if known) `reference`. A blank reference counts as unknown.
pub fn is_linked_to(record: &AttachmentRecord, complaint_id: &ComplaintId, reference: Option<&ComplaintReference>) -> bool {
    if record.complaint_id.as_ref() == Some(complaint_id) {
        return true;
    }
    match reference.filter(|reference| !reference.is_empty()) {
        Some(reference) => record.complaint_reference.as_ref() == Some(reference),
        None => false,
    }
}

/// Attachments linked to the selected complaint. Nothing is selected, nothing
/// is shown.
pub fn attachments_for<'a>(
    records: &'a [AttachmentRecord],
    complaint_id: Option<&ComplaintId>,
    reference: Option<&ComplaintReference>,
) -> Vec<&'a AttachmentRecord> {
    let Some(complaint_id) = complaint_id else {
        return Vec::new();
    };
    records.iter().filter(|record| is_linked_to(record, complaint_id, reference)).collect()
}

/// Number of attachments linked to the selected complaint.
pub fn count_for(records: &[AttachmentRecord], complaint_id: Option<&ComplaintId>, reference: Option<&ComplaintReference>) -> usize {
    match complaint_id {
        Some(complaint_id) => records.iter().filter(|record| is_linked_to(record, complaint_id, reference)).count(),
        None => 0,
    }
}

/// Secondary filter applied after linkage (or over everything, in the global
/// documents view).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum Filter {
    #[default]
    #[display("all")]
    All,
    #[display("before")]
    Before,
    #[display("after")]
    After,
    /// Neither before nor after.
    #[display("document")]
    Document,
    #[display("linked")]
    Linked,
    #[display("unlinked")]
    Unlinked,
    #[display("{_0}")]
    Category(Category),
}
impl Filter {
    pub fn matches(&self, record: &AttachmentRecord) -> bool {
        match self {
            Self::All => true,
            Self::Before => record.document_type == DocumentType::Before,
            Self::After => record.document_type == DocumentType::After,
            Self::Document => record.document_type == DocumentType::Document,
            Self::Linked => record.is_linked(),
            Self::Unlinked => !record.is_linked(),
            Self::Category(category) => record.category == *category,
        }
    }
}
impl FromStr for Filter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "document" => Ok(Self::Document),
            "linked" => Ok(Self::Linked),
            "unlinked" => Ok(Self::Unlinked),
            other => other.parse::<Category>().map(Self::Category).map_err(|_| format!("unknown filter `{other}`")),
        }
    }
}

/// A filter plus an optional case-insensitive search term.
///
/// The term matches against the file name and the complaint reference.
///
/// # Examples
///
/// ```
/// use desk_cache::{Filter, Query};
///
/// let query = Query::new(Filter::Before).with_search("Leak");
/// assert_eq!(query.filter(), Filter::Before);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filter: Filter,
    // Stored lowercased; `None` when blank.
    search: Option<String>,
}
impl Query {
    pub fn new(filter: Filter) -> Self {
        Self { filter, search: None }
    }

    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn matches(&self, record: &AttachmentRecord) -> bool {
        if !self.filter.matches(record) {
            return false;
        }
        let Some(term) = &self.search else {
            return true;
        };
        record.name.to_lowercase().contains(term.as_str())
            || record.complaint_reference.as_ref().is_some_and(|r| r.as_str().to_lowercase().contains(term.as_str()))
    }

    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a AttachmentRecord>) -> Vec<&'a AttachmentRecord> {
        records.into_iter().filter(|record| self.matches(record)).collect()
    }
}

/// Counts over a (usually filtered) set of attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub total_bytes: u64,
    pub before: usize,
    pub after: usize,
    /// Images tagged neither before nor after.
    pub neutral_images: usize,
    /// Non-images, plus anything tagged as a plain document.
    pub documents: usize,
}
impl Stats {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a AttachmentRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            stats.total_bytes += record.size_bytes;
            let is_image = record.category == Category::Image;
            match record.document_type {
                DocumentType::Before => stats.before += 1,
                DocumentType::After => stats.after += 1,
                DocumentType::Document if is_image => stats.neutral_images += 1,
                DocumentType::Document => {},
            }
            if !is_image || record.document_type == DocumentType::Document {
                stats.documents += 1;
            }
            stats
        })
    }
}

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size in base 1024 with at most two decimals, trailing zeros
/// dropped (`0 Bytes`, `1.5 KB`, `2 MB`).
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted} {}", SIZE_UNITS[unit])
}
