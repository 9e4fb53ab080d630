//! Complaint and staff records, consumed read-only by the desk.
//!
//! These collections are written by the complaint CRUD views; the desk only
//! needs them to resolve reference codes and display names.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::OffsetDateTime;

/// Internal id of a complaint (the key of the `complaints` collection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(String);
impl ComplaintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for ComplaintId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Human-readable complaint code, `{year}/{sequence}` (e.g. `2025/007`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintReference(String);
impl ComplaintReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `(year, sequence)` parsed leniently: each part contributes its leading
    /// digits, anything unparseable counts as zero.
    pub fn parts(&self) -> (i64, i64) {
        let mut parts = self.0.split('/');
        let year = parts.next().map(leading_int).unwrap_or(0);
        let sequence = parts.next().map(leading_int).unwrap_or(0);
        (year, sequence)
    }
}
impl From<&str> for ComplaintReference {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

fn leading_int(part: &str) -> i64 {
    let part = part.trim_start();
    let (negative, digits) = match part.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, part.strip_prefix('+').unwrap_or(part)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);
    if negative { -value } else { value }
}

/// Resolution state of a complaint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[serde(alias = "in-progress")]
    #[display("processing")]
    Processing,
    #[display("resolved")]
    Resolved,
    #[serde(other)]
    #[display("unknown")]
    Unknown,
}

/// One entry of the `complaints` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Complaint {
    /// Stored as `complaintId` by the complaint views, despite being the
    /// human-readable reference.
    #[serde(rename = "complaintId")]
    pub reference: Option<ComplaintReference>,
    pub complaint_year: Option<i64>,
    pub complaint_number: Option<i64>,
    pub customer_name: String,
    pub customer_title: Option<String>,
    pub phone_number: String,
    pub building_number: String,
    pub area: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub supervisor: Option<String>,
    pub supervisor_id: Option<String>,
    pub manager: Option<String>,
    pub manager_id: Option<String>,
    pub complaint_type: String,
    pub complaint_content: String,
    pub notes: Option<String>,
    pub status: ComplaintStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_status_update: Option<OffsetDateTime>,
    pub closure_comment: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub closure_date: Option<OffsetDateTime>,
}
impl Complaint {
    /// The reference code, unless missing or blank.
    pub fn reference(&self) -> Option<&ComplaintReference> {
        self.reference.as_ref().filter(|r| !r.is_empty())
    }

    /// `(year, sequence)` used to order complaints, oldest first.
    ///
    /// Falls back to the stored year/number when there is no reference code.
    pub fn sort_key(&self) -> (i64, i64) {
        match self.reference() {
            Some(reference) => reference.parts(),
            None => (self.complaint_year.unwrap_or(0), self.complaint_number.unwrap_or(0)),
        }
    }

    /// Customer name prefixed with their title, unless the title is the `-`
    /// placeholder.
    pub fn customer_display_name(&self) -> String {
        match self.customer_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() && title != "-" => format!("{title} {}", self.customer_name),
            _ => self.customer_name.clone(),
        }
    }
}

/// Compare two complaints by their [`sort_key`](Complaint::sort_key).
pub fn by_reference(a: &Complaint, b: &Complaint) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// One entry of the `supervisors` or `managers` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffMember {
    pub name: String,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
}
impl StaffMember {
    /// Name prefixed with the title, unless the title is the `-` placeholder.
    pub fn display_name(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() && title != "-" => format!("{title} {}", self.name),
            _ => self.name.clone(),
        }
    }
}

pub type Supervisor = StaffMember;
