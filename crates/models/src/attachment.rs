//! The attachment record and its classification enums.

use crate::complaint::{ComplaintId, ComplaintReference};
use crate::id::AttachmentId;
use crate::payload::DataUri;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Coarse classification derived from a MIME type once, at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[display("image")]
    Image,
    #[display("pdf")]
    Pdf,
    #[display("word")]
    Word,
    #[display("excel")]
    Excel,
    #[display("powerpoint")]
    PowerPoint,
    #[display("other")]
    #[serde(other)]
    Other,
}
impl Category {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            Self::Image
        } else if mime_type == "application/pdf" {
            Self::Pdf
        } else if mime_type.contains("word") {
            Self::Word
        } else if mime_type.contains("excel") || mime_type.contains("spreadsheet") {
            Self::Excel
        } else if mime_type.contains("powerpoint") || mime_type.contains("presentation") {
            Self::PowerPoint
        } else {
            Self::Other
        }
    }
}
impl FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "word" => Ok(Self::Word),
            "excel" => Ok(Self::Excel),
            "powerpoint" => Ok(Self::PowerPoint),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown category `{other}`")),
        }
    }
}

/// Operator-selected role of an attachment. Set at intake, never changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Evidence photographed before the complaint was worked on.
    #[display("before")]
    Before,
    /// Evidence photographed after resolution.
    #[display("after")]
    After,
    #[default]
    #[display("document")]
    Document,
}
impl FromStr for DocumentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "document" => Ok(Self::Document),
            other => Err(format!("unknown document type `{other}`")),
        }
    }
}

/// One uploaded file.
///
/// Field names on the wire match what deployed installs already persist
/// (`type`, `size`, `data`, `uploadDate`, `complaintRef`) so existing caches
/// and clipboard packages remain readable. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: AttachmentId,
    /// Original filename; display only.
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub category: Category,
    #[serde(rename = "data")]
    pub payload: DataUri,
    #[serde(rename = "uploadDate", with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    #[serde(default)]
    pub complaint_id: Option<ComplaintId>,
    #[serde(rename = "complaintRef", default)]
    pub complaint_reference: Option<ComplaintReference>,
    #[serde(default)]
    pub document_type: DocumentType,
}
impl AttachmentRecord {
    /// Whether the record is linked to any complaint (by either key).
    pub fn is_linked(&self) -> bool {
        self.complaint_id.is_some() || self.complaint_reference.as_ref().is_some_and(|r| !r.is_empty())
    }
}
