//! The clipboard package envelope and the lenient shape of incoming records.

use crate::error::{Error, ErrorKind, Result};
use desk_models::{AttachmentId, AttachmentRecord, Category, ComplaintId, ComplaintReference, DataUri, DocumentType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

pub const PACKAGE_KIND: &str = "attachment-package";
/// Envelope tag written by earlier installs; accepted on import.
pub const LEGACY_PACKAGE_KIND: &str = "complaints_documents_package";
pub const PACKAGE_VERSION: &str = "1.0";

/// Envelope around a full export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPackage {
    pub kind: String,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub total_count: usize,
    pub attachments: Vec<AttachmentRecord>,
}
impl TransferPackage {
    pub fn new(attachments: Vec<AttachmentRecord>, exported_at: OffsetDateTime) -> Self {
        Self {
            kind: PACKAGE_KIND.to_string(),
            version: PACKAGE_VERSION.to_string(),
            exported_at,
            total_count: attachments.len(),
            attachments,
        }
    }
}

/// Counts shown before (and after) importing a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageSummary {
    pub total: usize,
    pub before: usize,
    pub after: usize,
    pub linked: usize,
}
impl PackageSummary {
    pub(crate) fn of(incoming: &[IncomingAttachment]) -> Self {
        incoming.iter().fold(Self::default(), |mut summary, attachment| {
            summary.total += 1;
            match attachment.document_type {
                DocumentType::Before => summary.before += 1,
                DocumentType::After => summary.after += 1,
                DocumentType::Document => {},
            }
            if attachment.is_linked() {
                summary.linked += 1;
            }
            summary
        })
    }
}

/// A record as pasted: only `name`, `type` and `data` are required. Its `id`
/// and `uploadDate` are ignored, since ingest always mints new ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IncomingAttachment {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    mime_type: String,
    #[serde(rename = "data", default)]
    payload: String,
    #[serde(rename = "size", default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    complaint_id: Option<ComplaintId>,
    #[serde(rename = "complaintRef", default)]
    complaint_reference: Option<ComplaintReference>,
    #[serde(default)]
    document_type: DocumentType,
}
impl IncomingAttachment {
    fn is_linked(&self) -> bool {
        self.complaint_id.is_some() || self.complaint_reference.as_ref().is_some_and(|r| !r.is_empty())
    }

    fn validate(self) -> std::result::Result<Self, String> {
        let missing: Vec<&str> = [("name", &self.name), ("type", &self.mime_type), ("data", &self.payload)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();
        if missing.is_empty() { Ok(self) } else { Err(format!("missing {}", missing.join(", "))) }
    }

    pub(crate) fn into_record(self, id: AttachmentId, uploaded_at: OffsetDateTime) -> AttachmentRecord {
        let payload = DataUri::from_raw(self.payload);
        let size_bytes = self.size_bytes.or_else(|| payload.decoded_len()).unwrap_or(0);
        let category = self.category.unwrap_or_else(|| Category::from_mime(&self.mime_type));
        AttachmentRecord {
            id,
            name: self.name,
            mime_type: self.mime_type,
            size_bytes,
            category,
            payload,
            uploaded_at,
            complaint_id: self.complaint_id,
            complaint_reference: self.complaint_reference,
            document_type: self.document_type,
        }
    }
}

fn parse_json(text: &str) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() {
        exn::bail!(ErrorKind::ClipboardEmpty);
    }
    serde_json::from_str(text).map_err(|e| ErrorKind::Validation(format!("not JSON ({e})")).into())
}

fn decode_attachment(value: Value) -> std::result::Result<IncomingAttachment, String> {
    serde_json::from_value::<IncomingAttachment>(value).map_err(|e| e.to_string())?.validate()
}

/// Parse one pasted record.
pub(crate) fn parse_one(text: &str) -> Result<IncomingAttachment> {
    let value = parse_json(text)?;
    if !value.is_object() {
        exn::bail!(ErrorKind::Validation("expected a single attachment".to_string()));
    }
    decode_attachment(value).map_err(|reason| ErrorKind::Validation(reason).into())
}

/// Parse a pasted package (current or legacy envelope).
pub(crate) fn parse_package(text: &str) -> Result<Vec<IncomingAttachment>> {
    let Value::Object(mut envelope) = parse_json(text)? else {
        exn::bail!(ErrorKind::Validation("expected an attachment package".to_string()));
    };
    let kind = envelope.get("kind").or_else(|| envelope.get("type")).and_then(Value::as_str);
    if !matches!(kind, Some(PACKAGE_KIND | LEGACY_PACKAGE_KIND)) {
        exn::bail!(ErrorKind::Validation("not an attachment package".to_string()));
    }
    let items = match envelope.remove("attachments").or_else(|| envelope.remove("documents")) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => exn::bail!(ErrorKind::Validation("package contains no attachments".to_string())),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            decode_attachment(item)
                .map_err(|reason| Error::from(ErrorKind::Validation(format!("attachment {}: {reason}", index + 1))))
        })
        .collect()
}
