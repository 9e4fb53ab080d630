//! Domain models shared by every desk crate.
//!
//! - [`AttachmentRecord`]: one uploaded photo (or document) with its content
//!   embedded as a [`DataUri`], optionally linked to a complaint by internal
//!   id, by reference code, or both.
//! - [`Complaint`] and [`StaffMember`]: read-only views of the collections
//!   owned by the complaint CRUD screens.
//! - [`IdMinter`]: collision-free identifiers, even within one millisecond.

mod attachment;
mod complaint;
pub mod error;
mod id;
pub mod mime;
mod payload;

pub use crate::attachment::{AttachmentRecord, Category, DocumentType};
pub use crate::complaint::{
    Complaint, ComplaintId, ComplaintReference, ComplaintStatus, StaffMember, Supervisor, by_reference,
};
pub use crate::id::{AttachmentId, IdMinter};
pub use crate::payload::DataUri;
