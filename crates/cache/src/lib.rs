//! Local attachment cache and complaint linkage queries.
//!
//! The local slot is not the source of truth across devices (the remote
//! mirror is), but it is the only copy this device can always read. It is
//! written first on every mutation and overwritten by every remote snapshot.
//!
//! # Architecture
//! - [`AttachmentStore`]: the only writer of the attachment slot; pushes the
//!   full collection to the remote mirror after each mutation.
//! - [`mirror`]: the one place that converts between the cached list, the
//!   remote keyed map, and whatever malformed shape either turns out to hold.
//! - [`resolve`]: pure queries linking attachments to complaints.
//! - [`LookupCache`]: cached complaint and supervisor directories.

pub mod error;
mod lookup;
pub mod mirror;
pub mod resolve;
mod store;

pub use crate::lookup::{DEFAULT_COMPLAINTS_SLOT, DEFAULT_SUPERVISORS_SLOT, Directory, LookupCache};
pub use crate::resolve::{Filter, Query, Stats, attachments_for, count_for, format_size};
pub use crate::store::{AttachmentStore, DEFAULT_REMOTE_PATH, DEFAULT_SLOT, RemotePush};
