//! The complaint desk: intake, linkage queries, transfer and sync behind one
//! authenticated facade.
//!
//! A [`Context`] carries the attachment store, directory cache, id minter,
//! selection and intake limits; nothing here reaches for global state. The
//! [`Desk`] wraps a context with an [`AuthGate`] and a clipboard.

mod auth;
mod context;
mod desk;
pub mod download;
pub mod error;
pub mod intake;

pub use crate::auth::{AuthGate, AuthHandle, StaticAuth};
pub use crate::context::{Context, Limits};
pub use crate::desk::{ComplaintRow, Desk};
