//! Keeps the local caches in step with the remote mirror.
//!
//! A [`Reconciler`] owns one sync session: a bootstrap fetch, standing
//! subscriptions to the attachment, complaint and supervisor collections,
//! and a render loop drawing [`Frame`]s into a [`View`] for the current
//! [`Selection`]. The session runs until [`SyncTask::stop`].

pub mod error;
mod frame;
mod reconciler;
mod selection;

pub use crate::frame::{Frame, View};
pub use crate::reconciler::{
    Collection, DEFAULT_COMPLAINTS_PATH, DEFAULT_RENDER_DELAY, DEFAULT_SUPERVISORS_PATH, Reconciler, SyncEvent, SyncTask,
};
pub use crate::selection::Selection;
