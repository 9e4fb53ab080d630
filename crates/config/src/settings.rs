//! Settings tree and its defaults.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const APPLICATION: &str = "complaint-desk";

/// Default cap on a single intake file, 50 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

/// Everything the desk can be configured with.
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where local slots live. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Name of the signed-in operator. Without one every desk operation is
    /// refused as unauthenticated.
    pub operator: Option<String>,
    pub slots: Slots,
    pub remote: Remote,
    pub intake: Intake,
    pub sync: SyncSettings,
}
impl Settings {
    /// The configured data directory, or the platform default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dirs = project_dirs().ok_or_raise(|| ErrorKind::NoDefaultLocation)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Directory shared with other desks when the `directory` backend is used.
    pub fn remote_root(&self) -> Result<PathBuf> {
        match &self.remote.root {
            Some(root) => Ok(root.clone()),
            None => Ok(self.data_dir()?.join("remote")),
        }
    }

    pub(crate) fn validate(self) -> Result<Self> {
        for (field, key) in [
            ("slots.attachments", &self.slots.attachments),
            ("slots.complaints", &self.slots.complaints),
            ("slots.supervisors", &self.slots.supervisors),
        ] {
            desk_storage::validate_key(key).or_raise(|| ErrorKind::Invalid(format!("{field} `{key}`")))?;
        }
        let slots = [&self.slots.attachments, &self.slots.complaints, &self.slots.supervisors];
        if slots[0] == slots[1] || slots[0] == slots[2] || slots[1] == slots[2] {
            exn::bail!(ErrorKind::Invalid("slot keys must be distinct".to_string()));
        }
        for (field, path) in [
            ("remote.attachments", &self.remote.attachments),
            ("remote.complaints", &self.remote.complaints),
            ("remote.supervisors", &self.remote.supervisors),
        ] {
            desk_storage::validate_collection(path).or_raise(|| ErrorKind::Invalid(format!("{field} `{path}`")))?;
        }
        for (field, dir) in [("data_dir", &self.data_dir), ("remote.root", &self.remote.root)] {
            if dir.as_deref().is_some_and(|dir| !dir.is_absolute()) {
                exn::bail!(ErrorKind::Invalid(format!("{field} must be an absolute path")));
            }
        }
        if self.operator.as_deref().is_some_and(|name| name.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid("operator must not be blank".to_string()));
        }
        if self.intake.max_file_bytes == 0 {
            exn::bail!(ErrorKind::Invalid("intake.max_file_bytes must be positive".to_string()));
        }
        if self.remote.poll_interval_ms == 0 {
            exn::bail!(ErrorKind::Invalid("remote.poll_interval_ms must be positive".to_string()));
        }
        Ok(self)
    }
}

/// Local slot keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Slots {
    pub attachments: String,
    pub complaints: String,
    pub supervisors: String,
}
impl Default for Slots {
    fn default() -> Self {
        Self {
            attachments: "complaints_documents".to_string(),
            complaints: "complaints_cache".to_string(),
            supervisors: "supervisors_cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process only; nothing is shared with other desks.
    Memory,
    /// One JSON document per collection in a shared directory.
    #[default]
    Directory,
}

/// The remote mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Remote {
    pub backend: Backend,
    /// Shared directory for the `directory` backend. Defaults to `remote/`
    /// under the data directory.
    pub root: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub attachments: String,
    pub complaints: String,
    pub supervisors: String,
}
impl Remote {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
impl Default for Remote {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            root: None,
            poll_interval_ms: 500,
            attachments: "documents".to_string(),
            complaints: "complaints".to_string(),
            supervisors: "supervisors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Intake {
    pub max_file_bytes: u64,
}
impl Default for Intake {
    fn default() -> Self {
        Self { max_file_bytes: DEFAULT_MAX_FILE_BYTES }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Deferral before each render.
    pub render_delay_ms: u64,
}
impl SyncSettings {
    pub fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }
}
impl Default for SyncSettings {
    fn default() -> Self {
        Self { render_delay_ms: 100 }
    }
}
