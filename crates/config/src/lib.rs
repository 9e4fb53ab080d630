//! Configuration for the complaint desk.
//!
//! Layered with `figment`: built-in defaults, then a TOML, YAML or JSON file
//! (chosen by extension), then `DESK_`-prefixed environment variables with
//! `__` separating nested keys.
//!
//! ```no_run
//! let settings = desk_config::load(None)?;
//! println!("{}", settings.data_dir()?.display());
//! # Ok::<(), desk_config::error::Error>(())
//! ```

pub mod error;
mod load;
mod settings;

pub use crate::load::{CONFIG_ENV, ENV_PREFIX, default_config_path, load};
pub use crate::settings::{Backend, DEFAULT_MAX_FILE_BYTES, Intake, Remote, Settings, Slots, SyncSettings};
