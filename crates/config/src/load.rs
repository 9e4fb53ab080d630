use crate::error::{ErrorKind, Result};
use crate::settings::{Settings, project_dirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `DESK_INTAKE__MAX_FILE_BYTES`.
pub const ENV_PREFIX: &str = "DESK_";
/// Environment variable naming the config file; not itself a setting.
pub const CONFIG_ENV: &str = "DESK_CONFIG";

/// `config.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

fn file_provider(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// Load settings: defaults, then the config file, then `DESK_` environment
/// variables (nested with `__`).
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut figment = Figment::new();
    match path {
        Some(path) => {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            figment = file_provider(figment, path)?;
        },
        None => {
            if let Some(default) = default_config_path().filter(|p| p.is_file()) {
                tracing::debug!(path = %default.display(), "Using default config file");
                figment = file_provider(figment, &default)?;
            }
        },
    }
    let prefix = ENV_PREFIX.to_ascii_lowercase();
    let config_key = CONFIG_ENV.to_ascii_lowercase();
    let config_key = config_key.trim_start_matches(prefix.as_str());
    figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&[config_key]).split("__"));
    let settings: Settings = figment.extract().or_raise(|| ErrorKind::Parse)?;
    settings.validate()
}
