// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ExecConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it into an
/// [`ExecConfig`].
///
/// Relative `working_dir` / `output_dir` values are resolved against the
/// directory containing the config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExecConfig> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut config = ExecConfig::try_from(raw)?;

    if let Some(base) = config_root_dir(path) {
        if config.working_dir.is_relative() {
            config.working_dir = base.join(&config.working_dir);
        }
        if config.output_dir.is_relative() {
            config.output_dir = base.join(&config.output_dir);
        }
    }

    Ok(config)
}

/// Helper to resolve a default config path: `Builddag.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Builddag.toml")
}

/// Directory the config file lives in, or `None` for a bare file name.
fn config_root_dir(config_path: &Path) -> Option<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Some(parent.to_path_buf()),
        _ => None,
    }
}
