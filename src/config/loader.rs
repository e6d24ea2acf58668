// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RekindleError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config file if there is one.
///
/// - An explicit path (from `--config`) must exist.
/// - Otherwise `Rekindle.toml` in the working directory is used when present.
/// - Without either, the supervisor runs on CLI flags and defaults alone.
pub fn load_optional(explicit: Option<&Path>) -> Result<Option<ConfigFile>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(RekindleError::ConfigError(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return load_and_validate(path).map(Some);
    }

    let default = default_config_path();
    if default.is_file() {
        debug!(path = %default.display(), "loading default config file");
        return load_and_validate(&default).map(Some);
    }

    Ok(None)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rekindle.toml")
}
