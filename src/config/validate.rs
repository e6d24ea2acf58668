// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RekindleError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RekindleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_patterns(&raw)?;
        validate_preload(&raw)?;
        let interval = validate_interval(raw.watch.interval.as_deref())?;
        let grace_period = raw
            .run
            .grace_period
            .as_deref()
            .map(|s| parse_config_duration("[run].grace_period", s))
            .transpose()?;
        Ok(ConfigFile::new_unchecked(raw, interval, grace_period))
    }
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    if let Some(globs) = &cfg.watch.glob {
        if globs.is_empty() {
            return Err(RekindleError::ConfigError(
                "[watch].glob must contain at least one pattern".to_string(),
            ));
        }
        build_globset(globs)
            .map_err(|e| RekindleError::ConfigError(format!("[watch].glob: {e:#}")))?;
    }
    build_globset(&cfg.watch.exclude)
        .map_err(|e| RekindleError::ConfigError(format!("[watch].exclude: {e:#}")))?;
    Ok(())
}

fn validate_preload(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.preload.modules.iter() {
        validate_module_name(name)?;
    }
    if let Some(exts) = &cfg.preload.extensions {
        if exts.is_empty() || exts.iter().any(|e| e.trim().is_empty()) {
            return Err(RekindleError::ConfigError(
                "[preload].extensions must list non-empty extensions".to_string(),
            ));
        }
    }
    Ok(())
}

/// Module names are dotted identifiers (`pkg.sub`); empty segments are
/// rejected because they can never resolve to a path.
pub fn validate_module_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.split('.').any(|seg| seg.is_empty()) {
        return Err(RekindleError::ConfigError(format!(
            "invalid preload module name '{name}'"
        )));
    }
    Ok(())
}

/// Poll interval must be strictly positive; a zero interval would spin.
pub fn validate_interval(value: Option<&str>) -> Result<Option<Duration>> {
    let Some(s) = value else {
        return Ok(None);
    };
    let interval = parse_config_duration("interval", s)?;
    if interval.is_zero() {
        return Err(RekindleError::ConfigError(
            "interval must be greater than zero".to_string(),
        ));
    }
    Ok(Some(interval))
}

pub fn parse_config_duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| RekindleError::ConfigError(format!("{field}: {e}")))
}
