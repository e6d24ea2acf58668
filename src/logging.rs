// src/logging.rs

//! Diagnostic logging for `rekindle`.
//!
//! The filter is chosen from, first match wins:
//! 1. `--log-level`
//! 2. `REKINDLE_LOG`, which takes any `EnvFilter` directive list
//!    (`debug`, `rekindle::exec=trace,warn`)
//! 3. `warn`
//!
//! Diagnostics go to stderr; stdout belongs to the supervised program. Normal
//! progress is reported through [`crate::status`] lines instead, which is why
//! the default is quiet.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "REKINDLE_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => env_filter(std::env::var(LOG_ENV).ok().as_deref()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Filter for a `REKINDLE_LOG` value; unset, blank or malformed values fall
/// back to `warn`.
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
