// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{ClearMode, KeyboardMode, StopSignal};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// glob = ["**/*.py", "templates/**/*.html"]
/// exclude = [".venv/**"]
/// interval = "300ms"
///
/// [preload]
/// modules = ["pandas", "flask"]
/// auto_full_reload = false
///
/// [run]
/// interpreter = "python3"
/// clear = "screen"
/// ```
///
/// All sections are optional; the CLI overrides anything set here.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub preload: PreloadSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Glob patterns, relative to the working directory.
    ///
    /// If `None`, the built-in default `**/*.py` applies.
    #[serde(default)]
    pub glob: Option<Vec<String>>,

    /// Patterns removed from the watched set.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Poll interval as a duration string (`"300ms"`).
    #[serde(default)]
    pub interval: Option<String>,

    /// Compare content digests instead of only mtime/size.
    #[serde(default)]
    pub use_hash: Option<bool>,
}

/// `[preload]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PreloadSection {
    /// Ordered module names to keep warm across restarts.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Directories searched when resolving a module's backing files.
    #[serde(default)]
    pub search_paths: Option<Vec<String>>,

    /// File extensions that make up a module (without the dot).
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    #[serde(default)]
    pub silent: Option<bool>,

    #[serde(default)]
    pub auto_full_reload: Option<bool>,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    #[serde(default)]
    pub interpreter: Option<String>,

    #[serde(default)]
    pub clear: Option<ClearMode>,

    #[serde(default)]
    pub stop_signal: Option<StopSignal>,

    /// Duration string (`"2s"`) between the stop signal and the kill.
    #[serde(default)]
    pub grace_period: Option<String>,

    #[serde(default)]
    pub keyboard: Option<KeyboardMode>,
}

/// Validated configuration file.
///
/// Constructed via `TryFrom<RawConfigFile>`, which checks globs and
/// durations up front so that the merge with CLI flags only has to deal with
/// values that are known to be well-formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
    preload: PreloadSection,
    run: RunSection,
    interval: Option<Duration>,
    grace_period: Option<Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        interval: Option<Duration>,
        grace_period: Option<Duration>,
    ) -> Self {
        Self {
            watch: raw.watch,
            preload: raw.preload,
            run: raw.run,
            interval,
            grace_period,
        }
    }

    pub fn watch_section(&self) -> &WatchSection {
        &self.watch
    }

    pub fn preload_section(&self) -> &PreloadSection {
        &self.preload
    }

    pub fn run_section(&self) -> &RunSection {
        &self.run
    }

    /// Parsed `[watch].interval`, if set.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Parsed `[run].grace_period`, if set.
    pub fn grace_period(&self) -> Option<Duration> {
        self.grace_period
    }
}
