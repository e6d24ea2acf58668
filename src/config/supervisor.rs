// src/config/supervisor.rs

//! The effective supervisor configuration.
//!
//! [`SupervisorConfig`] is what the rest of the crate consumes. It is built
//! from the parsed CLI arguments layered over an optional config file, with
//! built-in defaults for anything neither of them sets.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{parse_config_duration, validate_interval, validate_module_name};
use crate::errors::{RekindleError, Result};
use crate::exec::TargetSpec;
use crate::types::{ClearMode, KeyboardMode, StopSignal};
use crate::watch::WatchSpec;

pub const DEFAULT_GLOB: &str = "**/*.py";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_EXTENSION: &str = "py";

/// Where and how preload modules are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSpec {
    /// Module names in preload order.
    pub modules: Vec<String>,
    pub search_paths: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

impl Default for PreloadSpec {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            search_paths: vec![PathBuf::from(".")],
            extensions: vec![DEFAULT_EXTENSION.to_string()],
        }
    }
}

/// Reload policy knobs consulted by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadPolicy {
    /// Do not warn about stale preloaded modules.
    pub silent: bool,
    /// Turn preload changes into full reloads.
    pub auto_full_reload: bool,
    /// Clear applied before every child start.
    pub clear: ClearMode,
}

/// How a running child is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopSpec {
    pub signal: StopSignal,
    pub grace_period: Duration,
}

impl Default for StopSpec {
    fn default() -> Self {
        Self {
            signal: StopSignal::default(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Fully resolved configuration for one supervisor session.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub target: TargetSpec,
    pub watch: WatchSpec,
    pub preload: PreloadSpec,
    pub policy: ReloadPolicy,
    pub stop: StopSpec,
    pub keyboard: KeyboardMode,
}

impl SupervisorConfig {
    /// Layer CLI arguments over the (optional) config file.
    pub fn resolve(args: &CliArgs, file: Option<&ConfigFile>) -> Result<Self> {
        let watch_section = file.map(|f| f.watch_section());
        let preload_section = file.map(|f| f.preload_section());
        let run_section = file.map(|f| f.run_section());

        // Watch spec.
        let patterns = match args.glob.as_deref() {
            Some(s) => non_empty_list("--glob", s)?,
            None => watch_section
                .and_then(|w| w.glob.clone())
                .unwrap_or_else(|| vec![DEFAULT_GLOB.to_string()]),
        };
        let mut exclude = watch_section.map(|w| w.exclude.clone()).unwrap_or_default();
        if let Some(s) = args.exclude.as_deref() {
            exclude.extend(split_list(s));
        }
        let interval = match validate_interval(args.interval.as_deref())? {
            Some(d) => d,
            None => file.and_then(|f| f.interval()).unwrap_or(DEFAULT_INTERVAL),
        };
        let use_hash = args.use_hash || watch_section.and_then(|w| w.use_hash).unwrap_or(false);
        let watch = WatchSpec::new(PathBuf::from("."), patterns, exclude, interval, use_hash)?;

        // Preload spec.
        let modules = match args.preload.as_deref() {
            Some(s) => split_list(s),
            None => preload_section.map(|p| p.modules.clone()).unwrap_or_default(),
        };
        for name in modules.iter() {
            validate_module_name(name)?;
        }
        let defaults = PreloadSpec::default();
        let preload = PreloadSpec {
            modules,
            search_paths: preload_section
                .and_then(|p| p.search_paths.clone())
                .map(|paths| paths.into_iter().map(PathBuf::from).collect())
                .unwrap_or(defaults.search_paths),
            extensions: preload_section
                .and_then(|p| p.extensions.clone())
                .map(|exts| {
                    exts.into_iter()
                        .map(|e| e.trim().trim_start_matches('.').to_string())
                        .collect()
                })
                .unwrap_or(defaults.extensions),
        };

        // Policy.
        let clear = if args.clear > 0 {
            ClearMode::from_count(args.clear)
        } else {
            run_section.and_then(|r| r.clear).unwrap_or_default()
        };
        let policy = ReloadPolicy {
            silent: args.silent || preload_section.and_then(|p| p.silent).unwrap_or(false),
            auto_full_reload: args.auto_full_reload
                || preload_section.and_then(|p| p.auto_full_reload).unwrap_or(false),
            clear,
        };

        // Stopping.
        let signal = args
            .stop_signal
            .or_else(|| run_section.and_then(|r| r.stop_signal))
            .unwrap_or_default();
        let grace_period = match args.grace_period.as_deref() {
            Some(s) => parse_config_duration("--grace-period", s)?,
            None => file
                .and_then(|f| f.grace_period())
                .unwrap_or(DEFAULT_GRACE_PERIOD),
        };

        let keyboard = args
            .keyboard
            .or_else(|| run_section.and_then(|r| r.keyboard))
            .unwrap_or_default();

        // Target.
        let interpreter = args
            .interpreter
            .clone()
            .or_else(|| run_section.and_then(|r| r.interpreter.clone()));
        let target = TargetSpec::new(args.argv.clone(), args.module, interpreter)?;

        Ok(Self {
            target,
            watch,
            preload,
            policy,
            stop: StopSpec {
                signal,
                grace_period,
            },
            keyboard,
        })
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_list(flag: &str, s: &str) -> Result<Vec<String>> {
    let items = split_list(s);
    if items.is_empty() {
        return Err(RekindleError::ConfigError(format!(
            "{flag} needs at least one pattern"
        )));
    }
    Ok(items)
}
