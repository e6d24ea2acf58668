#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use rekindle::cli::CliArgs;
use rekindle::config::{
    ConfigFile, PreloadSection, PreloadSpec, RawConfigFile, ReloadPolicy, RunSection,
    WatchSection,
};
use rekindle::types::{ClearMode, KeyboardMode, StopSignal};
use rekindle::watch::WatchSpec;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                preload: PreloadSection::default(),
                run: RunSection::default(),
            },
        }
    }

    pub fn with_glob(mut self, pattern: &str) -> Self {
        self.config
            .watch
            .glob
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn with_interval(mut self, interval: &str) -> Self {
        self.config.watch.interval = Some(interval.to_string());
        self
    }

    pub fn with_preload(mut self, module: &str) -> Self {
        self.config.preload.modules.push(module.to_string());
        self
    }

    pub fn with_auto_full_reload(mut self, val: bool) -> Self {
        self.config.preload.auto_full_reload = Some(val);
        self
    }

    pub fn with_clear(mut self, clear: ClearMode) -> Self {
        self.config.run.clear = Some(clear);
        self
    }

    pub fn with_interpreter(mut self, interpreter: &str) -> Self {
        self.config.run.interpreter = Some(interpreter.to_string());
        self
    }

    pub fn with_grace_period(mut self, grace: &str) -> Self {
        self.config.run.grace_period = Some(grace.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CliArgs`, as if parsed from a command line.
pub struct CliArgsBuilder {
    args: CliArgs,
}

impl CliArgsBuilder {
    pub fn new(argv: &[&str]) -> Self {
        Self {
            args: CliArgs {
                argv: argv.iter().map(|s| s.to_string()).collect(),
                ..CliArgs::default()
            },
        }
    }

    pub fn preload(mut self, list: &str) -> Self {
        self.args.preload = Some(list.to_string());
        self
    }

    pub fn glob(mut self, list: &str) -> Self {
        self.args.glob = Some(list.to_string());
        self
    }

    pub fn exclude(mut self, list: &str) -> Self {
        self.args.exclude = Some(list.to_string());
        self
    }

    pub fn clear(mut self, count: u8) -> Self {
        self.args.clear = count;
        self
    }

    pub fn module(mut self) -> Self {
        self.args.module = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.args.silent = true;
        self
    }

    pub fn auto_full_reload(mut self) -> Self {
        self.args.auto_full_reload = true;
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.args.interval = Some(interval.to_string());
        self
    }

    pub fn interpreter(mut self, interpreter: &str) -> Self {
        self.args.interpreter = Some(interpreter.to_string());
        self
    }

    pub fn stop_signal(mut self, signal: StopSignal) -> Self {
        self.args.stop_signal = Some(signal);
        self
    }

    pub fn keyboard(mut self, mode: KeyboardMode) -> Self {
        self.args.keyboard = Some(mode);
        self
    }

    pub fn build(self) -> CliArgs {
        self.args
    }
}

/// Preload spec resolving modules against the mock file system root.
pub fn preload_spec(modules: &[&str]) -> PreloadSpec {
    PreloadSpec {
        modules: modules.iter().map(|m| m.to_string()).collect(),
        ..PreloadSpec::default()
    }
}

/// Reload policy with every flag spelled out.
pub fn policy(silent: bool, auto_full_reload: bool) -> ReloadPolicy {
    ReloadPolicy {
        silent,
        auto_full_reload,
        clear: ClearMode::None,
    }
}

/// Watch spec rooted at `root` with a short interval for tests.
pub fn watch_spec(root: impl Into<PathBuf>, patterns: &[&str], use_hash: bool) -> WatchSpec {
    WatchSpec::new(
        root.into(),
        patterns.iter().map(|p| p.to_string()).collect(),
        Vec::new(),
        Duration::from_millis(20),
        use_hash,
    )
    .expect("valid watch spec")
}
