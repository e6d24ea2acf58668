// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::types::{KeyboardMode, StopSignal};

/// Command-line arguments for `rekindle`.
///
/// Every option left unset falls back to the config file (if any) and then
/// to built-in defaults; see [`crate::config::SupervisorConfig::resolve`].
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "rekindle",
    version,
    about = "Run a program and rerun it when files matching a glob change (default **/*.py).",
    long_about = None,
    after_help = "Keys: r/space reload, R full reload, c clear + reload, C clear scrollback + reload, q quit."
)]
pub struct CliArgs {
    /// Clear the screen before each run. Specify twice to also erase the
    /// scrollback buffer.
    #[arg(short = 'c', long = "clear", action = ArgAction::Count)]
    pub clear: u8,

    /// Modules to preload, comma-separated. Example: flask,pandas
    #[arg(short = 'p', long, value_name = "M")]
    pub preload: Option<String>,

    /// Watch files matching these globs, comma-separated. Default: **/*.py
    #[arg(short = 'g', long, value_name = "G")]
    pub glob: Option<String>,

    /// Ignore files matching these globs, comma-separated.
    #[arg(long, value_name = "G")]
    pub exclude: Option<String>,

    /// The argument is a module name, run as `<interpreter> -m <module>`.
    #[arg(short = 'm')]
    pub module: bool,

    /// Do not warn when a preloaded module's files change.
    #[arg(long)]
    pub silent: bool,

    /// Do a full reload automatically when a preloaded module's files change.
    #[arg(long)]
    pub auto_full_reload: bool,

    /// Polling interval, e.g. `300ms` or `1s`.
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Compare file contents (blake3) instead of only mtime/size.
    #[arg(long)]
    pub use_hash: bool,

    /// Interpreter used for scripts and `-m` modules (e.g. `python3`).
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Signal asking the program to stop before it is killed.
    #[arg(long, value_enum, ignore_case = true, value_name = "SIGNAL")]
    pub stop_signal: Option<StopSignal>,

    /// How long to wait after the stop signal before killing, e.g. `2s`.
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Keyboard control.
    #[arg(long, value_enum, value_name = "MODE")]
    pub keyboard: Option<KeyboardMode>,

    /// Path to a config file (TOML). Default: `Rekindle.toml` if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REKINDLE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration and preload resolution, then exit.
    #[arg(long)]
    pub dry_run: bool,

    /// The program to run and its arguments.
    #[arg(
        value_name = "PROGRAM",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true
    )]
    pub argv: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
