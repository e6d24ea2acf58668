// src/config/mod.rs

//! Configuration loading and validation for rekindle.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate it (`validate.rs`).
//! - Merge file values with CLI flags into the [`SupervisorConfig`] the
//!   reload core consumes (`supervisor.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod supervisor;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_optional};
pub use model::{ConfigFile, PreloadSection, RawConfigFile, RunSection, WatchSection};
pub use supervisor::{
    split_list, PreloadSpec, ReloadPolicy, StopSpec, SupervisorConfig, DEFAULT_EXTENSION,
    DEFAULT_GLOB, DEFAULT_GRACE_PERIOD, DEFAULT_INTERPRETER, DEFAULT_INTERVAL,
};
