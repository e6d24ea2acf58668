// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `glob` / `exclude` patterns.
//! - Polling the working directory and fingerprinting matching files
//!   ([`snapshot`]); there is no file-system event subscription.
//! - (Optionally) content hashing so that a touch without a content change
//!   is not treated as a modification.
//!
//! It does **not** know about preloading or reload policy; it only turns the
//! file system into sets of changed paths.

pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod snapshot;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::errors::RekindleError;

pub use hash::compute_file_hash;
pub use patterns::{build_globset, WatchPatterns};
pub use snapshot::{diff, scan, FileFingerprint, Snapshot, SnapshotTracker};

/// What to watch and how often. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    /// Directory the patterns are relative to.
    pub root: PathBuf,
    pub patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub interval: Duration,
    pub use_hash: bool,
}

impl WatchSpec {
    /// Build a spec, rejecting invalid globs up front.
    pub fn new(
        root: PathBuf,
        patterns: Vec<String>,
        exclude: Vec<String>,
        interval: Duration,
        use_hash: bool,
    ) -> crate::errors::Result<Self> {
        let spec = Self {
            root,
            patterns,
            exclude,
            interval,
            use_hash,
        };
        spec.compile()
            .map_err(|e| RekindleError::ConfigError(format!("{e:#}")))?;
        Ok(spec)
    }

    pub fn compile(&self) -> Result<WatchPatterns> {
        WatchPatterns::new(&self.patterns, &self.exclude)
    }
}
