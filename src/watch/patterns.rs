// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled watch/exclude glob patterns.
///
/// The patterns are relative to the watch root (the working directory). The
/// tracker passes relative, forward-slash paths (e.g. `"src/app.py"`) into
/// [`WatchPatterns::matches`].
#[derive(Clone)]
pub struct WatchPatterns {
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPatterns")
            .field("watch", &self.watch_set.len())
            .field("exclude", &self.exclude_set.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl WatchPatterns {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(watch).context("building watch globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self {
            watch_set,
            exclude_set,
        })
    }

    /// Returns true if the file at `rel_path` should be tracked.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        !self.is_excluded(rel_path)
    }

    /// Returns true if an exclude pattern covers `rel_path`.
    ///
    /// Also used for directories: a directory matching an exclude pattern
    /// (`.venv/**` matches `.venv/x`, so we test `<dir>/` too) is not walked.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        match &self.exclude_set {
            Some(exclude) => exclude.is_match(rel_path),
            None => false,
        }
    }

    pub fn excludes_dir(&self, rel_dir: &str) -> bool {
        self.is_excluded(rel_dir) || self.is_excluded(&format!("{rel_dir}/"))
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
