// src/preload/registry.rs

//! Registry of preloaded modules and their dirty flags.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::PreloadSpec;
use crate::fs::FileSystem;
use crate::preload::resolve::resolve_module;
use crate::watch::path_utils::normalize;

/// Load state of a single preload entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Not loaded yet, or evicted by a full reload.
    Unloaded,
    /// Backing files resolved.
    Loaded,
    /// Resolution failed; the module is unavailable until the next full
    /// reload retries it.
    Failed(String),
}

/// One module designated for preloading.
#[derive(Debug, Clone)]
pub struct PreloadEntry {
    name: String,
    backing: Vec<PathBuf>,
    dirty: bool,
    /// Backing files changed since the last full reload.
    changed: BTreeSet<PathBuf>,
    state: LoadState,
}

impl PreloadEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            backing: Vec::new(),
            dirty: false,
            changed: BTreeSet::new(),
            state: LoadState::Unloaded,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved backing files; empty while unresolved.
    pub fn backing(&self) -> &[PathBuf] {
        &self.backing
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn changed_paths(&self) -> &BTreeSet<PathBuf> {
        &self.changed
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }
}

/// A module that could not be preloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadFailure {
    pub module: String,
    pub reason: String,
}

/// Ordered registry of preload entries.
///
/// Owned by the control loop. The poller only ever sees an immutable
/// [`PreloadIndex`] snapshot published after each (re)load.
#[derive(Debug, Clone, Default)]
pub struct PreloadRegistry {
    entries: Vec<PreloadEntry>,
}

impl PreloadRegistry {
    /// Create an (unloaded) registry. Duplicate names keep their first
    /// position.
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<PreloadEntry> = Vec::new();
        for name in modules {
            let name = name.into();
            if entries.iter().all(|e| e.name != name) {
                entries.push(PreloadEntry::new(name));
            }
        }
        Self { entries }
    }

    /// Parse a comma-separated list such as `"flask, pandas"`.
    pub fn from_list(list: &str) -> Self {
        Self::new(crate::config::split_list(list))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PreloadEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&PreloadEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Load every entry that is not loaded yet, in listed order.
    ///
    /// Failures are recorded on the entry and returned; they never abort the
    /// remaining entries.
    pub fn load_all(&mut self, fs: &dyn FileSystem, spec: &PreloadSpec) -> Vec<PreloadFailure> {
        let mut failures = Vec::new();

        for entry in self.entries.iter_mut() {
            if entry.state == LoadState::Loaded {
                continue;
            }
            match resolve_module(fs, &entry.name, spec) {
                Ok(backing) => {
                    info!(module = %entry.name, files = backing.len(), "preloaded module");
                    entry.backing = backing;
                    entry.state = LoadState::Loaded;
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    debug!(module = %entry.name, %reason, "preload failed");
                    entry.backing.clear();
                    entry.state = LoadState::Failed(reason.clone());
                    failures.push(PreloadFailure {
                        module: entry.name.clone(),
                        reason,
                    });
                }
            }
        }

        failures
    }

    /// Drop every loaded module (first half of a full reload).
    pub fn evict_all(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.state = LoadState::Unloaded;
            entry.backing.clear();
            entry.dirty = false;
            entry.changed.clear();
        }
        debug!(modules = self.entries.len(), "evicted preload registry");
    }

    /// Flag every loaded entry whose backing files intersect `changed`.
    ///
    /// Paths are compared in [`normalize`]d form. Returns the names that were
    /// *newly* flagged. Unresolved entries are never dirty.
    pub fn mark_dirty(&mut self, changed: &BTreeSet<PathBuf>) -> BTreeSet<String> {
        let changed: BTreeSet<PathBuf> = changed.iter().map(|p| normalize(p)).collect();
        let mut newly = BTreeSet::new();
        for entry in self.entries.iter_mut().filter(|e| e.is_loaded()) {
            let hits: Vec<PathBuf> = entry
                .backing
                .iter()
                .filter(|p| changed.contains(&normalize(p)))
                .cloned()
                .collect();
            if hits.is_empty() {
                continue;
            }
            entry.changed.extend(hits);
            if !entry.dirty {
                entry.dirty = true;
                newly.insert(entry.name.clone());
            }
        }
        newly
    }

    /// True when every resolved entry is dirty (and there is at least one).
    pub fn all_dirty(&self) -> bool {
        let mut loaded = self.entries.iter().filter(|e| e.is_loaded()).peekable();
        loaded.peek().is_some() && loaded.all(|e| e.dirty)
    }

    /// Names of dirty entries.
    pub fn any_dirty(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| e.dirty)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Reset all dirty flags (done on full reload).
    pub fn clear_all(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.dirty = false;
            entry.changed.clear();
        }
    }

    /// Changed backing files of all dirty entries.
    pub fn dirty_paths(&self) -> BTreeSet<PathBuf> {
        self.entries
            .iter()
            .flat_map(|e| e.changed.iter().cloned())
            .collect()
    }

    /// Names of loaded modules, in preload order.
    pub fn loaded_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_loaded())
            .map(|e| e.name.clone())
            .collect()
    }

    /// Immutable path -> module lookup handed to the poller.
    pub fn index(&self) -> PreloadIndex {
        let mut by_path: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.is_loaded()) {
            for path in entry.backing.iter() {
                by_path
                    .entry(normalize(path))
                    .or_default()
                    .insert(entry.name.clone());
            }
        }
        PreloadIndex { by_path }
    }
}

/// Which paths back which preloaded modules, keyed by [`normalize`]d path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadIndex {
    by_path: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl PreloadIndex {
    /// All backing paths; the tracker fingerprints these even when they do
    /// not match the watch globs.
    pub fn paths(&self) -> BTreeSet<PathBuf> {
        self.by_path.keys().cloned().collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(&normalize(path))
    }

    /// Split a change set into ordinary paths and preload paths, together
    /// with the modules the preload paths belong to.
    pub fn split(&self, changed: BTreeSet<PathBuf>) -> ChangeSplit {
        let mut split = ChangeSplit::default();
        for path in changed {
            match self.by_path.get(&normalize(&path)) {
                Some(modules) => {
                    split.modules.extend(modules.iter().cloned());
                    split.preload_paths.insert(path);
                }
                None => {
                    split.ordinary.insert(path);
                }
            }
        }
        split
    }
}

/// Result of [`PreloadIndex::split`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSplit {
    pub ordinary: BTreeSet<PathBuf>,
    pub preload_paths: BTreeSet<PathBuf>,
    pub modules: BTreeSet<String>,
}
