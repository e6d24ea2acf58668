// src/watch/snapshot.rs

//! Polling file snapshot tracker.
//!
//! Each poll walks the watch root, fingerprints every file matching the
//! watch patterns (plus explicitly tracked extra paths such as preload
//! backing files) and diffs the result against the previous snapshot.
//!
//! A poll either completes and replaces the stored snapshot, or fails and
//! leaves it untouched; the stored snapshot therefore always describes the
//! last *completed* scan. Unreadable subdirectories and files do not fail a
//! poll: their previous entries are kept until they can be read again.
//!
//! Known limitation: a file that is deleted and recreated with an identical
//! fingerprint between two polls is reported as unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, trace, warn};

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;
use crate::watch::path_utils::{normalize, relative_str};
use crate::watch::patterns::WatchPatterns;
use crate::watch::WatchSpec;

/// Cheap per-file signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
    /// blake3 digest, only populated when content hashing is enabled.
    pub digest: Option<String>,
}

impl FileFingerprint {
    /// Whether two fingerprints describe the same file state.
    ///
    /// With digests on both sides the mtime is ignored, so a touch that does
    /// not change content is not a change.
    pub fn same_as(&self, other: &FileFingerprint) -> bool {
        match (&self.digest, &other.digest) {
            (Some(a), Some(b)) => self.len == other.len && a == b,
            _ => self.len == other.len && self.modified == other.modified,
        }
    }

    /// Whether the cheap part (mtime + size) is unchanged, meaning a
    /// previously computed digest can be reused.
    fn same_metadata(&self, other: &FileFingerprint) -> bool {
        self.len == other.len && self.modified == other.modified
    }
}

/// Path -> fingerprint map for one completed scan.
pub type Snapshot = BTreeMap<PathBuf, FileFingerprint>;

/// Scan the file system according to `spec`.
///
/// `extra` paths are fingerprinted whether or not they match the patterns;
/// missing extras are simply absent from the result. An extra that the walk
/// already found under another spelling (`vendor/x.py` vs `./vendor/x.py`)
/// is recorded once, under the walk's key.
///
/// `previous` serves two purposes: digests of files whose metadata did not
/// change are reused, and entries below a directory or file that cannot be
/// read this time are carried over unchanged. Only an unreadable root fails
/// the scan.
pub fn scan(
    fs: &dyn FileSystem,
    spec: &WatchSpec,
    patterns: &WatchPatterns,
    extra: &BTreeSet<PathBuf>,
    previous: Option<&Snapshot>,
) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    let root = spec.root.as_path();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if dir.as_path() == root => {
                return Err(err).with_context(|| format!("scanning {:?}", root));
            }
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %format!("{err:#}"),
                    "skipping unreadable directory"
                );
                carry_over(&mut snapshot, previous, |path| path.starts_with(&dir));
                continue;
            }
        };

        for path in entries {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) || patterns.excludes_dir(&rel) {
                    trace!(dir = %rel, "not descending");
                    continue;
                }
                stack.push(path);
            } else if fs.is_file(&path) && patterns.matches(&rel) {
                record(fs, &mut snapshot, path, spec.use_hash, previous);
            }
        }
    }

    let walked: BTreeSet<PathBuf> = snapshot.keys().map(|p| normalize(p)).collect();
    for path in extra {
        if walked.contains(&normalize(path)) || !fs.is_file(path) {
            continue;
        }
        record(fs, &mut snapshot, path.clone(), spec.use_hash, previous);
    }

    Ok(snapshot)
}

/// Fingerprint `path` into `snapshot`. A file that cannot be read keeps its
/// previous fingerprint, or stays out of the snapshot if it had none.
fn record(
    fs: &dyn FileSystem,
    snapshot: &mut Snapshot,
    path: PathBuf,
    use_hash: bool,
    previous: Option<&Snapshot>,
) {
    match fingerprint(fs, &path, use_hash, previous) {
        Ok(fp) => {
            snapshot.insert(path, fp);
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "skipping unreadable file");
            if let Some(old) = previous.and_then(|snap| snap.get(&path)) {
                snapshot.insert(path, old.clone());
            }
        }
    }
}

fn carry_over(
    snapshot: &mut Snapshot,
    previous: Option<&Snapshot>,
    keep: impl Fn(&Path) -> bool,
) {
    let Some(previous) = previous else {
        return;
    };
    for (path, fp) in previous.iter().filter(|(path, _)| keep(path)) {
        snapshot.insert(path.clone(), fp.clone());
    }
}

fn fingerprint(
    fs: &dyn FileSystem,
    path: &Path,
    use_hash: bool,
    previous: Option<&Snapshot>,
) -> Result<FileFingerprint> {
    let meta = fs
        .metadata(path)
        .with_context(|| format!("fingerprinting {:?}", path))?;
    let mut fp = FileFingerprint {
        modified: meta.modified,
        len: meta.len,
        digest: None,
    };

    if use_hash {
        let cached = previous
            .and_then(|snap| snap.get(path))
            .filter(|old| old.same_metadata(&fp))
            .and_then(|old| old.digest.clone());
        fp.digest = match cached {
            Some(digest) => Some(digest),
            None => Some(compute_file_hash(fs, path)?),
        };
    }

    Ok(fp)
}

/// Paths added, removed or modified between `old` and `new`.
///
/// Unchanged paths are never included.
pub fn diff(old: &Snapshot, new: &Snapshot) -> BTreeSet<PathBuf> {
    let mut changed = BTreeSet::new();

    for (path, fp) in new.iter() {
        match old.get(path) {
            Some(old_fp) if old_fp.same_as(fp) => {}
            _ => {
                changed.insert(path.clone());
            }
        }
    }

    for path in old.keys() {
        if !new.contains_key(path) {
            changed.insert(path.clone());
        }
    }

    changed
}

/// Owns the last completed snapshot and turns scans into change sets.
#[derive(Debug)]
pub struct SnapshotTracker {
    fs: Arc<dyn FileSystem>,
    spec: WatchSpec,
    patterns: WatchPatterns,
    current: Snapshot,
    /// Extra paths tracked by the last completed scan.
    extra: BTreeSet<PathBuf>,
    /// False until a first scan succeeded; that scan only sets the baseline.
    primed: bool,
}

impl SnapshotTracker {
    pub fn new(fs: Arc<dyn FileSystem>, spec: WatchSpec) -> Result<Self> {
        let patterns = spec.compile()?;
        Ok(Self {
            fs,
            spec,
            patterns,
            current: Snapshot::new(),
            extra: BTreeSet::new(),
            primed: false,
        })
    }

    pub fn spec(&self) -> &WatchSpec {
        &self.spec
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Take the baseline snapshot. A failure here is not fatal: the next
    /// successful [`poll`](Self::poll) becomes the baseline instead.
    pub fn prime(&mut self, extra: &BTreeSet<PathBuf>) {
        if let Err(err) = self.poll(extra) {
            warn!(error = %format!("{err:#}"), "initial file scan failed; will retry");
        }
    }

    /// Scan once and return the paths that changed since the last completed
    /// scan.
    ///
    /// On error the previous snapshot is kept and the error is returned; the
    /// caller logs it and retries on the next tick.
    pub fn poll(&mut self, extra: &BTreeSet<PathBuf>) -> Result<BTreeSet<PathBuf>> {
        let next = scan(
            self.fs.as_ref(),
            &self.spec,
            &self.patterns,
            extra,
            Some(&self.current),
        )?;

        if !self.primed {
            debug!(files = next.len(), "baseline snapshot taken");
            self.current = next;
            self.extra = extra.clone();
            self.primed = true;
            return Ok(BTreeSet::new());
        }

        let mut changed = diff(&self.current, &next);

        // Paths that only (dis)appear because the set of extra paths changed
        // were not modified on disk.
        if *extra != self.extra {
            changed.retain(|path| {
                let newly_tracked =
                    extra.contains(path) && !self.extra.contains(path) && !self.current.contains_key(path);
                let untracked =
                    self.extra.contains(path) && !extra.contains(path) && !next.contains_key(path);
                !(newly_tracked || untracked)
            });
        }

        if !changed.is_empty() {
            debug!(count = changed.len(), "detected file changes");
        }

        self.current = next;
        self.extra = extra.clone();
        Ok(changed)
    }
}
