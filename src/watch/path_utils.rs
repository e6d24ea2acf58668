// src/watch/path_utils.rs

//! Utility functions for path handling in the tracker.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`; this is the normal case
///   because the tracker builds every path by joining onto `root`.
/// - Otherwise (preload files found through another search path, symlinked
///   roots) both sides are canonicalized and we try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

/// Lexical comparison key: `./vendor/x.py` and `vendor/x.py` name the same
/// file. The file system is not consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let normal: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normal.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normal
    }
}

/// Human-friendly rendering for status lines: `./src/app.py` -> `src/app.py`.
pub fn display_path(path: &Path) -> String {
    let rel = path.strip_prefix(".").unwrap_or(path);
    to_slash(rel)
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
