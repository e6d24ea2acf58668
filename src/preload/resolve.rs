// src/preload/resolve.rs

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::config::PreloadSpec;
use crate::fs::FileSystem;

/// Resolve the backing files of a dotted module name.
///
/// For `pkg.sub`, each search path is tried in order:
/// 1. `<search>/pkg/sub.<ext>` for every configured extension;
/// 2. the package directory `<search>/pkg/sub/`, in which case every file
///    with a module extension below it backs the module.
///
/// The first hit wins. Returned paths are sorted for packages.
pub fn resolve_module(fs: &dyn FileSystem, name: &str, spec: &PreloadSpec) -> Result<Vec<PathBuf>> {
    let rel: PathBuf = name.split('.').collect();

    for search in spec.search_paths.iter() {
        for ext in spec.extensions.iter() {
            let mut file_name = rel.clone().into_os_string();
            file_name.push(format!(".{ext}"));
            let candidate = search.join(PathBuf::from(file_name));
            if fs.is_file(&candidate) {
                return Ok(vec![candidate]);
            }
        }

        let package = search.join(&rel);
        if fs.is_dir(&package) {
            let files = collect_package_files(fs, &package, &spec.extensions)?;
            if !files.is_empty() {
                return Ok(files);
            }
        }
    }

    let searched: Vec<String> = spec
        .search_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    bail!("module '{name}' not found in {}", searched.join(", "))
}

fn collect_package_files(fs: &dyn FileSystem, dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                if !fs.is_symlink(&path) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && has_extension(&path, extensions) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x == e))
}
