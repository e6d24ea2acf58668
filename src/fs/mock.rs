// src/fs/mock.rs

use super::{FileMeta, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: SystemTime },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem with a logical clock for modification times.
///
/// Every write advances the clock by one second, so two successive writes to
/// the same path always produce different mtimes, like a real edit would.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    clock: Arc<Mutex<u64>>,
    failing: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            clock: Arc::new(Mutex::new(0)),
            failing: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn tick(&self) -> SystemTime {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(*clock)
    }

    /// Create or overwrite a file, bumping its mtime.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let modified = self.tick();
        self.insert_file(&key(path.as_ref()), content.into(), modified);
    }

    /// Bump the mtime of an existing file without changing its content.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = &key(path.as_ref());
        let modified = self.tick();
        let mut files = self.files.lock().unwrap();
        if let Some(MockEntry::File { modified: m, .. }) = files.get_mut(path) {
            *m = modified;
        }
    }

    /// Overwrite a file while keeping its previous mtime (a write that lands
    /// inside the filesystem's timestamp granularity).
    pub fn rewrite_keeping_mtime(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = &key(path.as_ref());
        let modified = {
            let files = self.files.lock().unwrap();
            match files.get(&key(path)) {
                Some(MockEntry::File { modified, .. }) => *modified,
                _ => SystemTime::UNIX_EPOCH,
            }
        };
        self.insert_file(path, content.into(), modified);
    }

    /// Remove a file and unlink it from its parent directory.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = &key(path.as_ref());
        let mut files = self.files.lock().unwrap();
        files.remove(path);
        let parent = parent_of(path);
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                children.retain(|c| c != name);
            }
        }
    }

    /// Make `read_dir`/`metadata` on `path` fail until cleared.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.failing.lock().unwrap().push(key(path.as_ref()));
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn is_failing(&self, path: &Path) -> bool {
        let path = key(path);
        self.failing.lock().unwrap().iter().any(|p| *p == path)
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, modified: SystemTime) {
        let path = path.to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.insert(path.clone(), MockEntry::File { content, modified });

        // Ensure parent directories exist implicitly for simplicity in this mock
        if path.parent().is_some() {
            let parent = parent_of(&path);
            self.ensure_dir_entry(&mut files, parent);
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if !children.contains(&name.to_string()) {
                        children.push(name.to_string());
                    }
                }
            }
        }
    }

    fn ensure_dir_entry(&self, files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if !files.contains_key(path) {
            files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
            if path.parent().is_some() {
                let parent = parent_of(path);
                if parent != path {
                    // Avoid infinite loop at root
                    self.ensure_dir_entry(files, parent);
                    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                            if !children.contains(&name.to_string()) {
                                children.push(name.to_string());
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Relative paths are stored the way `read_dir(".")` produces them
/// (`./src/app.py`), so `app.py` and `./app.py` name the same entry.
fn key(path: &Path) -> PathBuf {
    if path.is_relative() && !path.starts_with(".") {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.files.lock().unwrap();
        match files.get(&key(path)) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta> {
        if self.is_failing(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let files = self.files.lock().unwrap();
        match files.get(&key(path)) {
            Some(MockEntry::File { content, modified }) => Ok(FileMeta {
                len: content.len() as u64,
                modified: Some(*modified),
            }),
            Some(MockEntry::Dir(_)) => Ok(FileMeta {
                len: 0,
                modified: None,
            }),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(&key(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(&key(path)), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(&key(path)), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if self.is_failing(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let files = self.files.lock().unwrap();
        match files.get(&key(path)) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
