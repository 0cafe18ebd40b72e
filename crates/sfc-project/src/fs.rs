//! File-system access behind a trait so projects can run against the OS
//! or against an in-memory tree in tests.

use std::fs;
use std::io;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;

/// The raw file operations the project layer needs.
pub trait FileSystemShim: Send + Sync {
    fn file_exists(&self, path: &Utf8Path) -> bool;
    fn read_file(&self, path: &Utf8Path) -> io::Result<String>;
    /// Files directly inside `path`, non-recursive.
    fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf>;
    fn file_size(&self, path: &Utf8Path) -> u64;
}

/// The real file system.
#[derive(Debug, Default)]
pub struct OsFileSystem;

impl FileSystemShim for OsFileSystem {
    fn file_exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Utf8Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let Ok(entries) = path.read_dir_utf8() else {
            return Vec::new();
        };
        let mut files: Vec<Utf8PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        files
    }

    fn file_size(&self, path: &Utf8Path) -> u64 {
        fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
    }
}

/// In-memory file tree for tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<FxHashMap<Utf8PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) {
        self.lock().insert(path.into(), text.into());
    }

    pub fn remove(&self, path: &Utf8Path) {
        self.lock().remove(path);
    }

    pub fn rename(&self, from: &Utf8Path, to: impl Into<Utf8PathBuf>) {
        let mut files = self.lock();
        if let Some(text) = files.remove(from) {
            files.insert(to.into(), text);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<Utf8PathBuf, String>> {
        match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl FileSystemShim for MemoryFileSystem {
    fn file_exists(&self, path: &Utf8Path) -> bool {
        self.lock().contains_key(path)
    }

    fn read_file(&self, path: &Utf8Path) -> io::Result<String> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut files: Vec<Utf8PathBuf> = self
            .lock()
            .keys()
            .filter(|candidate| candidate.parent() == Some(path))
            .cloned()
            .collect();
        files.sort();
        files
    }

    fn file_size(&self, path: &Utf8Path) -> u64 {
        self.lock().get(path).map(|text| text.len() as u64).unwrap_or(0)
    }
}
