//! In-memory `FileSystem` used by headless sessions and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PortError;
use crate::ports::FileSystem;

/// Files held in a map keyed by path.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    read_only: bool,
}

impl MemoryFileSystem {
    /// Empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filesystem whose writes all fail.
    #[must_use]
    pub fn read_only() -> Self {
        Self { read_only: true, ..Self::default() }
    }

    /// Adds a file, builder style.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), contents.into());
        }
        self
    }

    /// Paths currently stored.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().map(|files| files.keys().cloned().collect()).unwrap_or_default()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        Ok(String::from_utf8(self.read_bytes(path)?)?)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, PortError> {
        let files = self.files.lock().map_err(|_| "filesystem lock poisoned")?;
        files.get(path).cloned().ok_or_else(|| format!("{}: no such file", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), PortError> {
        if self.read_only {
            return Err(format!("{}: read-only filesystem", path.display()).into());
        }
        let mut files = self.files.lock().map_err(|_| "filesystem lock poisoned")?;
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().is_ok_and(|files| files.contains_key(path))
    }
}
