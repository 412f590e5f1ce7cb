//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use splice_core::{
    application::ports::Filesystem,
    error::{SpliceError, SpliceResult},
};

/// In-memory filesystem for testing.
///
/// Clones share the same tree, so a test can hand one clone to a service
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            let _ = self.create_dir_all(parent);
        }
        let _ = self.write_file(path, content);
        self
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// List all files.
    pub fn list_files(&self) -> Vec<PathBuf> {
        match self.inner.read() {
            Ok(inner) => inner.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn read_lock(&self) -> SpliceResult<std::sync::RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner.read().map_err(|_| lock_error())
    }

    fn write_lock(&self) -> SpliceResult<std::sync::RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner.write().map_err(|_| lock_error())
    }
}

fn lock_error() -> SpliceError {
    SpliceError::Internal {
        message: "memory filesystem lock poisoned".into(),
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> SpliceResult<()> {
        let mut inner = self.write_lock()?;
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> SpliceResult<()> {
        let mut inner = self.write_lock()?;

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(SpliceError::Io {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                });
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> SpliceResult<String> {
        let inner = self.read_lock()?;
        inner.files.get(path).cloned().ok_or_else(|| SpliceError::Io {
            path: path.to_path_buf(),
            reason: "Failed to read file: No such file or directory".into(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.read_lock()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.read_lock()
            .map(|inner| inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> SpliceResult<Vec<PathBuf>> {
        let inner = self.read_lock()?;
        if !inner.directories.contains(path) {
            return Err(SpliceError::Io {
                path: path.to_path_buf(),
                reason: "Failed to list directory: No such file or directory".into(),
            });
        }
        let children: BTreeSet<PathBuf> = inner
            .files
            .keys()
            .chain(inner.directories.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }
}
