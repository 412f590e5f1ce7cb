//! Local filesystem adapter using std::fs.

use std::io;
use std::path::{Path, PathBuf};

use splice_core::{
    application::ports::Filesystem,
    error::{SpliceError, SpliceResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> SpliceResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> SpliceResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_to_string(&self, path: &Path) -> SpliceResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> SpliceResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path).map_err(|e| map_io_error(path, e, "list directory"))?;
        let mut children = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| map_io_error(path, e, "list directory"))?;
        children.sort();
        Ok(children)
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> SpliceError {
    SpliceError::io(path, operation, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_read_and_list() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let dir = temp.path().join("src/handlers");
        fs.create_dir_all(&dir).unwrap();
        fs.write_file(&dir.join("b.rs"), "fn b() {}\n").unwrap();
        fs.write_file(&dir.join("a.rs"), "fn a() {}\n").unwrap();

        assert_eq!(fs.read_to_string(&dir.join("a.rs")).unwrap(), "fn a() {}\n");
        assert!(fs.is_dir(&dir));
        assert!(!fs.is_dir(&dir.join("a.rs")));
        let names: Vec<_> = fs
            .list_dir(&dir)
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn missing_file_maps_to_io_error_with_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.rs");
        let err = LocalFilesystem::new().read_to_string(&missing).unwrap_err();
        match err {
            SpliceError::Io { path, reason } => {
                assert_eq!(path, missing);
                assert!(reason.contains("read file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
