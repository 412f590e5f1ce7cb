//! Working-tree snapshots: SHA-256 of every regular file under a root.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use splice_core::{
    application::ports::TreeSnapshotter,
    domain::FileSnapshot,
    error::{SpliceError, SpliceResult},
};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Version-control metadata directories, never hashed.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".jj"];

/// Hashes files with SHA-256, keyed by forward-slash relative path.
#[derive(Debug, Clone)]
pub struct Sha256Snapshotter {
    skip: BTreeSet<String>,
}

impl Sha256Snapshotter {
    pub fn new() -> Self {
        Self {
            skip: VCS_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Also skip directories with these names (e.g. `target`).
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(names.into_iter().map(Into::into));
        self
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip.contains(name)
    }
}

impl Default for Sha256Snapshotter {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSnapshotter for Sha256Snapshotter {
    #[instrument(skip_all, fields(root = %root.display()))]
    fn snapshot(&self, root: &Path) -> SpliceResult<FileSnapshot> {
        let mut snapshot = FileSnapshot::new();
        let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir() && self.is_skipped(&entry.file_name().to_string_lossy()))
        });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                SpliceError::io(path, "walk directory", e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let content = fs::read(path).map_err(|e| SpliceError::io(path, "read file", e))?;
            let rel = path.strip_prefix(root).unwrap_or(path);
            snapshot.insert(relative_key(rel), digest(&content));
        }

        debug!(files = snapshot.len(), "snapshot taken");
        Ok(snapshot)
    }
}

fn digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

fn relative_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn hashes_files_and_skips_vcs_and_ignored_dirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/lib.rs", "pub fn a() {}\n");
        write(temp.path(), ".git/HEAD", "ref: refs/heads/main\n");
        write(temp.path(), "target/debug/out", "bin");

        let snap = Sha256Snapshotter::new()
            .with_ignored(["target"])
            .snapshot(temp.path())
            .unwrap();
        let paths: Vec<_> = snap.paths().collect();
        assert_eq!(paths, vec!["src/lib.rs"]);
        assert_eq!(snap.hash_of("src/lib.rs").unwrap().len(), 64);
    }

    #[test]
    fn detects_added_and_changed_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.rs", "fn a() {}\n");
        write(temp.path(), "b.rs", "fn b() {}\n");
        let snapshotter = Sha256Snapshotter::new();
        let before = snapshotter.snapshot(temp.path()).unwrap();

        write(temp.path(), "b.rs", "fn b() { todo!() }\n");
        write(temp.path(), "c.rs", "fn c() {}\n");
        let after = snapshotter.snapshot(temp.path()).unwrap();

        let diff = FileSnapshot::diff(&before, &after);
        assert_eq!(diff.added, vec!["c.rs"]);
        assert_eq!(diff.changed, vec!["b.rs"]);
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn identical_content_hashes_equal() {
        assert_eq!(digest(b"same"), digest(b"same"));
        assert_ne!(digest(b"same"), digest(b"other"));
    }
}
