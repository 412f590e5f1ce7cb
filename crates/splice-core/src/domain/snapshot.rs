//! Working-tree snapshots and their diff.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Relative path (forward slashes) -> content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSnapshot {
    files: BTreeMap<String, String>,
}

impl FileSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, hash: impl Into<String>) {
        self.files.insert(path.into(), hash.into());
    }

    pub fn hash_of(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Classify every path of `before` and `after`.
    pub fn diff(before: &FileSnapshot, after: &FileSnapshot) -> SnapshotDiff {
        let mut diff = SnapshotDiff::default();
        for (path, hash) in &after.files {
            match before.files.get(path) {
                None => diff.added.push(path.clone()),
                Some(old) if old != hash => diff.changed.push(path.clone()),
                Some(_) => {}
            }
        }
        diff.deleted = before
            .files
            .keys()
            .filter(|path| !after.files.contains_key(*path))
            .cloned()
            .collect();
        diff
    }
}

impl FromIterator<(String, String)> for FileSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Kind of change recorded for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn marker(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
        }
    }
}

/// Paths added, changed and deleted between two snapshots; each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    /// Added and changed paths: the ones worth normalising.
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.added.iter().chain(&self.changed).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (ChangeKind, &str)> {
        let added = self.added.iter().map(|p| (ChangeKind::Added, p.as_str()));
        let changed = self.changed.iter().map(|p| (ChangeKind::Modified, p.as_str()));
        let deleted = self.deleted.iter().map(|p| (ChangeKind::Deleted, p.as_str()));
        added.chain(changed).chain(deleted)
    }

    /// One `A`/`M`/`D` line per path.
    pub fn report_lines(&self) -> Vec<String> {
        self.entries()
            .map(|(kind, path)| format!("{} {}", kind.marker(), path))
            .collect()
    }
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.report_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(entries: &[(&str, &str)]) -> FileSnapshot {
        entries
            .iter()
            .map(|(p, h)| (p.to_string(), h.to_string()))
            .collect()
    }

    #[test]
    fn classifies_added_changed_deleted() {
        let before = snap(&[("src/lib.rs", "a"), ("src/old.rs", "b"), ("Cargo.toml", "c")]);
        let after = snap(&[("src/lib.rs", "a2"), ("src/new.rs", "d"), ("Cargo.toml", "c")]);

        let diff = FileSnapshot::diff(&before, &after);
        assert_eq!(diff.added, vec!["src/new.rs"]);
        assert_eq!(diff.changed, vec!["src/lib.rs"]);
        assert_eq!(diff.deleted, vec!["src/old.rs"]);
    }

    #[test]
    fn changed_paths_exist_in_both_with_different_hashes() {
        let before = snap(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let after = snap(&[("b", "2"), ("c", "4"), ("d", "5")]);
        let diff = FileSnapshot::diff(&before, &after);

        for path in &diff.changed {
            assert_ne!(before.hash_of(path), after.hash_of(path));
            assert!(before.hash_of(path).is_some() && after.hash_of(path).is_some());
        }
        for path in &diff.added {
            assert!(before.hash_of(path).is_none() && after.hash_of(path).is_some());
        }
        for path in &diff.deleted {
            assert!(before.hash_of(path).is_some() && after.hash_of(path).is_none());
        }
    }

    #[test]
    fn identical_snapshots_have_empty_diff() {
        let s = snap(&[("a", "1")]);
        assert!(FileSnapshot::diff(&s, &s).is_empty());
    }

    #[test]
    fn report_lines_use_change_markers() {
        let diff = SnapshotDiff {
            added: vec!["b.rs".into()],
            changed: vec!["a.rs".into()],
            deleted: vec!["c.rs".into()],
        };
        assert_eq!(diff.report_lines(), vec!["A b.rs", "M a.rs", "D c.rs"]);
        assert_eq!(diff.to_string(), "A b.rs\nM a.rs\nD c.rs\n");
        assert_eq!(diff.touched().collect::<Vec<_>>(), vec!["b.rs", "a.rs"]);
    }
}
