//! Snapshot Service - wraps a generation step in a before/after diff.
//!
//! The step runs between two snapshots of the working tree. Added and
//! changed `.rs` files are then normalised (best effort) and the tree is
//! snapshotted once more so the reported diff reflects the final contents.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::{
    application::ports::{SourceNormalizer, TreeSnapshotter},
    domain::{FileSnapshot, SnapshotDiff},
    error::SpliceResult,
};

/// Result of a wrapped step.
///
/// `result` carries the step's own outcome so callers can print the diff
/// and still fail the invocation.
#[derive(Debug)]
pub struct WrapOutcome<T> {
    pub diff: SnapshotDiff,
    pub result: SpliceResult<T>,
    /// Normalisation failures, one message per file.
    pub warnings: Vec<String>,
}

pub struct SnapshotService {
    snapshotter: Box<dyn TreeSnapshotter>,
    normalizer: Option<Box<dyn SourceNormalizer>>,
}

impl SnapshotService {
    pub fn new(
        snapshotter: Box<dyn TreeSnapshotter>,
        normalizer: Option<Box<dyn SourceNormalizer>>,
    ) -> Self {
        Self {
            snapshotter,
            normalizer,
        }
    }

    /// Run `step` between snapshots of `root`.
    ///
    /// Only snapshot failures abort; the step's error is returned inside
    /// the outcome.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn wrap<T, F>(&self, root: &Path, step: F) -> SpliceResult<WrapOutcome<T>>
    where
        F: FnOnce() -> SpliceResult<T>,
    {
        let before = self.snapshotter.snapshot(root)?;
        let result = step();
        if let Err(e) = &result {
            warn!(error = %e, "wrapped step failed");
        }

        let mut after = self.snapshotter.snapshot(root)?;
        let mut warnings = Vec::new();
        if let Some(normalizer) = &self.normalizer {
            let touched = FileSnapshot::diff(&before, &after);
            let sources: Vec<&str> = touched.touched().filter(|p| p.ends_with(".rs")).collect();
            for rel in &sources {
                let path = root.join(rel);
                if let Err(e) = normalizer.normalize(&path) {
                    warn!(file = %rel, error = %e, "normalisation failed");
                    warnings.push(format!("{rel}: {e}"));
                }
            }
            if !sources.is_empty() {
                after = self.snapshotter.snapshot(root)?;
            }
        }

        let diff = FileSnapshot::diff(&before, &after);
        info!(
            added = diff.added.len(),
            changed = diff.changed.len(),
            deleted = diff.deleted.len(),
            "tree diffed"
        );
        Ok(WrapOutcome {
            diff,
            result,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockSourceNormalizer, MockTreeSnapshotter};
    use crate::error::SpliceError;
    use mockall::Sequence;

    fn snap(entries: &[(&str, &str)]) -> FileSnapshot {
        entries.iter().map(|(p, h)| (p.to_string(), h.to_string())).collect()
    }

    #[test]
    fn reports_added_and_changed_after_normalising() {
        let mut seq = Sequence::new();
        let mut snapshotter = MockTreeSnapshotter::new();
        snapshotter
            .expect_snapshot()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(snap(&[("a.rs", "1"), ("b.txt", "1")])));
        snapshotter
            .expect_snapshot()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(snap(&[("a.rs", "2"), ("b.txt", "1"), ("c.rs", "1"), ("d.md", "1")]))
            });
        snapshotter
            .expect_snapshot()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(snap(&[("a.rs", "3"), ("b.txt", "1"), ("c.rs", "1"), ("d.md", "1")]))
            });

        let mut normalizer = MockSourceNormalizer::new();
        normalizer
            .expect_normalize()
            .withf(|p| p == Path::new("/w/a.rs"))
            .times(1)
            .returning(|_| Ok(()));
        normalizer
            .expect_normalize()
            .withf(|p| p == Path::new("/w/c.rs"))
            .times(1)
            .returning(|p| {
                Err(SpliceError::Internal {
                    message: format!("rustfmt failed on {}", p.display()),
                })
            });

        let svc = SnapshotService::new(Box::new(snapshotter), Some(Box::new(normalizer)));
        let outcome = svc.wrap(Path::new("/w"), || Ok(())).unwrap();

        assert_eq!(outcome.diff.added, vec!["c.rs", "d.md"]);
        assert_eq!(outcome.diff.changed, vec!["a.rs"]);
        assert!(outcome.diff.deleted.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn failed_step_still_yields_diff() {
        let mut snapshotter = MockTreeSnapshotter::new();
        snapshotter
            .expect_snapshot()
            .times(2)
            .returning(|_| Ok(snap(&[("a.rs", "1")])));

        let svc = SnapshotService::new(Box::new(snapshotter), None);
        let outcome: WrapOutcome<()> = svc
            .wrap(Path::new("/w"), || {
                Err(SpliceError::not_found("method `A::b`", "src/a.rs"))
            })
            .unwrap();
        assert!(outcome.diff.is_empty());
        assert!(matches!(outcome.result, Err(SpliceError::NotFound { .. })));
    }
}
