//! Edit Service - in-place edits of an existing source file.
//!
//! Each edit opens the file as a [`SourceUnit`], applies one change and
//! writes the file back only when the buffer changed.

use std::path::Path;

use tracing::{debug, instrument};

use crate::{
    application::ports::Filesystem,
    domain::{InsertOutcome, PatternMode, Placement},
    error::SpliceResult,
    source::SourceUnit,
};

pub struct EditService {
    filesystem: Box<dyn Filesystem>,
}

impl EditService {
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Insert `lines` next to the first match of `pattern` in `file`.
    #[instrument(skip_all, fields(file = %file.display(), pattern = %pattern))]
    pub fn insert(
        &self,
        file: &Path,
        pattern: &str,
        lines: &str,
        placement: Placement,
        mode: PatternMode,
    ) -> SpliceResult<InsertOutcome> {
        let mut unit = SourceUnit::open(self.filesystem.as_ref(), file)?;
        let outcome = unit.insert_relative_to_pattern(pattern, lines, placement, mode)?;
        if outcome.changed() {
            unit.save(self.filesystem.as_ref())?;
        }
        Ok(outcome)
    }

    /// Import `path` (as `alias`) into `file`. Returns whether the file changed.
    #[instrument(skip_all, fields(file = %file.display(), path = %path))]
    pub fn add_import(&self, file: &Path, path: &str, alias: Option<&str>) -> SpliceResult<bool> {
        let mut unit = SourceUnit::open(self.filesystem.as_ref(), file)?;
        let changed = unit.add_named_import(alias.unwrap_or_default(), path)?;
        if changed {
            unit.save(self.filesystem.as_ref())?;
        } else {
            debug!("already imported");
        }
        Ok(changed)
    }
}
