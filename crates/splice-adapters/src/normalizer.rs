//! Post-generation normalisation: unused-import pruning then `rustfmt`.

use std::path::{Path, PathBuf};
use std::process::Command;

use splice_core::{
    application::ports::SourceNormalizer,
    error::{SpliceError, SpliceResult},
    source::SourceUnit,
};
use tracing::{debug, instrument};

use crate::filesystem::LocalFilesystem;

pub const DEFAULT_EDITION: &str = "2024";

#[derive(Debug, Clone)]
pub struct RustfmtNormalizer {
    rustfmt: PathBuf,
    edition: String,
    run_rustfmt: bool,
}

impl RustfmtNormalizer {
    pub fn new() -> Self {
        Self {
            rustfmt: PathBuf::from("rustfmt"),
            edition: DEFAULT_EDITION.to_string(),
            run_rustfmt: true,
        }
    }

    /// Program invoked for formatting.
    pub fn with_rustfmt(mut self, program: impl Into<PathBuf>) -> Self {
        self.rustfmt = program.into();
        self
    }

    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    /// Prune imports only; skip `rustfmt`.
    pub fn prune_only(mut self) -> Self {
        self.run_rustfmt = false;
        self
    }

    fn prune(&self, path: &Path) -> SpliceResult<()> {
        let fs = LocalFilesystem::new();
        let mut unit = SourceUnit::open(&fs, path)?;
        let removed = unit.prune_unused_imports()?;
        if !removed.is_empty() {
            unit.save(&fs)?;
            debug!(?removed, "unused imports removed");
        }
        Ok(())
    }

    fn format(&self, path: &Path) -> SpliceResult<()> {
        let output = Command::new(&self.rustfmt)
            .arg("--edition")
            .arg(&self.edition)
            .arg(path)
            .output()
            .map_err(|e| SpliceError::io(path, &format!("run {}", self.rustfmt.display()), e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpliceError::Io {
                path: path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.rustfmt.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}

impl Default for RustfmtNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for RustfmtNormalizer {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn normalize(&self, path: &Path) -> SpliceResult<()> {
        self.prune(path)?;
        if self.run_rustfmt {
            self.format(path)?;
        }
        Ok(())
    }
}
