//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `splice-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::{FileSnapshot, RenderContext};
use crate::error::SpliceResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `splice_adapters::filesystem::LocalFilesystem` (production)
/// - `splice_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> SpliceResult<()>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> SpliceResult<()>;

    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> SpliceResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Direct children of a directory, sorted by path.
    fn list_dir(&self, path: &Path) -> SpliceResult<Vec<PathBuf>>;
}

/// Port for template rendering.
///
/// Implemented by:
/// - `splice_adapters::renderer::MinijinjaRenderer`
pub trait TemplateRenderer: Send + Sync {
    /// Render `body` against `context`, entirely in memory.
    ///
    /// Fails with `SpliceError::Template` when the body references an
    /// undefined variable or is syntactically malformed.
    fn render(&self, body: &str, context: &RenderContext) -> SpliceResult<String>;
}

/// Port for hashing a working tree.
///
/// Implemented by:
/// - `splice_adapters::snapshot::Sha256Snapshotter`
#[cfg_attr(test, mockall::automock)]
pub trait TreeSnapshotter: Send + Sync {
    /// Hash every regular file under `root`, keyed by relative path.
    fn snapshot(&self, root: &Path) -> SpliceResult<FileSnapshot>;
}

/// Port for post-generation normalisation of a Rust source file.
///
/// Implemented by:
/// - `splice_adapters::normalizer::RustfmtNormalizer`
#[cfg_attr(test, mockall::automock)]
pub trait SourceNormalizer: Send + Sync {
    /// Format `path` in place and drop imports it no longer uses.
    fn normalize(&self, path: &Path) -> SpliceResult<()>;
}
