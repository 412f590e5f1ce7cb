//! Core domain layer for Splice.
//!
//! Pure logic with no I/O: import aliasing, render contexts, line-buffer
//! splicing and snapshot diffing. Everything that touches the filesystem or
//! a template engine goes through the ports in `crate::application`.

pub mod context;
pub mod imports;
pub mod lines;
pub mod snapshot;

pub use context::{CodeTemplate, IMPORTS_KEY, RenderContext};
pub use imports::{ImportEntry, ImportRegistry, default_alias};
pub use lines::{Anchor, InsertOutcome, PatternMode, Placement};
pub use snapshot::{ChangeKind, FileSnapshot, SnapshotDiff};
