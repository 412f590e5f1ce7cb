//! Application layer for Splice.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (GenerateService, EditService, ExtractService,
//!   SnapshotService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//!
//! Services hold no rules of their own beyond sequencing; import aliasing,
//! line splicing and declaration moves live in `crate::domain` and
//! `crate::source`.

pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    EditService, ExistingFile, ExtractReport, ExtractService, GenerateOutcome, GenerateService,
    SnapshotService, WrapOutcome,
};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, SourceNormalizer, TemplateRenderer, TreeSnapshotter};
