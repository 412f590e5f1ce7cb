//! Splice Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Splice
//! source-aware code generator, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           splice-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (Generate, Edit, Extract, Snapshot)     │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, Renderer, Snapshotter, ..) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     splice-adapters (Infrastructure)    │
//! │ (LocalFilesystem, MinijinjaRenderer, ..)│
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Domain + Source Models (Pure Logic)   │
//! │ (ImportRegistry, SourceUnit, PackageUnit)│
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splice_core::{application::ExtractService, source::SourceUnit};
//! use std::path::Path;
//!
//! // With an injected filesystem adapter:
//! let service = ExtractService::new(filesystem);
//! let report = service
//!     .extract_method("UserHandler", "save", Path::new("src/handler_user.rs"), "user_save.rs")
//!     .unwrap();
//! println!("moved {:?}", report.moved);
//! ```

// Domain layer (imports, contexts, line buffers, snapshots)
pub mod domain;

// Rust source models (units, packages, extraction)
pub mod source;

// Application layer (orchestration logic)
pub mod application;

// Error types
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        EditService, ExistingFile, ExtractReport, ExtractService, GenerateOutcome,
        GenerateService, SnapshotService, WrapOutcome,
        ports::{Filesystem, SourceNormalizer, TemplateRenderer, TreeSnapshotter},
    };
    pub use crate::domain::{
        CodeTemplate, FileSnapshot, ImportRegistry, InsertOutcome, PatternMode, Placement,
        RenderContext, SnapshotDiff,
    };
    pub use crate::error::{SpliceError, SpliceResult};
    pub use crate::source::{DeclarationMatch, ModuleRootOptions, PackageUnit, SourceUnit};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
