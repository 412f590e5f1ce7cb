//! Infrastructure adapters for Splice.
//!
//! This crate implements the ports defined in `splice-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod normalizer;
pub mod renderer;
pub mod snapshot;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use normalizer::RustfmtNormalizer;
pub use renderer::MinijinjaRenderer;
pub use snapshot::Sha256Snapshotter;
