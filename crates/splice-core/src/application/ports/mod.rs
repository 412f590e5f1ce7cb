//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `splice-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `TemplateRenderer`: Template rendering
//!   - `TreeSnapshotter`: Working-tree hashing
//!   - `SourceNormalizer`: Formatting and import pruning
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{Filesystem, SourceNormalizer, TemplateRenderer, TreeSnapshotter};

#[cfg(test)]
pub use output::{MockFilesystem, MockSourceNormalizer, MockTreeSnapshotter};
