//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain and source models with the ports to
//! accomplish high-level use cases like "render a template into a file",
//! "add this import" or "move this method into another file".

pub mod edit_service;
pub mod extract_service;
pub mod generate_service;
pub mod snapshot_service;

pub use edit_service::EditService;
pub use extract_service::{ExtractReport, ExtractService};
pub use generate_service::{ExistingFile, GenerateOutcome, GenerateService};
pub use snapshot_service::{SnapshotService, WrapOutcome};
