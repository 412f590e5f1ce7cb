//! `Filesystem` port implementations: the real disk, and an in-memory tree
//! for tests.

mod local;
mod memory;

pub use local::LocalFilesystem;
pub use memory::MemoryFilesystem;
