//! Source-aware models of Rust code.
//!
//! - [`SourceUnit`]: one file as a `syn` tree plus its line buffer.
//! - [`PackageUnit`]: every file of a directory with resolved import paths.
//! - [`extract`]: moving methods and structs between units.

pub mod extract;
pub mod imports;
pub mod package;
pub mod unit;

pub use extract::{DeclarationKind, ExtractedDeclaration, SourceModule};
pub use imports::{ReferenceCollector, UseEntry, flatten_use, references_in};
pub use package::{
    DeclarationMatch, FileRecord, ModuleRootOptions, PackageUnit, ResolutionMode, TypeKind,
    DEFAULT_MODULE_MARKER,
};
pub use unit::{LineSpan, SourceUnit};
