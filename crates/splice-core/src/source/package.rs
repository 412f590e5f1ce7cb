//! Package model: every Rust file of a directory, parsed, with resolved
//! import paths.
//!
//! A file's import path comes from the nearest module-root marker above it
//! (a `Cargo.toml` with a `[package] name` by default). When no marker is
//! found the path is derived from the loaded directory's name instead; that
//! degraded mode is recorded on each [`FileRecord`] and logged.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use syn::Item;
use tracing::{debug, instrument, warn};

use crate::application::ports::Filesystem;
use crate::error::{SpliceError, SpliceResult};

pub const DEFAULT_MODULE_MARKER: &str = "Cargo.toml";

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["target"];

/// How module roots are recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRootOptions {
    /// File name of the module-root marker.
    pub marker: String,
}

impl Default for ModuleRootOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MODULE_MARKER.to_string(),
        }
    }
}

/// How a file's import path was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// From a module-root marker and the file's position below it.
    Manifest,
    /// From the loaded directory's name only.
    DirectoryName,
}

/// One parsed file of a package.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub file: syn::File,
    /// Module the file declares: stem, directory for `mod.rs`, crate for a root.
    pub module_name: String,
    /// Path other code imports this module by, e.g. `app::handlers::user`.
    pub import_path: String,
    /// Import path of the module owning the file's directory.
    pub package_path: String,
    pub mode: ResolutionMode,
}

/// Kinds of type declarations reported by pattern search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Struct,
    Enum,
    Trait,
    Type,
    Union,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Trait => "trait",
            Self::Type => "type",
            Self::Union => "union",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type declaration whose name matched a search pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationMatch {
    pub name: String,
    pub kind: TypeKind,
    /// File path relative to the loaded directory, forward slashes.
    pub file_name: String,
    pub package_path: String,
    /// The declaring file lives in the loaded directory's own module.
    pub is_self: bool,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<ManifestPackage>,
}

#[derive(Debug, Deserialize)]
struct ManifestPackage {
    name: String,
}

#[derive(Debug, Clone)]
struct ModuleRoot {
    dir: PathBuf,
    crate_name: String,
}

/// Parsed Rust files of one directory (optionally its subtree).
#[derive(Debug, Clone)]
pub struct PackageUnit {
    dir: PathBuf,
    root_import_path: String,
    files: BTreeMap<PathBuf, FileRecord>,
}

impl PackageUnit {
    /// Load and parse every `.rs` file under `dir`.
    ///
    /// Hidden directories and `target` are skipped when walking recursively.
    /// Fails on the first unreadable or unparsable file.
    #[instrument(skip_all, fields(dir = %dir.display(), recursive = recursive))]
    pub fn load(
        fs: &dyn Filesystem,
        dir: &Path,
        recursive: bool,
        options: &ModuleRootOptions,
    ) -> SpliceResult<Self> {
        if !fs.is_dir(dir) {
            return Err(SpliceError::not_found("directory", dir.display().to_string()));
        }

        let mut resolver = RootResolver::new(fs, options, dir);
        let mut sources = Vec::new();
        collect_sources(fs, dir, recursive, &mut sources)?;

        let mut files = BTreeMap::new();
        for path in sources {
            let text = fs.read_to_string(&path)?;
            let file = syn::parse_file(&text).map_err(|e| SpliceError::parse(&path, &e))?;
            let rel = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
            let record = resolver.record(&path, &rel, file);
            debug!(file = %rel.display(), import_path = %record.import_path, "file resolved");
            files.insert(rel, record);
        }

        let root_import_path = resolver.dir_import_path(dir, Path::new(""));
        debug!(files = files.len(), root = %root_import_path, "package loaded");
        Ok(Self {
            dir: dir.to_path_buf(),
            root_import_path,
            files,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Import path of the loaded directory's own module.
    pub fn root_import_path(&self) -> &str {
        &self.root_import_path
    }

    /// Records keyed by path relative to the loaded directory.
    pub fn files(&self) -> &BTreeMap<PathBuf, FileRecord> {
        &self.files
    }

    pub fn get(&self, rel: impl AsRef<Path>) -> Option<&FileRecord> {
        self.files.get(rel.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Type declarations whose name matches `pattern`, in file then
    /// declaration order.
    pub fn find_declarations_by_pattern(
        &self,
        pattern: &str,
    ) -> SpliceResult<Vec<DeclarationMatch>> {
        let re = Regex::new(pattern).map_err(|e| SpliceError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut found = Vec::new();
        for (rel, record) in &self.files {
            for item in &record.file.items {
                let Some((name, kind)) = type_declaration(item) else {
                    continue;
                };
                if !re.is_match(&name) {
                    continue;
                }
                found.push(DeclarationMatch {
                    name,
                    kind,
                    file_name: slash_path(rel),
                    package_path: record.package_path.clone(),
                    is_self: record.package_path == self.root_import_path,
                });
            }
        }
        Ok(found)
    }
}

fn type_declaration(item: &Item) -> Option<(String, TypeKind)> {
    let (ident, kind) = match item {
        Item::Struct(i) => (&i.ident, TypeKind::Struct),
        Item::Enum(i) => (&i.ident, TypeKind::Enum),
        Item::Trait(i) => (&i.ident, TypeKind::Trait),
        Item::Type(i) => (&i.ident, TypeKind::Type),
        Item::Union(i) => (&i.ident, TypeKind::Union),
        _ => return None,
    };
    Some((ident.to_string(), kind))
}

fn collect_sources(
    fs: &dyn Filesystem,
    dir: &Path,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> SpliceResult<()> {
    let mut subdirs = Vec::new();
    for child in fs.list_dir(dir)? {
        if fs.is_dir(&child) {
            if recursive && !is_skipped_dir(&child) {
                subdirs.push(child);
            }
        } else if child.extension().is_some_and(|ext| ext == "rs") {
            out.push(child);
        }
    }
    for sub in subdirs {
        collect_sources(fs, &sub, recursive, out)?;
    }
    Ok(())
}

fn is_skipped_dir(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with('.') || SKIPPED_DIRS.contains(&name),
        None => false,
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn ident_of(name: &str) -> String {
    name.replace('-', "_")
}

// Module components of a directory below a module root, `src/` dropped.
fn dir_components(rel_dir: &Path, strip_src: bool) -> Vec<String> {
    let mut parts: Vec<String> = rel_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(ident_of),
            _ => None,
        })
        .collect();
    if strip_src && parts.first().is_some_and(|p| p == "src") {
        parts.remove(0);
    }
    parts
}

/// Resolves module roots, caching the answer for every directory visited.
struct RootResolver<'a> {
    fs: &'a dyn Filesystem,
    marker: &'a str,
    loaded_dir: &'a Path,
    cache: HashMap<PathBuf, Option<ModuleRoot>>,
    warned: bool,
}

impl<'a> RootResolver<'a> {
    fn new(fs: &'a dyn Filesystem, options: &'a ModuleRootOptions, loaded_dir: &'a Path) -> Self {
        Self {
            fs,
            marker: &options.marker,
            loaded_dir,
            cache: HashMap::new(),
            warned: false,
        }
    }

    fn root_for(&mut self, dir: &Path) -> Option<ModuleRoot> {
        if let Some(hit) = self.cache.get(dir) {
            return hit.clone();
        }
        let found = dir.ancestors().find_map(|ancestor| self.read_marker(ancestor));
        self.cache.insert(dir.to_path_buf(), found.clone());
        found
    }

    fn read_marker(&self, dir: &Path) -> Option<ModuleRoot> {
        let marker = dir.join(self.marker);
        if !self.fs.exists(&marker) {
            return None;
        }
        let text = self.fs.read_to_string(&marker).ok()?;
        match toml::from_str::<Manifest>(&text) {
            Ok(Manifest { package: Some(pkg) }) => Some(ModuleRoot {
                dir: dir.to_path_buf(),
                crate_name: ident_of(&pkg.name),
            }),
            Ok(_) => None,
            Err(e) => {
                debug!(marker = %marker.display(), error = %e, "module marker unreadable");
                None
            }
        }
    }

    fn record(&mut self, path: &Path, rel: &Path, file: syn::File) -> FileRecord {
        let dir = path.parent().unwrap_or(Path::new(""));
        let rel_dir = rel.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

        let (package_path, mode) = self.resolve_dir(dir, rel_dir);
        let at_root = package_path.split("::").count() == 1;
        let (import_path, module_name) = match stem {
            "mod" => (package_path.clone(), last_segment(&package_path)),
            "lib" | "main" if at_root => (package_path.clone(), package_path.clone()),
            _ => (format!("{package_path}::{}", ident_of(stem)), ident_of(stem)),
        };

        FileRecord {
            file,
            module_name,
            import_path,
            package_path,
            mode,
        }
    }

    fn dir_import_path(&mut self, dir: &Path, rel_dir: &Path) -> String {
        self.resolve_dir(dir, rel_dir).0
    }

    // Import path of the module owning `dir`; `rel_dir` is `dir` relative to
    // the loaded directory.
    fn resolve_dir(&mut self, dir: &Path, rel_dir: &Path) -> (String, ResolutionMode) {
        if let Some(root) = self.root_for(dir) {
            let below = dir.strip_prefix(&root.dir).unwrap_or(Path::new(""));
            let mut parts = vec![root.crate_name];
            parts.extend(dir_components(below, true));
            return (parts.join("::"), ResolutionMode::Manifest);
        }

        if !self.warned {
            warn!(
                dir = %self.loaded_dir.display(),
                marker = self.marker,
                "no module root found; deriving import paths from the directory name"
            );
            self.warned = true;
        }
        let mut parts = vec![ident_of(&directory_name(self.loaded_dir))];
        parts.extend(dir_components(rel_dir, false));
        (parts.join("::"), ResolutionMode::DirectoryName)
    }
}

fn last_segment(path: &str) -> String {
    path.rsplit("::").next().unwrap_or(path).to_string()
}

fn directory_name(dir: &Path) -> String {
    std::path::absolute(dir)
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "crate".to_string())
}
