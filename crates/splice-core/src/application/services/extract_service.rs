//! Extract Service - moves methods and structs between files.
//!
//! Each request runs: locate, detach from the source, compute the imports
//! the moved code needs, merge into the destination (creating it when
//! absent), write the source, write the destination. Writes are not
//! transactional: a failure on the second write leaves the first in place.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    application::ports::Filesystem,
    error::{SpliceError, SpliceResult},
    source::{
        ExtractedDeclaration, SourceModule, SourceUnit,
        extract::{self, merge_into, synthesize},
    },
};

/// What an extraction moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Names of moved declarations, in move order.
    pub moved: Vec<String>,
    /// Import paths carried to the destination.
    pub imports: Vec<String>,
    /// The destination file was created by this request.
    pub created: bool,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ExtractReport {
    fn absorb(&mut self, step: ExtractReport) {
        self.moved.extend(step.moved);
        for path in step.imports {
            if !self.imports.contains(&path) {
                self.imports.push(path);
            }
        }
        self.created |= step.created;
    }
}

pub struct ExtractService {
    filesystem: Box<dyn Filesystem>,
}

impl ExtractService {
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Move method `method` of `receiver` from `source` into
    /// `dest_file_name`, resolved relative to the source's directory.
    #[instrument(
        skip_all,
        fields(receiver = %receiver, method = %method, source = %source.display())
    )]
    pub fn extract_method(
        &self,
        receiver: &str,
        method: &str,
        source: &Path,
        dest_file_name: &str,
    ) -> SpliceResult<ExtractReport> {
        let dest = self.destination(source, dest_file_name)?;
        let mut unit = SourceUnit::open(self.fs(), source)?;
        let decl = extract::detach_method(&mut unit, receiver, method)?;
        let report = self.commit(&unit, &decl, &dest)?;
        info!(dest = %dest.display(), created = report.created, "method extracted");
        Ok(report)
    }

    /// Move struct `type_name` and then every method of its inherent impls.
    ///
    /// Each method moves as its own step; a failing step stops the sequence
    /// without undoing the steps before it. When code left in the source still
    /// names the type, the source gains an import of its new location.
    #[instrument(skip_all, fields(type_name = %type_name, source = %source.display()))]
    pub fn extract_struct(
        &self,
        type_name: &str,
        source: &Path,
        dest_file_name: &str,
    ) -> SpliceResult<ExtractReport> {
        let dest = self.destination(source, dest_file_name)?;
        let mut unit = SourceUnit::open(self.fs(), source)?;
        let decl = extract::detach_struct(&mut unit, type_name)?;
        let mut report = self.commit(&unit, &decl, &dest)?;

        let methods = SourceUnit::open(self.fs(), source)?.inherent_methods(type_name);
        debug!(?methods, "moving methods");
        for method in methods {
            let step = self.extract_method(type_name, &method, source, dest_file_name)?;
            report.absorb(step);
        }

        let mut remaining = SourceUnit::open(self.fs(), source)?;
        if let Some(path) = extract::import_moved(&mut remaining, type_name, &dest)? {
            remaining.save(self.fs())?;
            info!(path = %path, "source imports the moved type");
        }

        info!(dest = %dest.display(), moved = report.moved.len(), "struct extracted");
        Ok(report)
    }

    fn fs(&self) -> &dyn Filesystem {
        self.filesystem.as_ref()
    }

    fn destination(&self, source: &Path, dest_file_name: &str) -> SpliceResult<PathBuf> {
        let dest = source
            .parent()
            .map(|dir| dir.join(dest_file_name))
            .unwrap_or_else(|| PathBuf::from(dest_file_name));
        if dest == source {
            return Err(SpliceError::InvalidRequest {
                reason: format!("destination {} is the source file", dest.display()),
            });
        }
        if dest.extension().is_none_or(|ext| ext != "rs") {
            return Err(SpliceError::InvalidRequest {
                reason: format!("destination {} is not a .rs file", dest.display()),
            });
        }
        Ok(dest)
    }

    // Merge `decl` into `dest`, then write source and destination in that order.
    fn commit(
        &self,
        source: &SourceUnit,
        decl: &ExtractedDeclaration,
        dest: &Path,
    ) -> SpliceResult<ExtractReport> {
        let link = SourceModule::between(source.path(), dest);
        let created = !self.fs().exists(dest);
        let target = if created {
            synthesize(dest, decl, &link)?
        } else {
            let mut existing = SourceUnit::open(self.fs(), dest)?;
            merge_into(&mut existing, decl, &link)?;
            existing
        };

        source.save(self.fs())?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs().create_dir_all(parent)?;
        }
        target.save_as(self.fs(), dest)?;
        if created {
            self.register_module(dest)?;
        }

        let carried: BTreeSet<String> = decl.imports.iter().map(|e| e.path.clone()).collect();
        Ok(ExtractReport {
            moved: vec![decl.name.clone()],
            imports: carried.into_iter().collect(),
            created,
            source: source.path().to_path_buf(),
            destination: dest.to_path_buf(),
        })
    }

    // Declare a new file as `mod <stem>;` in its parent module file, if any.
    fn register_module(&self, dest: &Path) -> SpliceResult<()> {
        let Some(stem) = dest.file_stem().and_then(|s| s.to_str()) else {
            return Ok(());
        };
        if matches!(stem, "mod" | "lib" | "main") {
            return Ok(());
        }
        let Some(parent) = parent_module_file(self.fs(), dest) else {
            debug!(dest = %dest.display(), "no parent module file found");
            return Ok(());
        };
        let mut unit = SourceUnit::open(self.fs(), &parent)?;
        if unit.add_module_declaration(stem)? {
            unit.save(self.fs())?;
            info!(parent = %parent.display(), module = stem, "module declared");
        }
        Ok(())
    }
}

fn parent_module_file(fs: &dyn Filesystem, file: &Path) -> Option<PathBuf> {
    let dir = file.parent()?;
    let named_after_dir = dir
        .file_name()
        .map(|name| dir.with_file_name(format!("{}.rs", name.to_string_lossy())));
    ["mod.rs", "lib.rs", "main.rs"]
        .iter()
        .map(|name| dir.join(name))
        .chain(named_after_dir)
        .find(|candidate| candidate != file && fs.exists(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::testing::{memory_fs, read};

    const LIB: &str = "mod handler_user;\n";
    const HANDLER: &str = r#"use serde_json as json;
use std::collections::HashMap;

// Serves user endpoints.
pub struct UserHandler {
    user: String,
    cache: HashMap<String, String>,
}

impl UserHandler {
    pub fn new(user: String) -> Self {
        Self { user, cache: HashMap::new() }
    }

    // Persists the user.
    pub fn save(&self) -> Result<String, json::Error> {
        json::to_string(&self.user)
    }
}
"#;

    const SOURCE: &str = "/p/src/handler_user.rs";

    fn service(files: &[(&str, &str)]) -> (ExtractService, crate::testing::Files) {
        let (fs, store) = memory_fs(files);
        (ExtractService::new(Box::new(fs)), store)
    }

    fn move_save(svc: &ExtractService, dest: &str) -> SpliceResult<ExtractReport> {
        svc.extract_method("UserHandler", "save", Path::new(SOURCE), dest)
    }

    #[test]
    fn extract_method_into_new_file() {
        let (svc, files) = service(&[("/p/src/lib.rs", LIB), ("/p/src/handler_user.rs", HANDLER)]);
        let report = move_save(&svc, "handler_user_save.rs").unwrap();

        assert!(report.created);
        assert_eq!(report.moved, vec!["save"]);
        assert_eq!(report.imports, vec!["serde_json"]);

        let dest = read(&files, "/p/src/handler_user_save.rs").unwrap();
        assert!(dest.contains("use serde_json as json;"));
        assert!(dest.contains("use super::handler_user::UserHandler;"));
        assert!(dest.contains("    // Persists the user.\n    pub fn save(&self)"));

        let src = read(&files, "/p/src/handler_user.rs").unwrap();
        assert!(!src.contains("fn save"));
        assert!(src.contains("fn new"));

        let lib = read(&files, "/p/src/lib.rs").unwrap();
        assert_eq!(lib, "mod handler_user;\nmod handler_user_save;\n");
    }

    #[test]
    fn missing_method_leaves_files_untouched() {
        let (svc, files) = service(&[("/p/src/handler_user.rs", HANDLER)]);
        let err = svc
            .extract_method("UserHandler", "delete", Path::new("/p/src/handler_user.rs"), "x.rs")
            .unwrap_err();
        assert!(matches!(err, SpliceError::NotFound { .. }));
        assert_eq!(read(&files, "/p/src/handler_user.rs").unwrap(), HANDLER);
        assert!(read(&files, "/p/src/x.rs").is_none());
    }

    #[test]
    fn destination_must_differ_from_source() {
        let (svc, _) = service(&[("/p/src/handler_user.rs", HANDLER)]);
        let err = move_save(&svc, "handler_user.rs").unwrap_err();
        assert!(matches!(err, SpliceError::InvalidRequest { .. }));
    }

    #[test]
    fn extract_struct_moves_type_and_methods() {
        let (svc, files) = service(&[("/p/src/lib.rs", LIB), ("/p/src/handler_user.rs", HANDLER)]);
        let report = svc
            .extract_struct("UserHandler", Path::new("/p/src/handler_user.rs"), "user_handler.rs")
            .unwrap();

        assert_eq!(report.moved, vec!["UserHandler", "new", "save"]);
        assert!(report.created);
        assert_eq!(report.imports, vec!["std::collections::HashMap", "serde_json"]);

        let dest = read(&files, "/p/src/user_handler.rs").unwrap();
        let unit = SourceUnit::parse_str("/p/src/user_handler.rs", &dest).unwrap();
        assert!(unit.has_method("UserHandler", "new"));
        assert!(unit.has_method("UserHandler", "save"));
        assert!(unit.has_import("serde_json"));
        assert!(unit.has_import("std::collections::HashMap"));
        assert!(dest.contains("// Serves user endpoints."));

        let src = read(&files, "/p/src/handler_user.rs").unwrap();
        assert!(!src.contains("UserHandler"));
    }

    #[test]
    fn failed_destination_write_keeps_source_write() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(HANDLER.to_string()));
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file()
            .withf(|p, _| p == Path::new("/p/src/handler_user.rs"))
            .times(1)
            .returning(|_, _| Ok(()));
        fs.expect_write_file()
            .withf(|p, _| p == Path::new("/p/src/handler_user_save.rs"))
            .times(1)
            .returning(|p, _| {
                Err(SpliceError::Io {
                    path: p.to_path_buf(),
                    reason: "disk full".into(),
                })
            });

        let svc = ExtractService::new(Box::new(fs));
        let err = move_save(&svc, "handler_user_save.rs").unwrap_err();
        assert!(matches!(err, SpliceError::Io { .. }));
    }

    #[test]
    fn method_joins_one_line_impl() {
        let existing = "use super::handler_user::UserHandler;\n\nimpl UserHandler {}\n";
        let (svc, files) = service(&[(SOURCE, HANDLER), ("/p/src/uh.rs", existing)]);
        let report = move_save(&svc, "uh.rs").unwrap();
        assert!(!report.created);

        let dest = read(&files, "/p/src/uh.rs").unwrap();
        let unit = SourceUnit::parse_str("/p/src/uh.rs", &dest).unwrap();
        assert!(unit.has_method("UserHandler", "save"));
        assert!(dest.contains("impl UserHandler {\n    // Persists the user.\n"));
        let impls = unit.file().items.iter().filter(|i| matches!(i, syn::Item::Impl(_))).count();
        assert_eq!(impls, 1);
    }

    #[test]
    fn moved_struct_is_imported_where_still_used() {
        let source = format!(
            "use std::fmt;\n{HANDLER}\nimpl fmt::Display for UserHandler {{\n    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {{\n        f.write_str(\"user\")\n    }}\n}}\n\npub fn make() -> UserHandler {{\n    UserHandler::new(String::new())\n}}\n"
        );
        let (svc, files) = service(&[("/p/src/lib.rs", LIB), (SOURCE, &source)]);
        svc.extract_struct("UserHandler", Path::new(SOURCE), "user_handler.rs").unwrap();

        let src = read(&files, SOURCE).unwrap();
        let unit = SourceUnit::parse_str(SOURCE, &src).unwrap();
        assert!(unit.has_import("super::user_handler::UserHandler"));
        assert!(!unit.top_level_names().contains(&"UserHandler".to_string()));
        assert!(src.contains("impl fmt::Display for UserHandler"));
    }

    #[test]
    fn method_then_struct_into_same_file_has_no_shadowing_import() {
        let (svc, files) = service(&[("/p/src/lib.rs", LIB), (SOURCE, HANDLER)]);
        move_save(&svc, "uh.rs").unwrap();
        let first = read(&files, "/p/src/uh.rs").unwrap();
        assert!(first.contains("use super::handler_user::UserHandler;"));

        svc.extract_struct("UserHandler", Path::new(SOURCE), "uh.rs").unwrap();
        let dest = read(&files, "/p/src/uh.rs").unwrap();
        let unit = SourceUnit::parse_str("/p/src/uh.rs", &dest).unwrap();
        assert!(!unit.imports().iter().any(|e| e.bound.as_deref() == Some("UserHandler")));
        assert!(unit.top_level_names().contains(&"UserHandler".to_string()));
        assert!(unit.has_method("UserHandler", "new"));
        assert!(unit.has_method("UserHandler", "save"));
    }
}
