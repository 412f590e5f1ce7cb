//! Import registry: tracks `use` paths and hands out collision-free aliases.
//!
//! One registry lives for one template render. Registration never fails;
//! garbage paths are accepted and rendered verbatim.

use std::collections::HashMap;

use serde::Serialize;

/// One registered import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub path: String,
    pub alias: String,
}

impl ImportEntry {
    /// `true` when the alias is what the path would bind on its own.
    pub fn is_default_alias(&self) -> bool {
        default_alias(&self.path) == self.alias
    }

    /// Render as a `use` item.
    pub fn use_line(&self) -> String {
        if self.is_default_alias() || self.alias.is_empty() {
            format!("use {};", self.path)
        } else {
            format!("use {} as {};", self.path, self.alias)
        }
    }
}

/// Registry of import paths and their aliases, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ImportRegistry {
    entries: Vec<ImportEntry>,
    by_path: HashMap<String, usize>,
    // base alias -> next numeric suffix to try
    suffixes: HashMap<String, usize>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path`, returning the alias it resolves to.
    ///
    /// Re-registering a path returns its existing alias regardless of
    /// `desired_alias`. When the desired (or derived) alias is already held
    /// by another path, `alias1`, `alias2`, ... are tried in turn.
    pub fn add_import(&mut self, path: &str, desired_alias: Option<&str>) -> String {
        if let Some(&idx) = self.by_path.get(path) {
            return self.entries[idx].alias.clone();
        }

        let base = match desired_alias {
            Some(alias) if !alias.is_empty() => alias.to_string(),
            _ => default_alias(path),
        };

        let alias = if self.alias_taken(&base) {
            let counter = self.suffixes.entry(base.clone()).or_insert(1);
            loop {
                let candidate = format!("{base}{counter}");
                *counter += 1;
                if !self.entries.iter().any(|e| e.alias == candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        tracing::trace!(path, alias = %alias, "import registered");
        self.by_path.insert(path.to_string(), self.entries.len());
        self.entries.push(ImportEntry {
            path: path.to_string(),
            alias: alias.clone(),
        });
        alias
    }

    /// Alias registered for `path`, if any.
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.by_path
            .get(path)
            .map(|&idx| self.entries[idx].alias.as_str())
    }

    /// Registered imports in insertion order.
    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    /// `use` lines in insertion order, ready to splice into a file header.
    pub fn render_use_lines(&self) -> Vec<String> {
        self.entries.iter().map(ImportEntry::use_line).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn alias_taken(&self, alias: &str) -> bool {
        self.entries.iter().any(|e| e.alias == alias)
    }
}

/// Alias a path binds by default: its last segment.
///
/// Segments are split on `::` and `/`; a trailing `self` or `*` is skipped
/// and `-` becomes `_` so crate names yield valid identifiers.
pub fn default_alias(path: &str) -> String {
    path.split("::")
        .flat_map(|part| part.split('/'))
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "self" && *seg != "*")
        .last()
        .unwrap_or(path)
        .replace('-', "_")
}
