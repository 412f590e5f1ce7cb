//! Flattened view of `use` items and identifier references.
//!
//! A single `use a::{b, c as d};` yields two [`UseEntry`] values. The
//! reference collector walks a syntax node and records every name that could
//! resolve through an import, which is enough to compute the import subset a
//! moved declaration needs without type information.

use std::collections::BTreeSet;

use proc_macro2::{TokenStream, TokenTree};
use syn::visit::{self, Visit};
use syn::{Item, ItemUse, UseTree};

use crate::domain::default_alias;

/// One leaf of a `use` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseEntry {
    /// Full path, e.g. `std::io::Write` or `crate::prelude::*`.
    pub path: String,
    /// Explicit `as` alias, if any.
    pub alias: Option<String>,
    /// Name the entry brings into scope; `None` for globs and `as _`.
    pub bound: Option<String>,
}

impl UseEntry {
    pub fn is_glob(&self) -> bool {
        self.path.ends_with('*')
    }

    /// Render as a standalone `use` item.
    pub fn use_line(&self) -> String {
        match &self.alias {
            Some(alias) => format!("use {} as {};", self.path, alias),
            None => format!("use {};", self.path),
        }
    }

    /// Alias argument for `SourceUnit::add_named_import`.
    pub fn alias_or_default(&self) -> String {
        self.alias.clone().unwrap_or_else(|| default_alias(&self.path))
    }
}

/// Flatten one `use` item into its leaves.
pub fn flatten_use(item: &ItemUse) -> Vec<UseEntry> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    if item.leading_colon.is_some() {
        prefix.push(String::new());
    }
    walk(&item.tree, &mut prefix, &mut out);
    out
}

/// Every import declared at the top level of `file`.
pub fn file_imports(file: &syn::File) -> Vec<UseEntry> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Use(u) => Some(flatten_use(u)),
            _ => None,
        })
        .flatten()
        .collect()
}

fn walk(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<UseEntry>) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            walk(&p.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(n) => {
            let (path, bound) = leaf(prefix, &n.ident.to_string());
            out.push(UseEntry {
                path,
                alias: None,
                bound: Some(bound),
            });
        }
        UseTree::Rename(r) => {
            let (path, _) = leaf(prefix, &r.ident.to_string());
            let alias = r.rename.to_string();
            out.push(UseEntry {
                path,
                bound: (alias != "_").then(|| alias.clone()),
                alias: Some(alias),
            });
        }
        UseTree::Glob(_) => {
            let mut parts = prefix.clone();
            parts.push("*".into());
            out.push(UseEntry {
                path: parts.join("::"),
                alias: None,
                bound: None,
            });
        }
        UseTree::Group(g) => {
            for tree in &g.items {
                walk(tree, prefix, out);
            }
        }
    }
}

// `self` in a group refers to the prefix itself.
fn leaf(prefix: &[String], ident: &str) -> (String, String) {
    if ident == "self" {
        let bound = prefix.last().cloned().unwrap_or_default();
        (prefix.join("::"), bound)
    } else {
        let mut parts = prefix.to_vec();
        parts.push(ident.to_string());
        (parts.join("::"), ident.to_string())
    }
}

/// Names a syntax node may resolve through imports.
///
/// Records the first segment of every path, every identifier inside macro
/// bodies and attribute arguments (`#[derive(Serialize)]`). `use` items are
/// skipped so an import never counts as a use of itself.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    names: BTreeSet<String>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_names(self) -> BTreeSet<String> {
        self.names
    }

    fn collect_tokens(&mut self, tokens: TokenStream) {
        for tree in tokens {
            match tree {
                TokenTree::Ident(ident) => {
                    self.names.insert(ident.to_string());
                }
                TokenTree::Group(group) => self.collect_tokens(group.stream()),
                TokenTree::Punct(_) | TokenTree::Literal(_) => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for ReferenceCollector {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        if path.leading_colon.is_none() {
            if let Some(first) = path.segments.first() {
                self.names.insert(first.ident.to_string());
            }
        }
        visit::visit_path(self, path);
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        self.collect_tokens(mac.tokens.clone());
        visit::visit_macro(self, mac);
    }

    fn visit_attribute(&mut self, attr: &'ast syn::Attribute) {
        if let syn::Meta::List(list) = &attr.meta {
            self.collect_tokens(list.tokens.clone());
        }
        visit::visit_attribute(self, attr);
    }

    fn visit_item_use(&mut self, _item: &'ast ItemUse) {}
}

/// Collect references from any visitable node.
pub fn references_in<F>(visit_fn: F) -> BTreeSet<String>
where
    F: FnOnce(&mut ReferenceCollector),
{
    let mut collector = ReferenceCollector::new();
    visit_fn(&mut collector);
    collector.into_names()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(src: &str) -> Vec<UseEntry> {
        file_imports(&syn::parse_file(src).unwrap())
    }

    #[test]
    fn flattens_groups_self_and_renames() {
        let got = entries(
            "use std::io::{self, Write};\nuse serde_json as json;\nuse crate::prelude::*;\nuse std::fmt::Write as _;",
        );
        let paths: Vec<_> = got.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["std::io", "std::io::Write", "serde_json", "crate::prelude::*", "std::fmt::Write"]
        );
        assert_eq!(got[0].bound.as_deref(), Some("io"));
        assert_eq!(got[2].alias.as_deref(), Some("json"));
        assert_eq!(got[2].bound.as_deref(), Some("json"));
        assert!(got[3].is_glob());
        assert_eq!(got[3].bound, None);
        assert_eq!(got[4].bound, None);
    }

    #[test]
    fn nested_groups_flatten() {
        let got = entries("use a::{b::{c, d}, e};");
        let paths: Vec<_> = got.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec!["a::b::c", "a::b::d", "a::e"]);
    }

    #[test]
    fn use_line_round_trips_alias() {
        let got = entries("use serde_json as json;\nuse std::fmt;");
        assert_eq!(got[0].use_line(), "use serde_json as json;");
        assert_eq!(got[1].use_line(), "use std::fmt;");
    }

    #[test]
    fn references_cover_paths_macros_and_derives() {
        let file = syn::parse_file(
            r#"
            use std::collections::HashMap;
            #[derive(Serialize, Debug)]
            struct S { m: HashMap<String, Vec<u8>> }
            fn f() { let v = json!({"a": fmt::format(x)}); io::stdout(); }
            "#,
        )
        .unwrap();
        let names = references_in(|c| c.visit_file(&file));
        for expected in ["Serialize", "HashMap", "String", "Vec", "json", "fmt", "io"] {
            assert!(names.contains(expected), "missing {expected}");
        }
        // `use` items themselves are not references
        assert!(!names.contains("collections"));
    }
}
