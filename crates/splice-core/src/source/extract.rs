//! Detaching declarations from one unit and merging them into another.
//!
//! Pure operations over [`SourceUnit`]s; reading and writing files is left to
//! `ExtractService`. Declarations move as verbatim source text so comments
//! inside bodies survive, and their attached `//` comment block and doc
//! comments travel with them.

use std::collections::BTreeSet;
use std::path::Path;

use proc_macro2::LineColumn;
use quote::ToTokens;
use syn::visit::Visit;
use syn::{Attribute, ImplItem, Item, ItemImpl};
use tracing::debug;

use super::imports::{UseEntry, references_in};
use super::unit::{
    LineSpan, SourceUnit, is_inherent_impl_of, item_name, normalize_receiver, token_bounds,
};
use crate::error::{SpliceError, SpliceResult};

/// What was detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A method of an inherent impl; `header` is the impl header text
    /// (`#[cfg(..)] impl<T> Foo<T> where ...`) up to, not including, the brace.
    Method { receiver: String, header: String },
    Struct,
}

/// A declaration cut out of its source unit, ready to merge elsewhere.
#[derive(Debug, Clone)]
pub struct ExtractedDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Verbatim lines, leading comments included.
    pub text: Vec<String>,
    /// Source imports the declaration refers to.
    pub imports: Vec<UseEntry>,
    /// Top-level items of the source the declaration refers to.
    pub sibling_refs: BTreeSet<String>,
}

/// How the destination module reaches items left in the source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceModule {
    /// Source is the destination's parent module (`mod.rs`, `lib.rs`, `main.rs`).
    Parent,
    /// Source is a sibling module with this name.
    Sibling(String),
    /// No expressible relation; sibling references are left to the user.
    Unrelated,
}

impl SourceModule {
    /// Relation of `source` to a destination file in `dest_dir`.
    pub fn between(source: &Path, dest: &Path) -> Self {
        if source.parent() != dest.parent() {
            return Self::Unrelated;
        }
        match source.file_stem().and_then(|s| s.to_str()) {
            Some("mod" | "lib" | "main") => Self::Parent,
            Some(stem) => Self::Sibling(stem.to_string()),
            None => Self::Unrelated,
        }
    }

    fn use_path(&self, name: &str) -> Option<String> {
        match self {
            Self::Parent => Some(format!("super::{name}")),
            Self::Sibling(module) => Some(format!("super::{module}::{name}")),
            Self::Unrelated => None,
        }
    }

    // Path from the source module to `name` inside destination module `dest`.
    fn path_back(&self, dest: &str, name: &str) -> Option<String> {
        match self {
            Self::Parent => Some(format!("self::{dest}::{name}")),
            Self::Sibling(_) => Some(format!("super::{dest}::{name}")),
            Self::Unrelated => None,
        }
    }
}

/// Cut method `method` out of the inherent impl of `receiver`.
///
/// An impl left empty is removed along with it.
pub fn detach_method(
    unit: &mut SourceUnit,
    receiver: &str,
    method: &str,
) -> SpliceResult<ExtractedDeclaration> {
    unit.resync()?;
    let receiver = normalize_receiver(receiver).to_string();

    let located = unit.file().items.iter().find_map(|item| match item {
        Item::Impl(imp) if is_inherent_impl_of(imp, &receiver) => imp
            .items
            .iter()
            .find_map(|ii| match ii {
                ImplItem::Fn(f) if f.sig.ident == method => Some(f),
                _ => None,
            })
            .map(|f| (imp, f)),
        _ => None,
    });
    let Some((imp, func)) = located else {
        return Err(SpliceError::not_found(
            format!("method `{receiver}::{method}`"),
            unit.path().display().to_string(),
        ));
    };

    let (fn_start, fn_end) = token_bounds(func).ok_or_else(|| internal("method has no tokens"))?;
    let text = if unit.stands_alone(fn_start, fn_end) {
        unit.span_text(unit.with_leading_comments(LineSpan::between(fn_start, fn_end)))
    } else {
        // Shares its line with other tokens: take just its columns.
        unit.slice(fn_start, fn_end)
            .lines()
            .enumerate()
            .map(|(i, line)| if i == 0 { format!("    {line}") } else { line.to_string() })
            .collect()
    };

    let header_start = imp
        .attrs
        .first()
        .and_then(token_bounds)
        .map(|(start, _)| start)
        .or_else(|| imp.unsafety.map(|t| t.span.start()))
        .unwrap_or_else(|| imp.impl_token.span.start());
    let header = unit
        .slice(header_start, imp.brace_token.span.open().start())
        .trim_end()
        .to_string();

    let mut refs = references_in(|c| {
        c.visit_impl_item_fn(func);
        c.visit_generics(&imp.generics);
        c.visit_type(&imp.self_ty);
    });
    refs.insert(receiver.clone());

    let (cut_start, cut_end) = if imp.items.len() == 1 {
        token_bounds(imp).ok_or_else(|| internal("impl has no tokens"))?
    } else {
        (fn_start, fn_end)
    };

    let (imports, sibling_refs) = partition_refs(unit, &refs, &[]);
    unit.cut(cut_start, cut_end);
    unit.resync()?;

    debug!(receiver = %receiver, method, lines = text.len(), "method detached");
    Ok(ExtractedDeclaration {
        name: method.to_string(),
        kind: DeclarationKind::Method { receiver, header },
        text,
        imports,
        sibling_refs,
    })
}

/// Cut struct `name` out of `unit`.
pub fn detach_struct(unit: &mut SourceUnit, name: &str) -> SpliceResult<ExtractedDeclaration> {
    unit.resync()?;
    let located = unit.file().items.iter().find_map(|item| match item {
        Item::Struct(s) if s.ident == name => Some(s),
        _ => None,
    });
    let Some(item) = located else {
        return Err(SpliceError::not_found(
            format!("struct `{name}`"),
            unit.path().display().to_string(),
        ));
    };

    let (start, end) = token_bounds(item).ok_or_else(|| internal("struct has no tokens"))?;
    let text = if unit.stands_alone(start, end) {
        unit.span_text(unit.with_leading_comments(LineSpan::between(start, end)))
    } else {
        unit.slice(start, end).lines().map(str::to_string).collect()
    };
    let refs = references_in(|c| c.visit_item_struct(item));
    let (imports, sibling_refs) = partition_refs(unit, &refs, &[name]);

    unit.cut(start, end);
    unit.resync()?;

    debug!(name, lines = text.len(), "struct detached");
    Ok(ExtractedDeclaration {
        name: name.to_string(),
        kind: DeclarationKind::Struct,
        text,
        imports,
        sibling_refs,
    })
}

// Split references into imports the source provides and items it declares.
fn partition_refs(
    unit: &SourceUnit,
    refs: &BTreeSet<String>,
    exclude: &[&str],
) -> (Vec<UseEntry>, BTreeSet<String>) {
    let imports = unit
        .imports()
        .into_iter()
        .filter(|entry| match &entry.bound {
            Some(name) => refs.contains(name),
            None => entry.is_glob(),
        })
        .collect();
    let siblings = unit
        .file()
        .items
        .iter()
        .filter(|item| !matches!(item, Item::Impl(_) | Item::Use(_)))
        .filter_map(item_name)
        .filter(|name| refs.contains(name) && !exclude.contains(&name.as_str()))
        .collect();
    (imports, siblings)
}

/// Import `name` into `unit` from its new home `dest` when code left in
/// `unit` still refers to it. Returns the added path.
pub fn import_moved(
    unit: &mut SourceUnit,
    name: &str,
    dest: &Path,
) -> SpliceResult<Option<String>> {
    unit.resync()?;
    if unit.top_level_names().iter().any(|declared| declared == name) {
        return Ok(None);
    }
    let refs = references_in(|c| c.visit_file(unit.file()));
    if !refs.contains(name) {
        return Ok(None);
    }
    let path = dest
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| SourceModule::between(unit.path(), dest).path_back(stem, name));
    let Some(path) = path else {
        debug!(name, dest = %dest.display(), "moved item still referenced, no path back");
        return Ok(None);
    };
    Ok(unit.add_named_import("", &path)?.then_some(path))
}

/// Build a brand-new unit at `path` holding `decl`.
pub fn synthesize(
    path: &Path,
    decl: &ExtractedDeclaration,
    source: &SourceModule,
) -> SpliceResult<SourceUnit> {
    let mut lines: Vec<String> = decl.imports.iter().map(UseEntry::use_line).collect();
    lines.extend(
        sibling_uses(decl, source, &BTreeSet::new())
            .into_iter()
            .map(|p| format!("use {p};")),
    );
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.extend(declaration_block(decl));

    let mut text = lines.join("\n");
    text.push('\n');
    SourceUnit::parse_str(path, &text)
}

/// Append `decl` to an existing unit and merge its imports.
///
/// Methods join an existing inherent impl of their receiver carrying the
/// same attributes when there is one; otherwise a new impl block with the
/// source's header is appended. `super::` imports of names the destination
/// now declares itself are dropped.
pub fn merge_into(
    dest: &mut SourceUnit,
    decl: &ExtractedDeclaration,
    source: &SourceModule,
) -> SpliceResult<()> {
    dest.resync()?;

    let target_impl_close = match &decl.kind {
        DeclarationKind::Method { receiver, header } => {
            let wanted = header_attrs(header);
            dest.file().items.iter().find_map(|item| match item {
                Item::Impl(imp) if is_inherent_impl_of(imp, receiver) => {
                    let same_attrs = attr_text(&imp.attrs) == wanted;
                    same_attrs.then(|| (imp.brace_token.span.close().start(), imp.items.is_empty()))
                }
                _ => None,
            })
        }
        DeclarationKind::Struct => None,
    };

    match target_impl_close {
        Some((close, empty)) => {
            let mut block = Vec::new();
            if !empty {
                block.push(String::new());
            }
            block.extend(decl.text.iter().cloned());
            let before_close = dest.slice(LineColumn { line: close.line, column: 0 }, close);
            let at = if before_close.trim().is_empty() {
                close.line.saturating_sub(1)
            } else {
                // `impl X {}` and friends: give the brace a line of its own.
                dest.split_line(close);
                close.line
            };
            dest.splice_lines(at, block);
        }
        None => {
            let mut block = Vec::new();
            if dest.lines().last().is_some_and(|l| !l.trim().is_empty()) {
                block.push(String::new());
            }
            block.extend(declaration_block(decl));
            let end = dest.lines().len();
            dest.splice_lines(end, block);
        }
    }
    dest.resync()?;

    let declared: BTreeSet<String> = dest.top_level_names().into_iter().collect();
    let shadowed: Vec<String> = dest
        .imports()
        .into_iter()
        .filter(|entry| entry.path.starts_with("super::"))
        .filter(|entry| entry.bound.as_ref().is_some_and(|b| declared.contains(b)))
        .map(|entry| entry.path)
        .collect();
    for path in shadowed {
        dest.remove_import(&path)?;
        debug!(path, "dropped import of a name now declared locally");
    }

    for entry in &decl.imports {
        dest.add_named_import(&entry.alias_or_default(), &entry.path)?;
    }
    for path in sibling_uses(decl, source, &declared) {
        dest.add_named_import("", &path)?;
    }
    Ok(())
}

fn attr_text(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(|attr| attr.to_token_stream().to_string())
        .collect()
}

// Outer attributes written in an impl header.
fn header_attrs(header: &str) -> Vec<String> {
    syn::parse_str::<ItemImpl>(&format!("{header} {{}}"))
        .map(|imp| attr_text(&imp.attrs))
        .unwrap_or_default()
}

fn declaration_block(decl: &ExtractedDeclaration) -> Vec<String> {
    match &decl.kind {
        DeclarationKind::Struct => decl.text.clone(),
        DeclarationKind::Method { header, .. } => {
            let mut block: Vec<String> = header.lines().map(str::to_string).collect();
            // A trailing where-clause predicate puts the brace on its own line.
            match block.last_mut() {
                Some(last) if !last.ends_with(',') => last.push_str(" {"),
                _ => block.push("{".into()),
            }
            block.extend(decl.text.iter().cloned());
            block.push("}".into());
            block
        }
    }
}

fn sibling_uses(
    decl: &ExtractedDeclaration,
    source: &SourceModule,
    declared: &BTreeSet<String>,
) -> Vec<String> {
    decl.sibling_refs
        .iter()
        .filter(|name| !declared.contains(*name))
        .filter_map(|name| source.use_path(name))
        .collect()
}

fn internal(message: &str) -> SpliceError {
    SpliceError::Internal {
        message: message.to_string(),
    }
}
