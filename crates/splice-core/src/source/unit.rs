//! Source File Model: one Rust compilation unit held as a syntax tree plus
//! the raw line buffer it was parsed from.
//!
//! The line buffer is the source of truth for saving. Textual edits
//! ([`SourceUnit::insert_relative_to_pattern`]) touch only the buffer and
//! mark the tree stale; structural edits ([`SourceUnit::add_named_import`])
//! first re-parse a stale buffer, splice at positions taken from the tree's
//! spans, then re-parse so both views agree again. Splicing by span rather
//! than re-printing the tree keeps ordinary `//` comments, which `syn` does
//! not model.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use proc_macro2::LineColumn;
use quote::ToTokens;
use regex::Regex;
use syn::{ImplItem, Item, ItemImpl, Type};
use tracing::{debug, instrument};

use super::imports::{UseEntry, file_imports, flatten_use, references_in};
use crate::application::ports::Filesystem;
use crate::domain::lines::{self, Anchor, InsertOutcome, PatternMode, Placement};
use crate::domain::default_alias;
use crate::error::{SpliceError, SpliceResult};

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    /// Lines covered by a syntax node's tokens, attributes and doc comments included.
    pub fn of<T: ToTokens>(node: &T) -> Option<Self> {
        token_bounds(node).map(|(from, to)| Self::between(from, to))
    }

    pub fn between(from: LineColumn, to: LineColumn) -> Self {
        Self {
            start: from.line,
            end: to.line,
        }
    }
}

/// Start of a node's first token and end of its last one.
pub(crate) fn token_bounds<T: ToTokens>(node: &T) -> Option<(LineColumn, LineColumn)> {
    let mut tokens = node.to_token_stream().into_iter();
    let first = tokens.next()?;
    let start = first.span().start();
    let end = tokens.last().unwrap_or(first).span().end();
    Some((start, end))
}

/// A parsed Rust file plus its line buffer.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: PathBuf,
    file: syn::File,
    lines: Vec<String>,
    trailing_newline: bool,
    stale: bool,
}

impl SourceUnit {
    /// Read and parse `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(fs: &dyn Filesystem, path: impl AsRef<Path>) -> SpliceResult<Self> {
        let path = path.as_ref();
        let text = fs.read_to_string(path)?;
        Self::parse_str(path, &text)
    }

    /// Parse `text` as the contents of `path`.
    pub fn parse_str(path: impl AsRef<Path>, text: &str) -> SpliceResult<Self> {
        let path = path.as_ref();
        let file = syn::parse_file(text).map_err(|e| SpliceError::parse(path, &e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            lines: lines::split_lines(text),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
            stale: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Structural view. May lag the buffer when [`Self::is_stale`].
    pub fn file(&self) -> &syn::File {
        &self.file
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Current buffer contents.
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Re-parse the buffer so the tree reflects every textual edit.
    pub fn resync(&mut self) -> SpliceResult<()> {
        let text = self.text();
        self.file = syn::parse_file(&text).map_err(|e| SpliceError::parse(&self.path, &e))?;
        self.stale = false;
        Ok(())
    }

    fn resync_if_stale(&mut self) -> SpliceResult<()> {
        if self.stale {
            debug!(path = %self.path.display(), "re-parsing after textual edits");
            self.resync()?;
        }
        Ok(())
    }

    // Best current tree for read-only queries, without mutating `self`.
    fn current_file(&self) -> Cow<'_, syn::File> {
        if self.stale {
            if let Ok(file) = syn::parse_file(&self.text()) {
                return Cow::Owned(file);
            }
        }
        Cow::Borrowed(&self.file)
    }

    // ── Imports ────────────────────────────────────────────────────────────

    /// Every top-level import, flattened.
    pub fn imports(&self) -> Vec<UseEntry> {
        file_imports(&self.current_file())
    }

    /// `true` when some `use` leaf has exactly this path.
    pub fn has_import(&self, path: &str) -> bool {
        let path = path.trim();
        self.imports().iter().any(|entry| entry.path == path)
    }

    /// Add `use path as alias;` unless `path` is already imported.
    ///
    /// An empty alias, or one equal to the path's last segment, yields a plain
    /// `use path;`. Returns whether the file changed.
    #[instrument(skip(self), fields(file = %self.path.display()))]
    pub fn add_named_import(&mut self, alias: &str, path: &str) -> SpliceResult<bool> {
        self.resync_if_stale()?;
        if self.has_import(path) {
            return Ok(false);
        }

        let line = if alias.is_empty() || alias == default_alias(path) {
            format!("use {path};")
        } else {
            format!("use {path} as {alias};")
        };
        syn::parse_str::<syn::ItemUse>(&line).map_err(|e| SpliceError::Parse {
            path: self.path.clone(),
            line: 0,
            column: 0,
            message: format!("cannot import '{path}': {e}"),
        })?;

        self.insert_top_level(line, |item| matches!(item, Item::Use(_)))?;
        debug!(path, alias, "import added");
        Ok(true)
    }

    /// Drop the `use` leaf with exactly this path. Other leaves of a grouped
    /// item are kept, one `use` line each. Returns whether the file changed.
    pub fn remove_import(&mut self, path: &str) -> SpliceResult<bool> {
        self.resync_if_stale()?;
        let found = self.file.items.iter().find_map(|item| match item {
            Item::Use(u) => {
                let entries = flatten_use(u);
                entries.iter().any(|e| e.path == path).then_some((u, entries))
            }
            _ => None,
        });
        let Some((item, entries)) = found else {
            return Ok(false);
        };
        let Some((start, end)) = token_bounds(item) else {
            return Ok(false);
        };

        let rest: Vec<&UseEntry> = entries.iter().filter(|e| e.path != path).collect();
        if rest.is_empty() {
            self.cut(start, end);
        } else {
            let vis = match &item.vis {
                syn::Visibility::Inherited => String::new(),
                vis => token_bounds(vis)
                    .map(|(from, to)| format!("{} ", self.slice(from, to)))
                    .unwrap_or_default(),
            };
            let from = token_bounds(&item.vis)
                .map(|(from, _)| from)
                .unwrap_or_else(|| item.use_token.span.start());
            let text = rest
                .iter()
                .map(|e| format!("{vis}{}", e.use_line()))
                .collect::<Vec<_>>()
                .join("\n");
            self.replace_range(from, end, &text);
        }
        self.resync()?;
        debug!(path, "import removed");
        Ok(true)
    }

    /// Declare `mod name;` unless a module of that name already exists.
    pub fn add_module_declaration(&mut self, name: &str) -> SpliceResult<bool> {
        self.resync_if_stale()?;
        let declared = self
            .file
            .items
            .iter()
            .any(|item| matches!(item, Item::Mod(m) if m.ident == name));
        if declared {
            return Ok(false);
        }
        let is_mod_decl = |item: &Item| matches!(item, Item::Mod(m) if m.content.is_none());
        if self.file.items.iter().any(is_mod_decl) {
            self.insert_top_level(format!("mod {name};"), is_mod_decl)?;
        } else {
            self.insert_top_level(format!("mod {name};"), |item| matches!(item, Item::Use(_)))?;
        }
        Ok(true)
    }

    // Splice `line` after the last top-level item matching `group`; without
    // one, after the inner attributes and module docs, else at the top.
    fn insert_top_level(
        &mut self,
        line: String,
        group: impl Fn(&Item) -> bool,
    ) -> SpliceResult<()> {
        let last_in_group = self
            .file
            .items
            .iter()
            .filter(|&item| group(item))
            .filter_map(LineSpan::of)
            .map(|span| span.end)
            .max();

        let mut block = vec![line];
        let at = match last_in_group {
            Some(end) => end,
            None => {
                let attrs_end = self
                    .file
                    .attrs
                    .iter()
                    .filter_map(LineSpan::of)
                    .map(|span| span.end)
                    .max()
                    .unwrap_or(0);
                if attrs_end > 0 {
                    block.insert(0, String::new());
                }
                if self.lines.get(attrs_end).is_some_and(|l| !l.trim().is_empty()) {
                    block.push(String::new());
                }
                attrs_end
            }
        };

        let at = at.min(self.lines.len());
        self.lines.splice(at..at, block);
        self.resync()
    }

    // ── Declarations ───────────────────────────────────────────────────────

    /// Line scan for a `fn name` declaration; valid even when the tree is stale.
    pub fn has_function(&self, name: &str) -> bool {
        let pattern = format!(
            r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+{}\b"#,
            regex::escape(name)
        );
        match Regex::new(&pattern) {
            Ok(re) => self.lines.iter().any(|line| re.is_match(line)),
            Err(_) => false,
        }
    }

    /// `true` when an `impl` block for `receiver` declares `method`.
    pub fn has_method(&self, receiver: &str, method: &str) -> bool {
        let receiver = normalize_receiver(receiver);
        self.current_file().items.iter().any(|item| match item {
            Item::Impl(imp) => {
                self_type_name(&imp.self_ty).as_deref() == Some(receiver)
                    && impl_fn_names(imp).any(|name| name == method)
            }
            _ => false,
        })
    }

    /// Names of methods declared in inherent impls of `receiver`, in file order.
    pub fn inherent_methods(&self, receiver: &str) -> Vec<String> {
        let receiver = normalize_receiver(receiver);
        self.current_file()
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(imp) if is_inherent_impl_of(imp, receiver) => {
                    Some(impl_fn_names(imp).collect::<Vec<_>>())
                }
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Names of every top-level named item (types, fns, consts, ...).
    pub fn top_level_names(&self) -> Vec<String> {
        self.current_file().items.iter().filter_map(item_name).collect()
    }

    // ── Textual edits ──────────────────────────────────────────────────────

    /// Insert `new_lines` before/after the first match of `pattern`.
    ///
    /// A missing anchor is not an error; the outcome says what happened.
    /// Marks the tree stale when the buffer changes.
    #[instrument(skip(self, new_lines), fields(file = %self.path.display()))]
    pub fn insert_relative_to_pattern(
        &mut self,
        pattern: &str,
        new_lines: &str,
        placement: Placement,
        mode: PatternMode,
    ) -> SpliceResult<InsertOutcome> {
        let anchor = Anchor::compile(pattern, mode)?;
        let new_lines = lines::split_lines(new_lines);
        let outcome = lines::insert_relative(&mut self.lines, &anchor, &new_lines, placement);
        if outcome.changed() {
            self.stale = true;
        }
        debug!(?outcome, "anchored insertion");
        Ok(outcome)
    }

    /// Append raw text at the end of the buffer.
    pub fn append_lines(&mut self, text: &str) {
        self.lines.extend(lines::split_lines(text));
        self.stale = true;
    }

    /// Splice raw lines at a 0-based buffer index.
    pub(crate) fn splice_lines(&mut self, at: usize, new_lines: Vec<String>) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, new_lines);
        self.stale = true;
    }

    /// Remove an inclusive 1-based line range, collapsing a doubled blank line.
    pub(crate) fn remove_span(&mut self, span: LineSpan) {
        let start = span.start.saturating_sub(1).min(self.lines.len());
        let end = span.end.min(self.lines.len());
        self.lines.drain(start..end);

        let blank =
            |idx: usize, lines: &[String]| lines.get(idx).is_some_and(|l| l.trim().is_empty());
        if start < self.lines.len()
            && blank(start, &self.lines)
            && (start == 0 || blank(start - 1, &self.lines))
        {
            self.lines.remove(start);
        } else if start > 0
            && blank(start - 1, &self.lines)
            && self.lines.get(start).is_some_and(|l| l.trim_start().starts_with('}'))
        {
            self.lines.remove(start - 1);
        }
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        self.stale = true;
    }

    /// Replace the text between two span positions.
    pub(crate) fn replace_range(&mut self, from: LineColumn, to: LineColumn, replacement: &str) {
        let (Some(first), Some(last)) = (
            self.lines.get(from.line.saturating_sub(1)),
            self.lines.get(to.line.saturating_sub(1)),
        ) else {
            return;
        };
        let head: String = first.chars().take(from.column).collect();
        let tail: String = last.chars().skip(to.column).collect();
        let text = format!("{head}{replacement}{tail}");
        self.lines
            .splice(from.line.saturating_sub(1)..to.line, lines::split_lines(&text));
        self.stale = true;
    }

    /// Remove the text between two span positions, joining what surrounds it.
    pub(crate) fn remove_range(&mut self, from: LineColumn, to: LineColumn) {
        let head = self.slice(LineColumn { line: from.line, column: 0 }, from);
        let tail = self.slice(to, LineColumn { line: to.line, column: usize::MAX });
        let joined = match (head.trim_end(), tail.trim_start()) {
            ("", "") => None,
            (h, "") => Some(h.to_string()),
            ("", t) => Some(format!("{head}{t}")),
            (h, t) => Some(format!("{h} {t}")),
        };
        match joined {
            Some(line) => {
                self.lines
                    .splice(from.line.saturating_sub(1)..to.line.min(self.lines.len()), [line]);
                self.stale = true;
            }
            None => self.remove_span(LineSpan::between(from, to)),
        }
    }

    /// `true` when nothing but whitespace shares lines with the range.
    pub(crate) fn stands_alone(&self, from: LineColumn, to: LineColumn) -> bool {
        let head = self.slice(LineColumn { line: from.line, column: 0 }, from);
        let tail = self.slice(to, LineColumn { line: to.line, column: usize::MAX });
        head.trim().is_empty() && tail.trim().is_empty()
    }

    /// Remove a node's range: whole lines, leading comments included, when it
    /// stands alone, otherwise just its columns.
    pub(crate) fn cut(&mut self, from: LineColumn, to: LineColumn) {
        if self.stands_alone(from, to) {
            let span = self.with_leading_comments(LineSpan::between(from, to));
            self.remove_span(span);
        } else {
            self.remove_range(from, to);
        }
    }

    /// Break the line holding `at` in two; the second half keeps the line's
    /// indentation.
    pub(crate) fn split_line(&mut self, at: LineColumn) {
        let idx = at.line.saturating_sub(1);
        let Some(line) = self.lines.get(idx) else {
            return;
        };
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        let head: String = line.chars().take(at.column).collect();
        let tail: String = line.chars().skip(at.column).collect();
        let halves = [
            head.trim_end().to_string(),
            format!("{indent}{}", tail.trim_start()),
        ];
        self.lines.splice(idx..=idx, halves);
        self.stale = true;
    }

    /// Extend `span` upwards over a directly preceding block of `//` comments.
    pub(crate) fn with_leading_comments(&self, span: LineSpan) -> LineSpan {
        let mut start = span.start;
        while start > 1 {
            let above = self.lines[start - 2].trim_start();
            let is_plain_comment = above.starts_with("//") && !above.starts_with("//!");
            if !is_plain_comment {
                break;
            }
            start -= 1;
        }
        LineSpan { start, ..span }
    }

    /// Copy of the buffer lines covered by `span`.
    pub(crate) fn span_text(&self, span: LineSpan) -> Vec<String> {
        let start = span.start.saturating_sub(1).min(self.lines.len());
        let end = span.end.min(self.lines.len());
        self.lines[start..end].to_vec()
    }

    /// Text between two span positions, columns counted in chars.
    pub(crate) fn slice(&self, from: LineColumn, to: LineColumn) -> String {
        let mut out = String::new();
        for line_no in from.line..=to.line {
            let Some(line) = self.lines.get(line_no.saturating_sub(1)) else {
                break;
            };
            let skip = if line_no == from.line { from.column } else { 0 };
            let take = if line_no == to.line {
                to.column.saturating_sub(skip)
            } else {
                usize::MAX
            };
            if line_no != from.line {
                out.push('\n');
            }
            out.extend(line.chars().skip(skip).take(take));
        }
        out
    }

    // ── Import pruning ─────────────────────────────────────────────────────

    /// Drop private top-level `use` items that nothing in the file refers to.
    ///
    /// Only items whose every bound name starts lowercase are candidates;
    /// type and trait imports stay, since traits are used implicitly through
    /// method calls. Globs, `as _`, `pub use` and attributed imports stay.
    /// Returns the removed paths.
    pub fn prune_unused_imports(&mut self) -> SpliceResult<Vec<String>> {
        self.resync_if_stale()?;
        let used = references_in(|c| syn::visit::Visit::visit_file(c, &self.file));

        let mut removable: Vec<(LineSpan, Vec<String>)> = Vec::new();
        for item in &self.file.items {
            let Item::Use(u) = item else { continue };
            if !matches!(u.vis, syn::Visibility::Inherited) || !u.attrs.is_empty() {
                continue;
            }
            let entries = flatten_use(u);
            let prunable = entries.iter().all(|entry| match &entry.bound {
                Some(name) => {
                    name.starts_with(|c: char| c.is_ascii_lowercase()) && !used.contains(name)
                }
                None => false,
            });
            if prunable {
                if let Some(span) = LineSpan::of(u) {
                    removable.push((span, entries.into_iter().map(|e| e.path).collect()));
                }
            }
        }

        let mut removed = Vec::new();
        for (span, paths) in removable.into_iter().rev() {
            self.remove_span(span);
            removed.extend(paths);
        }
        removed.reverse();
        if !removed.is_empty() {
            self.resync()?;
            debug!(?removed, "pruned unused imports");
        }
        Ok(removed)
    }

    // ── Persistence ────────────────────────────────────────────────────────

    /// Write the line buffer back to this unit's path.
    pub fn save(&self, fs: &dyn Filesystem) -> SpliceResult<()> {
        self.save_as(fs, &self.path)
    }

    /// Write the line buffer to `path`.
    pub fn save_as(&self, fs: &dyn Filesystem, path: &Path) -> SpliceResult<()> {
        debug!(path = %path.display(), lines = self.lines.len(), "saving source unit");
        fs.write_file(path, &self.text())
    }
}

// ── Helpers shared with the extraction engine ─────────────────────────────

/// Strip reference/pointer sigils callers sometimes keep on receivers.
pub(crate) fn normalize_receiver(receiver: &str) -> &str {
    receiver
        .trim()
        .trim_start_matches(['&', '*'])
        .trim_start_matches("mut ")
        .trim()
}

/// Last path segment of an impl's self type, through references and parens.
pub(crate) fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(r) => self_type_name(&r.elem),
        Type::Paren(p) => self_type_name(&p.elem),
        Type::Group(g) => self_type_name(&g.elem),
        _ => None,
    }
}

pub(crate) fn is_inherent_impl_of(imp: &ItemImpl, receiver: &str) -> bool {
    imp.trait_.is_none() && self_type_name(&imp.self_ty).as_deref() == Some(receiver)
}

pub(crate) fn impl_fn_names(imp: &ItemImpl) -> impl Iterator<Item = String> + '_ {
    imp.items.iter().filter_map(|item| match item {
        ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
        _ => None,
    })
}

pub(crate) fn item_name(item: &Item) -> Option<String> {
    let ident = match item {
        Item::Struct(i) => &i.ident,
        Item::Enum(i) => &i.ident,
        Item::Union(i) => &i.ident,
        Item::Trait(i) => &i.ident,
        Item::Type(i) => &i.ident,
        Item::Fn(i) => &i.sig.ident,
        Item::Const(i) => &i.ident,
        Item::Static(i) => &i.ident,
        Item::Mod(i) => &i.ident,
        Item::Macro(i) => i.ident.as_ref()?,
        _ => return None,
    };
    Some(ident.to_string())
}
