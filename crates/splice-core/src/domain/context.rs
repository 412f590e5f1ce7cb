//! Render context: the named variables bound into a template body.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::imports::{ImportEntry, ImportRegistry};
use crate::error::{SpliceError, SpliceResult};

/// Reserved variable name populated from the import registry at render time.
pub const IMPORTS_KEY: &str = "imports";

/// Variables available to a template, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    vars: BTreeMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a string variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Bind any serialisable value (bool, slice, nested struct, ...).
    pub fn set_value<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> SpliceResult<&mut Self> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| SpliceError::Template {
            reason: format!("variable '{name}' is not serialisable: {e}"),
        })?;
        self.vars.insert(name, value);
        Ok(self)
    }

    /// Merge every key of a JSON object into the context.
    pub fn extend_from_json(&mut self, value: Value) -> SpliceResult<()> {
        match value {
            Value::Object(map) => {
                self.vars.extend(map);
                Ok(())
            }
            other => Err(SpliceError::Template {
                reason: format!("variables must be an object, got {}", json_kind(&other)),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Template-facing view of one registered import.
#[derive(Debug, Serialize)]
struct ImportView<'a> {
    path: &'a str,
    alias: &'a str,
    is_default: bool,
    use_line: String,
}

impl<'a> From<&'a ImportEntry> for ImportView<'a> {
    fn from(entry: &'a ImportEntry) -> Self {
        Self {
            path: &entry.path,
            alias: &entry.alias,
            is_default: entry.is_default_alias(),
            use_line: entry.use_line(),
        }
    }
}

/// A template body plus everything bound into it.
///
/// Callers register imports and variables, then hand the template to a
/// renderer. The context is frozen by [`CodeTemplate::render_context`].
#[derive(Debug, Clone)]
pub struct CodeTemplate {
    body: String,
    imports: ImportRegistry,
    context: RenderContext,
}

impl CodeTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            imports: ImportRegistry::new(),
            context: RenderContext::new(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Register an import; returns the alias the template should use.
    pub fn add_import(&mut self, path: &str, alias: Option<&str>) -> String {
        self.imports.add_import(path, alias)
    }

    pub fn imports(&self) -> &ImportRegistry {
        &self.imports
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Final context: caller variables plus the reserved `imports` list.
    pub fn render_context(&self) -> SpliceResult<RenderContext> {
        if self.context.contains(IMPORTS_KEY) {
            tracing::warn!("variable 'imports' is reserved and will be replaced");
        }
        let views: Vec<ImportView<'_>> =
            self.imports.entries().iter().map(ImportView::from).collect();
        let mut ctx = self.context.clone();
        ctx.set_value(IMPORTS_KEY, views)?;
        Ok(ctx)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
