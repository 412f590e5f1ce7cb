//! Template renderer backed by minijinja.

use minijinja::{Environment, UndefinedBehavior};
use splice_core::{
    application::ports::TemplateRenderer,
    domain::RenderContext,
    error::{SpliceError, SpliceResult},
};
use tracing::{debug, instrument};

use super::case;

/// Renders template bodies with Jinja syntax: `{{ var }}`, `{% if %}`,
/// `{% for %}`, plus case-conversion filters (`snake_case`, `pascal_case`,
/// `camel_case`, `screaming_snake_case`, `kebab_case`).
///
/// Undefined variables are errors, never empty strings.
pub struct MinijinjaRenderer {
    env: Environment<'static>,
}

impl MinijinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_filter("snake_case", case::snake_case);
        env.add_filter("pascal_case", case::pascal_case);
        env.add_filter("camel_case", case::camel_case);
        env.add_filter("screaming_snake_case", case::screaming_snake_case);
        env.add_filter("kebab_case", case::kebab_case);
        Self { env }
    }
}

impl Default for MinijinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MinijinjaRenderer {
    #[instrument(skip_all, fields(vars = context.len()))]
    fn render(&self, body: &str, context: &RenderContext) -> SpliceResult<String> {
        let output = self.env.render_str(body, context).map_err(template_error)?;
        debug!(bytes = output.len(), "template rendered");
        Ok(output)
    }
}

fn template_error(err: minijinja::Error) -> SpliceError {
    let reason = match err.line() {
        Some(line) => format!("{err} (line {line})"),
        None => err.to_string(),
    };
    SpliceError::Template { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::domain::CodeTemplate;

    fn ctx(pairs: &[(&str, &str)]) -> RenderContext {
        let mut ctx = RenderContext::new();
        for (k, v) in pairs {
            ctx.set(*k, *v);
        }
        ctx
    }

    #[test]
    fn substitutes_and_keeps_trailing_newline() {
        let out = MinijinjaRenderer::new()
            .render("pub struct {{ name }};\n", &ctx(&[("name", "User")]))
            .unwrap();
        assert_eq!(out, "pub struct User;\n");
    }

    #[test]
    fn undefined_variable_is_a_template_error() {
        let err = MinijinjaRenderer::new()
            .render("pub struct {{ missing }};", &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, SpliceError::Template { .. }));
    }

    #[test]
    fn malformed_syntax_is_a_template_error() {
        let err = MinijinjaRenderer::new()
            .render("{% if name %}unterminated", &ctx(&[("name", "x")]))
            .unwrap_err();
        assert!(matches!(err, SpliceError::Template { .. }));
    }

    #[test]
    fn conditionals_loops_and_filters() {
        let mut context = ctx(&[("name", "user_handler")]);
        context.set_value("fields", vec!["id", "email"]).unwrap();
        context.set_value("with_new", true).unwrap();
        let body = "pub struct {{ name | pascal_case }} {\n{% for f in fields %}    pub {{ f }}: String,\n{% endfor %}}\n{% if with_new %}// ctor\n{% endif %}";
        let out = MinijinjaRenderer::new().render(body, &context).unwrap();
        assert_eq!(
            out,
            "pub struct UserHandler {\n    pub id: String,\n    pub email: String,\n}\n// ctor\n"
        );
    }

    #[test]
    fn registered_imports_render_in_order() {
        let mut tpl = CodeTemplate::new("{% for i in imports %}{{ i.use_line }}\n{% endfor %}");
        tpl.add_import("std::fmt", None);
        tpl.add_import("core::fmt", None);
        tpl.add_import("serde_json", Some("json"));
        let out = MinijinjaRenderer::new()
            .render(tpl.body(), &tpl.render_context().unwrap())
            .unwrap();
        assert_eq!(out, "use std::fmt;\nuse core::fmt as fmt1;\nuse serde_json as json;\n");
    }
}
