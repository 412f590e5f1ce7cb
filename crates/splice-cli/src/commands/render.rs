//! Implementation of the `splice render` command.
//!
//! Responsibility: assemble a [`CodeTemplate`] from the template file, its
//! variables and imports, then hand it to the generate service. No rendering
//! logic lives here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use splice_adapters::{LocalFilesystem, MinijinjaRenderer};
use splice_core::{
    application::{ExistingFile, GenerateOutcome, GenerateService},
    domain::CodeTemplate,
};

use super::{apply, report};
use crate::{
    cli::{GlobalArgs, IfExists, RenderArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct RenderReport {
    path: PathBuf,
    outcome: GenerateOutcome,
}

impl From<IfExists> for ExistingFile {
    fn from(policy: IfExists) -> Self {
        match policy {
            IfExists::Fail => ExistingFile::Fail,
            IfExists::Skip => ExistingFile::Skip,
            IfExists::Overwrite => ExistingFile::Overwrite,
        }
    }
}

/// Execute the `splice render` command.
#[instrument(skip_all, fields(template = %args.template.display(), out = %args.out.display()))]
pub fn execute(
    args: RenderArgs,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let template = build_template(&args)?;
    debug!(imports = template.imports().len(), "template assembled");

    let service = GenerateService::new(
        Box::new(MinijinjaRenderer::new()),
        Box::new(LocalFilesystem::new()),
    );
    let policy = ExistingFile::from(args.if_exists);

    let applied = apply(global, config, output, || {
        service.generate(&template, &args.out, policy)
    })?
    .map(|outcome| RenderReport {
        path: args.out.clone(),
        outcome,
    });

    report(output, &applied, |out| match applied.value.outcome {
        GenerateOutcome::Created => out.success(&format!("Created {}", args.out.display())),
        GenerateOutcome::Overwritten => {
            out.success(&format!("Overwrote {}", args.out.display()))
        }
        GenerateOutcome::Skipped => {
            out.info(&format!("{} already exists, skipped", args.out.display()))
        }
    })
}

fn build_template(args: &RenderArgs) -> CliResult<CodeTemplate> {
    let body = fs::read_to_string(&args.template)
        .with_cli_context(|| format!("cannot read template {}", args.template.display()))?;
    let mut template = CodeTemplate::new(body);

    if let Some(path) = &args.vars_file {
        template.context_mut().extend_from_json(load_vars(path)?)?;
    }
    for (name, value) in &args.vars {
        template.context_mut().set(name.as_str(), value.as_str());
    }
    for (path, alias) in &args.imports {
        template.add_import(path, alias.as_deref());
    }
    Ok(template)
}

/// Read a variables object from a `.json` or `.toml` file.
fn load_vars(path: &Path) -> CliResult<Value> {
    let text = fs::read_to_string(path)
        .with_cli_context(|| format!("cannot read variables file {}", path.display()))?;
    let invalid = |reason: String| CliError::InvalidVariables {
        path: path.to_path_buf(),
        reason,
    };

    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?,
        Some("toml") => toml::from_str(&text).map_err(|e| invalid(e.to_string()))?,
        other => {
            return Err(invalid(format!(
                "unsupported extension {}",
                other.map(|e| format!("'.{e}'")).unwrap_or_else(|| "(none)".into())
            )));
        }
    };
    if !value.is_object() {
        return Err(invalid("top level must be an object".into()));
    }
    Ok(value)
}
