//! Implementation of the `splice import` command.

use std::path::PathBuf;

use serde::Serialize;
use tracing::instrument;

use splice_adapters::LocalFilesystem;
use splice_core::application::EditService;

use super::{apply, report};
use crate::{
    cli::{GlobalArgs, ImportArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct ImportReport {
    file: PathBuf,
    path: String,
    alias: Option<String>,
    changed: bool,
}

/// Execute the `splice import` command.
#[instrument(skip_all, fields(file = %args.file.display(), path = %args.path))]
pub fn execute(
    args: ImportArgs,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let service = EditService::new(Box::new(LocalFilesystem::new()));
    let applied = apply(global, config, output, || {
        service.add_import(&args.file, &args.path, args.alias.as_deref())
    })?;
    let changed = applied.value;
    let applied = applied.map(|changed| ImportReport {
        file: args.file.clone(),
        path: args.path.clone(),
        alias: args.alias.clone(),
        changed,
    });

    report(output, &applied, |out| {
        if changed {
            out.success(&format!("Imported {} into {}", args.path, args.file.display()))
        } else {
            out.info(&format!("{} already imports {}", args.file.display(), args.path))
        }
    })
}
