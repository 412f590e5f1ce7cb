//! Implementation of `splice extract method|struct`.

use tracing::{info, instrument};

use splice_adapters::LocalFilesystem;
use splice_core::application::{ExtractReport, ExtractService};

use super::{apply, report};
use crate::{
    cli::{ExtractCommands, GlobalArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Execute an extract subcommand.
#[instrument(skip_all)]
pub fn execute(
    cmd: ExtractCommands,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let service = ExtractService::new(Box::new(LocalFilesystem::new()));

    let applied = match &cmd {
        ExtractCommands::Method(args) => apply(global, config, output, || {
            service.extract_method(&args.receiver, &args.name, &args.from, &args.to)
        })?,
        ExtractCommands::Struct(args) => apply(global, config, output, || {
            service.extract_struct(&args.name, &args.from, &args.to)
        })?,
    };
    info!(moved = applied.value.moved.len(), "extraction finished");

    report(output, &applied, |out| describe(out, &applied.value))
}

fn describe(out: &OutputManager, report: &ExtractReport) -> std::io::Result<()> {
    out.success(&format!(
        "Moved {} from {} to {}",
        report.moved.join(", "),
        report.source.display(),
        report.destination.display()
    ))?;
    if report.created {
        out.info(&format!("Created {}", report.destination.display()))?;
    }
    for path in &report.imports {
        out.print(&format!("  use {path}"))?;
    }
    Ok(())
}
