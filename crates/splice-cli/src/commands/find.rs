//! Implementation of the `splice find` command.

use tracing::instrument;

use splice_adapters::LocalFilesystem;
use splice_core::source::{DeclarationMatch, ModuleRootOptions, PackageUnit};

use crate::{
    cli::{FindArgs, FindFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Execute the `splice find` command.
#[instrument(skip_all, fields(dir = %args.dir.display(), pattern = %args.pattern))]
pub fn execute(args: FindArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let options = ModuleRootOptions {
        marker: config.source.module_marker.clone(),
    };
    let package = PackageUnit::load(&LocalFilesystem::new(), &args.dir, args.recursive, &options)?;
    let matches = package.find_declarations_by_pattern(&args.pattern)?;

    if args.format == FindFormat::Json || output.is_json() {
        // JSON must stay parseable even in non-TTY pipes.
        output.json(&matches)?;
        return Ok(());
    }

    if matches.is_empty() {
        output.info(&format!(
            "No declarations matching '{}' in {} ({} files)",
            args.pattern,
            args.dir.display(),
            package.len()
        ))?;
        return Ok(());
    }

    output.header(&format!("Declarations in {}:", package.root_import_path()))?;
    for line in table(&matches) {
        output.print(&line)?;
    }
    Ok(())
}

fn table(matches: &[DeclarationMatch]) -> Vec<String> {
    let kind_width = matches.iter().map(|m| m.kind.as_str().len()).max().unwrap_or(0);
    let name_width = matches.iter().map(|m| m.name.len()).max().unwrap_or(0);
    let file_width = matches.iter().map(|m| m.file_name.len()).max().unwrap_or(0);
    matches
        .iter()
        .map(|m| {
            let marker = if m.is_self { "  (self)" } else { "" };
            format!(
                "  {:<kind_width$}  {:<name_width$}  {:<file_width$}  {}{}",
                m.kind.as_str(),
                m.name,
                m.file_name,
                m.package_path,
                marker
            )
        })
        .collect()
}
