//! Implementation of the `splice insert` command.

use std::path::PathBuf;

use serde::Serialize;
use tracing::instrument;

use splice_adapters::LocalFilesystem;
use splice_core::{
    application::EditService,
    domain::{InsertOutcome, PatternMode, Placement},
};

use super::{apply, report};
use crate::{
    cli::{GlobalArgs, InsertArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct InsertReport {
    file: PathBuf,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
}

impl InsertReport {
    fn new(file: PathBuf, outcome: InsertOutcome) -> Self {
        let (name, line) = match outcome {
            InsertOutcome::Inserted { line } => ("inserted", Some(line)),
            InsertOutcome::AlreadyPresent => ("already_present", None),
            InsertOutcome::AnchorNotFound => ("anchor_not_found", None),
        };
        Self {
            file,
            outcome: name,
            line,
        }
    }
}

/// Execute the `splice insert` command.
///
/// A missing anchor is reported as a warning, not a failure: the file is
/// left untouched and the exit code stays 0.
#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(
    args: InsertArgs,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    if args.lines.trim().is_empty() {
        return Err(CliError::InvalidInput {
            message: "--lines must contain at least one non-blank line".into(),
            source: None,
        });
    }

    let placement = if args.before {
        Placement::Before
    } else {
        Placement::After
    };
    let mode = if args.regex {
        PatternMode::Regex
    } else {
        PatternMode::Literal
    };

    let service = EditService::new(Box::new(LocalFilesystem::new()));
    let applied = apply(global, config, output, || {
        service.insert(&args.file, &args.pattern, &args.lines, placement, mode)
    })?;
    let outcome = applied.value;
    let applied = applied.map(|outcome| InsertReport::new(args.file.clone(), outcome));

    report(output, &applied, |out| match outcome {
        InsertOutcome::Inserted { line } => out.success(&format!(
            "Inserted into {} at line {line}",
            args.file.display()
        )),
        InsertOutcome::AlreadyPresent => out.info(&format!(
            "{} already contains these lines",
            args.file.display()
        )),
        InsertOutcome::AnchorNotFound => out.warning(&format!(
            "Anchor not found in {}; nothing inserted",
            args.file.display()
        )),
    })
}
