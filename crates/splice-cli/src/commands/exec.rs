//! Implementation of the `splice exec` command.
//!
//! Runs an external generator between two snapshots of `--root` and reports
//! every file it added, modified or deleted. The snapshot is always taken,
//! with or without `--diff`.

use std::process::Command;

use serde::Serialize;
use tracing::{info, instrument};

use super::{Applied, report, snapshot_service};
use crate::{
    cli::{ExecArgs, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct ExecReport {
    command: String,
    status: Option<i32>,
}

/// Execute the `splice exec` command.
#[instrument(
    skip_all,
    fields(program = %args.command.first().map(String::as_str).unwrap_or_default())
)]
pub fn execute(
    args: ExecArgs,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| CliError::InvalidInput {
            message: "no command given".into(),
            source: None,
        })?;
    let display = args.command.join(" ");

    let outcome = snapshot_service(config).wrap(&global.root, || {
        Ok(Command::new(program).args(rest).status())
    })?;
    for warning in &outcome.warnings {
        output.warning(warning)?;
    }

    let status = match outcome.result? {
        Ok(status) => status,
        Err(e) => {
            output.diff(&outcome.diff)?;
            return Err(CliError::ExternalCommandFailed {
                command: display,
                reason: "could not be started".into(),
                source: Some(Box::new(e)),
            });
        }
    };
    info!(%status, changes = outcome.diff.report_lines().len(), "command finished");

    if !status.success() {
        output.diff(&outcome.diff)?;
        return Err(CliError::ExternalCommandFailed {
            command: display,
            reason: status.to_string(),
            source: None,
        });
    }

    let applied = Applied {
        value: ExecReport {
            command: display,
            status: status.code(),
        },
        diff: Some(outcome.diff),
    };
    report(output, &applied, |out| {
        if applied.diff.as_ref().is_some_and(|d| d.is_empty()) {
            out.info("No files changed")
        } else {
            Ok(())
        }
    })
}
