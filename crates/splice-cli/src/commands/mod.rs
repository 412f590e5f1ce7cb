//! Command handlers.
//!
//! Each handler translates parsed arguments into calls on the core services,
//! wired to the local adapters, and reports the result. Mutating handlers
//! run through [`apply`] so `--diff` works the same everywhere.

use serde::Serialize;
use tracing::debug;

use splice_adapters::{RustfmtNormalizer, Sha256Snapshotter};
use splice_core::{
    application::{SnapshotService, ports::SourceNormalizer},
    domain::SnapshotDiff,
    error::SpliceResult,
};

use crate::{cli::GlobalArgs, config::AppConfig, error::CliResult, output::OutputManager};

pub mod completions;
pub mod config;
pub mod exec;
pub mod extract;
pub mod find;
pub mod import;
pub mod insert;
pub mod render;

/// A step's value plus the tree diff when one was taken.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub diff: Option<SnapshotDiff>,
}

impl<T> Applied<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            diff: self.diff,
        }
    }
}

/// Snapshot service honouring `snapshot.*` and `normalize.*` settings.
pub fn snapshot_service(config: &AppConfig) -> SnapshotService {
    let snapshotter = Sha256Snapshotter::new().with_ignored(config.snapshot.ignore.iter().cloned());
    let normalizer = config.normalize.enabled.then(|| {
        Box::new(
            RustfmtNormalizer::new()
                .with_rustfmt(config.normalize.rustfmt.clone())
                .with_edition(config.normalize.edition.clone()),
        ) as Box<dyn SourceNormalizer>
    });
    SnapshotService::new(Box::new(snapshotter), normalizer)
}

/// Run a mutating `step`, wrapped in snapshots of `--root` under `--diff`.
///
/// When the wrapped step fails the diff is printed before the error is
/// returned, so partial writes are still reported.
pub fn apply<T>(
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
    step: impl FnOnce() -> SpliceResult<T>,
) -> CliResult<Applied<T>> {
    if !global.diff {
        return Ok(Applied {
            value: step()?,
            diff: None,
        });
    }

    let outcome = snapshot_service(config).wrap(&global.root, step)?;
    for warning in &outcome.warnings {
        output.warning(warning)?;
    }
    debug!(changes = outcome.diff.report_lines().len(), "tree diff taken");
    match outcome.result {
        Ok(value) => Ok(Applied {
            value,
            diff: Some(outcome.diff),
        }),
        Err(err) => {
            output.diff(&outcome.diff)?;
            Err(err.into())
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    #[serde(flatten)]
    result: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a SnapshotDiff>,
}

/// Print an applied step: one JSON document in JSON mode, otherwise the
/// handler's human lines followed by the diff.
pub fn report<T: Serialize>(
    output: &OutputManager,
    applied: &Applied<T>,
    human: impl FnOnce(&OutputManager) -> std::io::Result<()>,
) -> CliResult<()> {
    if output.is_json() {
        output.json(&JsonReport {
            result: &applied.value,
            diff: applied.diff.as_ref(),
        })?;
        return Ok(());
    }
    human(output)?;
    if let Some(diff) = &applied.diff {
        output.diff(diff)?;
    }
    Ok(())
}
