//! Generate Service - renders a template (with its import registry) and
//! writes the result.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    application::ports::{Filesystem, TemplateRenderer},
    domain::CodeTemplate,
    error::{SpliceError, SpliceResult},
};

/// What to do when the destination of a render already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingFile {
    #[default]
    Fail,
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateOutcome {
    Created,
    Overwritten,
    Skipped,
}

pub struct GenerateService {
    renderer: Box<dyn TemplateRenderer>,
    filesystem: Box<dyn Filesystem>,
}

impl GenerateService {
    pub fn new(renderer: Box<dyn TemplateRenderer>, filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            renderer,
            filesystem,
        }
    }

    /// Render `template` in memory, its registered imports exposed as `imports`.
    pub fn render(&self, template: &CodeTemplate) -> SpliceResult<String> {
        let context = template.render_context()?;
        self.renderer.render(template.body(), &context)
    }

    /// Render `template` and write it to `dest`.
    ///
    /// Nothing is written when rendering fails.
    #[instrument(skip_all, fields(dest = %dest.display(), ?policy))]
    pub fn generate(
        &self,
        template: &CodeTemplate,
        dest: &Path,
        policy: ExistingFile,
    ) -> SpliceResult<GenerateOutcome> {
        let exists = self.filesystem.exists(dest);
        match (exists, policy) {
            (true, ExistingFile::Skip) => {
                info!("destination exists, skipping");
                return Ok(GenerateOutcome::Skipped);
            }
            (true, ExistingFile::Fail) => {
                return Err(SpliceError::InvalidRequest {
                    reason: format!("{} already exists", dest.display()),
                });
            }
            _ => {}
        }

        let output = self.render(template)?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(dest, &output)?;

        let outcome = if exists {
            GenerateOutcome::Overwritten
        } else {
            GenerateOutcome::Created
        };
        info!(?outcome, bytes = output.len(), "template rendered");
        Ok(outcome)
    }
}
