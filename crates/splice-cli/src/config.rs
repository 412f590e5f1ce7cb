//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by reference.
//! The CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `SPLICE_` environment variables, `__` between key segments
//!    (`SPLICE_NORMALIZE__EDITION=2021`)
//! 3. Config file: `--config`, else `./splice.toml`, else the per-user file
//! 4. Built-in defaults (always present)

use std::path::PathBuf;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use splice_adapters::normalizer::DEFAULT_EDITION;
use splice_core::source::DEFAULT_MODULE_MARKER;

/// Project-local config file, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "splice.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SPLICE";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Package model settings.
    pub source: SourceConfig,
    /// Tree snapshot settings.
    pub snapshot: SnapshotConfig,
    /// Post-generation normalisation.
    pub normalize: NormalizeConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Log file settings.
    pub log: LogConfig,
    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// File name marking a module root.
    pub module_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            module_marker: DEFAULT_MODULE_MARKER.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory names skipped in addition to VCS metadata.
    pub ignore: Vec<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            ignore: vec!["target".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub enabled: bool,
    pub rustfmt: PathBuf,
    pub edition: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rustfmt: PathBuf::from("rustfmt"),
            edition: DEFAULT_EDITION.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Also write log events to this file.
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the first config file found plus `SPLICE_`
    /// environment overrides, on top of the built-in defaults.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// only used when present.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let origin = match config_file {
            Some(path) => Some(path.clone()),
            None => Self::discover(),
        };

        let mut builder = Config::builder();
        if let Some(path) = &origin {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("snapshot.ignore")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder
            .build()
            .with_context(|| match &origin {
                Some(path) => format!("failed to read configuration from {}", path.display()),
                None => "failed to read configuration from the environment".to_string(),
            })?
            .try_deserialize()
            .context("invalid configuration")?;
        config.origin = origin;
        Ok(config)
    }

    /// Path to the per-user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `splice.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "splice", "splice")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    fn discover() -> Option<PathBuf> {
        [PathBuf::from(LOCAL_CONFIG_FILE), Self::config_path()]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}
