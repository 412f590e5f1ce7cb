//! Implementation of the `splice config` command.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(config, &key)?;
            if output.is_json() {
                output.json(&serde_json::json!({ "key": key, "value": value }))?;
            } else {
                output.print(&format!("{key} = {value}"))?;
            }
        }

        ConfigCommands::List => {
            if output.is_json() {
                output.json(config)?;
                return Ok(());
            }
            output.header("Current Configuration:")?;
            let serialised =
                toml::to_string_pretty(config).map_err(|e| CliError::ConfigError {
                    message: format!("Failed to serialise config: {e}"),
                    source: Some(Box::new(e)),
                })?;
            output.print(serialised.trim_end())?;
        }

        ConfigCommands::Path => {
            let path = config.origin.clone().unwrap_or_else(AppConfig::config_path);
            output.print(&path.display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    match key {
        "source.module_marker" => Ok(config.source.module_marker.clone()),
        "snapshot.ignore" => Ok(config.snapshot.ignore.join(",")),
        "normalize.enabled" => Ok(config.normalize.enabled.to_string()),
        "normalize.rustfmt" => Ok(config.normalize.rustfmt.display().to_string()),
        "normalize.edition" => Ok(config.normalize.edition.clone()),
        "output.no_color" => Ok(config.output.no_color.to_string()),
        "log.file" => Ok(config
            .log
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()),
        _ => Err(CliError::ConfigError {
            message: format!("Unknown config key: '{key}'"),
            source: None,
        }),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn get_known_key() {
        let cfg = AppConfig::default();
        assert_eq!(get_config_value(&cfg, "normalize.edition").unwrap(), "2024");
        assert_eq!(get_config_value(&cfg, "snapshot.ignore").unwrap(), "target");
        assert_eq!(get_config_value(&cfg, "log.file").unwrap(), "");
    }

    #[test]
    fn get_unknown_key_is_error() {
        let cfg = AppConfig::default();
        assert!(matches!(
            get_config_value(&cfg, "does.not.exist"),
            Err(CliError::ConfigError { .. })
        ));
    }

    #[test]
    fn get_no_color_default() {
        let cfg = AppConfig::default();
        assert_eq!(get_config_value(&cfg, "output.no_color").unwrap(), "false");
    }

    #[test]
    fn defaults_serialise_to_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(text.contains("[normalize]"));
        assert!(text.contains("module_marker = \"Cargo.toml\""));
    }
}
