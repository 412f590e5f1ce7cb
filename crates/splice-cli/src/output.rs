//! Output management and formatting.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use splice_core::domain::{ChangeKind, SnapshotDiff};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if args.output_format == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            args.output_format
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }
    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Changed-file report, one `A`/`M`/`D` line per path.
    ///
    /// Written even in quiet mode: the report is what `--diff` asked for.
    pub fn diff(&self, diff: &SnapshotDiff) -> io::Result<()> {
        if self.is_json() {
            return self.json(diff);
        }
        for (kind, path) in diff.entries() {
            let line = format!("{} {}", kind.marker(), path);
            let line = if self.no_color {
                line
            } else {
                match kind {
                    ChangeKind::Added => line.green().to_string(),
                    ChangeKind::Modified => line.yellow().to_string(),
                    ChangeKind::Deleted => line.red().to_string(),
                }
            };
            self.term.write_line(&line)?;
        }
        Ok(())
    }

    /// Pretty-printed JSON document on stdout.  Not suppressed in quiet
    /// mode, since scripts asked for it.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }

    pub fn is_json(&self) -> bool {
        self.format() == OutputFormat::Json
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::AppConfig;

    fn make_manager(quiet: bool, format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            quiet,
            no_color: false,
            output_format: format,
            ..GlobalArgs::for_tests()
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
        assert!(out.quiet);
    }

    #[test]
    fn colour_only_for_human_format() {
        assert!(!make_manager(false, OutputFormat::Human).no_color);
        assert!(make_manager(false, OutputFormat::Plain).no_color);
        assert!(make_manager(false, OutputFormat::Json).no_color);
    }

    #[test]
    fn config_no_color_wins() {
        let args = GlobalArgs {
            no_color: false,
            output_format: OutputFormat::Human,
            ..GlobalArgs::for_tests()
        };
        let mut config = AppConfig::default();
        config.output.no_color = true;
        assert!(OutputManager::new(&args, &config).no_color);
    }

    #[test]
    fn format_accessor_returns_resolved() {
        let out = make_manager(false, OutputFormat::Json);
        assert_eq!(out.format(), OutputFormat::Json);
        assert!(out.is_json());
    }

    #[test]
    fn writes_diff_and_json() {
        let out = make_manager(false, OutputFormat::Plain);
        let diff = SnapshotDiff {
            added: vec!["src/a.rs".into()],
            changed: vec!["src/lib.rs".into()],
            deleted: vec![],
        };
        assert!(out.diff(&diff).is_ok());
        assert!(out.json(&diff).is_ok());
    }
}
