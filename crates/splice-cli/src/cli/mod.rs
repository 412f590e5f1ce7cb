//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "splice",
    bin_name = "splice",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Source-aware code generation and refactoring",
    long_about = "Splice renders templates with alias-safe imports and edits \
                  existing Rust files in place: anchored insertion, import \
                  management and method/struct extraction.",
    after_help = "EXAMPLES:\n\
        \x20 splice render --template handler.rs.j2 --out src/handler_user.rs --var name=user\n\
        \x20 splice insert --file src/app.rs --pattern 'mux: Router,' --lines '    db: Pool,'\n\
        \x20 splice extract method --receiver UserHandler --name save --from src/handler_user.rs --to handler_user_save.rs\n\
        \x20 splice --diff exec -- sqlc generate",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a template into a new file.
    #[command(
        visible_alias = "r",
        about = "Render a template into a file",
        after_help = "EXAMPLES:\n\
            \x20 splice render --template model.rs.j2 --out src/user.rs --var name=User\n\
            \x20 splice render --template model.rs.j2 --out src/user.rs --vars user.toml --import serde_json=json\n\
            \x20 splice render --template model.rs.j2 --out src/user.rs --if-exists overwrite"
    )]
    Render(RenderArgs),

    /// Insert lines next to an anchor in an existing file.
    #[command(
        visible_alias = "i",
        about = "Insert lines relative to an anchor",
        after_help = "EXAMPLES:\n\
            \x20 splice insert --file src/app.rs --pattern 'mux: Router,' --lines '    db: Pool,'\n\
            \x20 splice insert --file src/lib.rs --pattern '^pub mod ' --regex --before --lines 'pub mod user;'"
    )]
    Insert(InsertArgs),

    /// Add a `use` declaration to an existing file.
    #[command(
        about = "Add an import to a file",
        after_help = "EXAMPLES:\n\
            \x20 splice import --file src/user.rs --path std::collections::HashMap\n\
            \x20 splice import --file src/user.rs --path serde_json --alias json"
    )]
    Import(ImportArgs),

    /// Move declarations between files.
    #[command(
        about = "Extract a method or struct into another file",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 splice extract method --receiver UserHandler --name save --from src/handler_user.rs --to handler_user_save.rs\n\
            \x20 splice extract struct --name Session --from src/lib.rs --to session.rs"
    )]
    Extract(ExtractCommands),

    /// Search a directory for type declarations.
    #[command(
        about = "Find type declarations by name pattern",
        after_help = "EXAMPLES:\n\
            \x20 splice find --dir src --pattern 'Handler$' --recursive\n\
            \x20 splice find --dir src/handlers --pattern '^User' --format json"
    )]
    Find(FindArgs),

    /// Run an external generator and report what it changed.
    #[command(
        about = "Run a command between tree snapshots",
        after_help = "EXAMPLES:\n\
            \x20 splice exec -- sqlc generate\n\
            \x20 splice --root crates/api exec -- cargo run --bin gen"
    )]
    Exec(ExecArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 splice completions bash > ~/.local/share/bash-completion/completions/splice\n\
            \x20 splice completions zsh  > ~/.zfunc/_splice\n\
            \x20 splice completions fish > ~/.config/fish/completions/splice.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Splice configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 splice config get normalize.edition\n\
            \x20 splice config list\n\
            \x20 splice config path"
    )]
    Config(ConfigCommands),
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `splice render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template body (Jinja syntax).
    #[arg(
        short = 't',
        long = "template",
        value_name = "FILE",
        help = "Template file to render"
    )]
    pub template: PathBuf,

    /// Destination file.
    #[arg(
        short = 'o',
        long = "out",
        value_name = "PATH",
        help = "File to write"
    )]
    pub out: PathBuf,

    /// String variable, repeatable.  Applied after `--vars`.
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_var,
        help = "Template variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// JSON or TOML file holding an object of variables.
    #[arg(
        long = "vars",
        value_name = "FILE",
        help = "Variables file (.json or .toml)"
    )]
    pub vars_file: Option<PathBuf>,

    /// Import registered with the template, repeatable.
    #[arg(
        long = "import",
        value_name = "PATH[=ALIAS]",
        value_parser = parse_import,
        help = "Import exposed to the template as `imports` (repeatable)"
    )]
    pub imports: Vec<(String, Option<String>)>,

    /// What to do when `--out` already exists.
    #[arg(
        long = "if-exists",
        value_enum,
        default_value = "fail",
        help = "Policy for an existing destination"
    )]
    pub if_exists: IfExists,
}

/// Policy for an existing render destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IfExists {
    Fail,
    Skip,
    Overwrite,
}

// ── insert ────────────────────────────────────────────────────────────────────

/// Arguments for `splice insert`.
#[derive(Debug, Args)]
pub struct InsertArgs {
    #[arg(short = 'f', long = "file", value_name = "PATH", help = "File to edit")]
    pub file: PathBuf,

    /// Anchor; a multi-line anchor must match consecutive lines.
    #[arg(
        short = 'p',
        long = "pattern",
        value_name = "PATTERN",
        help = "Anchor line(s) to insert next to"
    )]
    pub pattern: String,

    #[arg(
        short = 'l',
        long = "lines",
        value_name = "TEXT",
        help = "Line(s) to insert"
    )]
    pub lines: String,

    #[arg(long = "before", help = "Insert before the anchor instead of after")]
    pub before: bool,

    #[arg(long = "regex", help = "Treat each anchor line as a regular expression")]
    pub regex: bool,
}

// ── import ────────────────────────────────────────────────────────────────────

/// Arguments for `splice import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(short = 'f', long = "file", value_name = "PATH", help = "File to edit")]
    pub file: PathBuf,

    #[arg(
        short = 'p',
        long = "path",
        value_name = "PATH",
        help = "Import path, e.g. std::collections::HashMap"
    )]
    pub path: String,

    #[arg(short = 'a', long = "alias", value_name = "ALIAS", help = "Alias for the import")]
    pub alias: Option<String>,
}

// ── extract ───────────────────────────────────────────────────────────────────

/// Subcommands for `splice extract`.
#[derive(Debug, Subcommand)]
pub enum ExtractCommands {
    /// Move one method of an inherent impl.
    Method(ExtractMethodArgs),
    /// Move a struct and every method of its inherent impls.
    Struct(ExtractStructArgs),
}

#[derive(Debug, Args)]
pub struct ExtractMethodArgs {
    #[arg(long = "receiver", value_name = "TYPE", help = "Type the method is implemented on")]
    pub receiver: String,

    #[arg(long = "name", value_name = "METHOD", help = "Method to move")]
    pub name: String,

    #[arg(long = "from", value_name = "FILE", help = "Source file")]
    pub from: PathBuf,

    /// Resolved relative to the source file's directory.
    #[arg(long = "to", value_name = "FILE", help = "Destination file name")]
    pub to: String,
}

#[derive(Debug, Args)]
pub struct ExtractStructArgs {
    #[arg(long = "name", value_name = "TYPE", help = "Struct to move")]
    pub name: String,

    #[arg(long = "from", value_name = "FILE", help = "Source file")]
    pub from: PathBuf,

    /// Resolved relative to the source file's directory.
    #[arg(long = "to", value_name = "FILE", help = "Destination file name")]
    pub to: String,
}

// ── find ──────────────────────────────────────────────────────────────────────

/// Arguments for `splice find`.
#[derive(Debug, Args)]
pub struct FindArgs {
    #[arg(short = 'd', long = "dir", value_name = "DIR", help = "Directory to load")]
    pub dir: PathBuf,

    #[arg(
        short = 'p',
        long = "pattern",
        value_name = "REGEX",
        help = "Regular expression matched against declaration names"
    )]
    pub pattern: String,

    #[arg(short = 'r', long = "recursive", help = "Include subdirectories")]
    pub recursive: bool,

    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: FindFormat,
}

/// Output format for the `find` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FindFormat {
    /// Human-readable table.
    Table,
    /// JSON array.
    Json,
}

// ── exec ──────────────────────────────────────────────────────────────────────

/// Arguments for `splice exec`.
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Program and its arguments, after `--`.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command to run"
    )]
    pub command: Vec<String>,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `splice completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `splice config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `normalize.edition`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── value parsers ─────────────────────────────────────────────────────────────

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_import(raw: &str) -> Result<(String, Option<String>), String> {
    let (path, alias) = match raw.split_once('=') {
        Some((path, alias)) => (path.trim(), Some(alias.trim())),
        None => (raw.trim(), None),
    };
    if path.is_empty() {
        return Err(format!("empty import path in '{raw}'"));
    }
    Ok((path.to_string(), alias.filter(|a| !a.is_empty()).map(str::to_string)))
}

// ── tests ─────────────────────────────────────────────────────────────────────
