//! Integration tests for splice-cli.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HANDLER: &str = r#"use serde_json as json;

pub struct UserHandler {
    pub name: String,
}

impl UserHandler {
    pub fn name(&self) -> &str {
        &self.name
    }

    // Persists the user as JSON.
    pub fn save(&self) -> Result<String, json::Error> {
        json::to_string(&self.name)
    }
}
"#;

fn splice(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("splice").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env("SPLICE_NORMALIZE__ENABLED", "false");
    cmd
}

fn crate_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"user-api\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();
    fs::write(root.join("src/lib.rs"), "pub mod handler_user;\n").unwrap();
    fs::write(root.join("src/handler_user.rs"), HANDLER).unwrap();
    temp
}

fn write_template(root: &Path) {
    fs::write(
        root.join("model.rs.j2"),
        "{% for i in imports %}{{ i.use_line }}\n{% endfor %}pub struct {{ name | pascal_case }};\n",
    )
    .unwrap();
}

// ── basics ────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_commands() {
    let temp = TempDir::new().unwrap();
    splice(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("--diff"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    splice(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ── render ────────────────────────────────────────────────────────────────────

#[test]
fn render_writes_file_with_imports() {
    let temp = crate_dir();
    write_template(temp.path());

    splice(temp.path())
        .args([
            "render",
            "--template",
            "model.rs.j2",
            "--out",
            "src/handler.rs",
            "--var",
            "name=user_handler",
            "--import",
            "serde_json=json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created src/handler.rs"));

    let written = fs::read_to_string(temp.path().join("src/handler.rs")).unwrap();
    assert_eq!(written, "use serde_json as json;\npub struct UserHandler;\n");
}

#[test]
fn render_existing_destination_policies() {
    let temp = crate_dir();
    write_template(temp.path());
    let args = [
        "render",
        "--template",
        "model.rs.j2",
        "--out",
        "src/lib.rs",
        "--var",
        "name=x",
    ];

    splice(temp.path())
        .args(args)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    splice(temp.path())
        .args(args)
        .args(["--if-exists", "skip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/lib.rs")).unwrap(),
        "pub mod handler_user;\n"
    );

    splice(temp.path())
        .args(args)
        .args(["--if-exists", "overwrite"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp.path().join("src/lib.rs")).unwrap(),
        "pub struct X;\n"
    );
}

#[test]
fn render_reads_toml_variables() {
    let temp = crate_dir();
    write_template(temp.path());
    fs::write(temp.path().join("vars.toml"), "name = \"session_store\"\n").unwrap();

    splice(temp.path())
        .args([
            "render",
            "-t",
            "model.rs.j2",
            "-o",
            "src/session.rs",
            "--vars",
            "vars.toml",
        ])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp.path().join("src/session.rs")).unwrap(),
        "pub struct SessionStore;\n"
    );
}

#[test]
fn render_with_diff_reports_added_file() {
    let temp = crate_dir();
    write_template(temp.path());

    splice(temp.path())
        .args([
            "--diff",
            "render",
            "-t",
            "model.rs.j2",
            "-o",
            "src/session.rs",
            "--var",
            "name=session",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("A src/session.rs"))
        .stdout(predicate::str::contains("M ").not());
}

// ── insert / import ───────────────────────────────────────────────────────────

#[test]
fn insert_is_idempotent() {
    let temp = crate_dir();
    let app = temp.path().join("src/app.rs");
    fs::write(&app, "pub struct App {\n    db: Pool,\n    mux: Router,\n}\n").unwrap();
    let args = [
        "insert",
        "--file",
        "src/app.rs",
        "--pattern",
        "mux: Router,",
        "--lines",
        "    cfg: Config,",
    ];

    splice(temp.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("at line 4"));

    splice(temp.path())
        .args(args)
        .args(["--output-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\": \"already_present\""));

    assert_eq!(
        fs::read_to_string(&app).unwrap(),
        "pub struct App {\n    db: Pool,\n    mux: Router,\n    cfg: Config,\n}\n"
    );
}

#[test]
fn insert_with_missing_anchor_changes_nothing() {
    let temp = crate_dir();
    splice(temp.path())
        .args([
            "insert",
            "-f",
            "src/lib.rs",
            "-p",
            "pub mod nothing_here;",
            "-l",
            "pub mod session;",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Anchor not found"));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/lib.rs")).unwrap(),
        "pub mod handler_user;\n"
    );
}

#[test]
fn import_adds_use_once() {
    let temp = crate_dir();
    let args = [
        "import",
        "--file",
        "src/lib.rs",
        "--path",
        "std::collections::HashMap",
    ];

    splice(temp.path()).args(args).assert().success();
    splice(temp.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("already imports"));

    let lib = fs::read_to_string(temp.path().join("src/lib.rs")).unwrap();
    assert_eq!(lib.matches("use std::collections::HashMap;").count(), 1);
}

// ── extract / find ────────────────────────────────────────────────────────────

#[test]
fn extract_method_into_new_file() {
    let temp = crate_dir();
    splice(temp.path())
        .args([
            "extract",
            "method",
            "--receiver",
            "UserHandler",
            "--name",
            "save",
            "--from",
            "src/handler_user.rs",
            "--to",
            "handler_user_save.rs",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved save"));

    let dest = fs::read_to_string(temp.path().join("src/handler_user_save.rs")).unwrap();
    assert!(dest.contains("use serde_json as json;"));
    assert!(dest.contains("pub fn save(&self)"));
    let source = fs::read_to_string(temp.path().join("src/handler_user.rs")).unwrap();
    assert!(!source.contains("fn save"));
    let lib = fs::read_to_string(temp.path().join("src/lib.rs")).unwrap();
    assert!(lib.contains("mod handler_user_save;"));
}

#[test]
fn find_outputs_json() {
    let temp = crate_dir();
    splice(temp.path())
        .args([
            "find",
            "--dir",
            "src",
            "--pattern",
            "Handler$",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"UserHandler\""))
        .stdout(predicate::str::contains("\"package_path\": \"user_api\""));
}

#[test]
fn find_table_names_root() {
    let temp = crate_dir();
    splice(temp.path())
        .args(["find", "-d", "src", "-p", "^User", "-r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Declarations in user_api:"))
        .stdout(predicate::str::contains("UserHandler"));
}

// ── exec ──────────────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn exec_reports_generated_files() {
    let temp = crate_dir();
    splice(temp.path())
        .args([
            "exec",
            "--",
            "sh",
            "-c",
            "printf 'pub fn generated() {}\\n' > src/gen.rs && printf 'pub mod gen;\\n' >> src/lib.rs",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("A src/gen.rs"))
        .stdout(predicate::str::contains("M src/lib.rs"));
}

// ── config ────────────────────────────────────────────────────────────────────

#[test]
fn config_get_reads_environment_override() {
    let temp = TempDir::new().unwrap();
    splice(temp.path())
        .env("SPLICE_SOURCE__MODULE_MARKER", "Workspace.toml")
        .args(["config", "get", "source.module_marker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("source.module_marker = Workspace.toml"));
}

#[test]
fn config_list_reads_local_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("splice.toml"),
        "[snapshot]\nignore = [\"target\", \"dist\"]\n",
    )
    .unwrap();

    splice(temp.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[normalize]"))
        .stdout(predicate::str::contains("dist"));

    splice(temp.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("splice.toml"));
}
