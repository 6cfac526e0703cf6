//! Integration tests for the CLI: apply, validate, context, guide.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to create a workspace with one Python file.
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.py"),
        "def handler():\n    return 1\n",
    )
    .unwrap();
    dir
}

fn write_changes(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("changes.json");
    fs::write(&path, json).unwrap();
    path
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_apply_help() {
    let output = run_cli(&["apply", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Apply a change list to a workspace"));
}

#[test]
fn test_apply_replace() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"{"message": "fix return value", "changes": [{
            "action": "replace",
            "file": "app.py",
            "search": "    return 1",
            "replace": "    return 2"
        }]}"#,
    );

    let output = run_cli(&[
        "apply",
        changes.to_str().unwrap(),
        "--workspace",
        workspace.path().to_str().unwrap(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Updated app.py"));
    assert!(stdout.contains("Summary:"));

    let content = fs::read_to_string(workspace.path().join("app.py")).unwrap();
    assert_eq!(content, "def handler():\n    return 2\n");
}

#[test]
fn test_apply_dry_run_leaves_files_untouched() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"[{"action": "write", "file": "app.py", "content": "clobbered"}]"#,
    );

    let output = run_cli(&[
        "apply",
        changes.to_str().unwrap(),
        "--workspace",
        workspace.path().to_str().unwrap(),
        "--dry-run",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would update app.py"));

    let content = fs::read_to_string(workspace.path().join("app.py")).unwrap();
    assert_eq!(content, "def handler():\n    return 1\n");
}

#[test]
fn test_apply_delete_file() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"[{"action": "delete_file", "file": "app.py"}]"#,
    );

    let output = run_cli(&[
        "apply",
        changes.to_str().unwrap(),
        "--workspace",
        workspace.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert!(!workspace.path().join("app.py").exists());
}

#[test]
fn test_apply_reports_missed_anchor() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"[{"action": "erase", "file": "app.py", "search": "no such code"}]"#,
    );

    let output = run_cli(&[
        "apply",
        changes.to_str().unwrap(),
        "--workspace",
        workspace.path().to_str().unwrap(),
    ]);

    // A missed anchor is non-fatal: the file is still pushed unchanged.
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("anchor not found"));
}

#[test]
fn test_validate_flags_malformed_operations() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"[
            {"action": "replace", "file": "app.py", "search": "a", "replace": "b"},
            {"action": "write", "file": "app.py"}
        ]"#,
    );

    let output = run_cli(&["validate", changes.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required field 'content'"));
}

#[test]
fn test_validate_accepts_clean_list() {
    let workspace = setup_workspace();
    let changes = write_changes(
        &workspace,
        r#"[{"action": "erase", "file": "app.py", "search": "    return 1"}]"#,
    );

    let output = run_cli(&["validate", changes.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 operations OK"));
}

#[test]
fn test_context_renders_numbered_lines() {
    let workspace = setup_workspace();

    let output = run_cli(&[
        "context",
        "--workspace",
        workspace.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- FILE: app.py ---"));
    assert!(stdout.contains("1 | def handler():"));
    assert!(stdout.contains("2 |     return 1"));
}

#[test]
fn test_guide_prints_operation_catalogue() {
    let output = run_cli(&["guide"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("REPLACE"));
    assert!(stdout.contains("delete_file"));
}
