use std::path::Path;
use std::process::{Command, Output};

use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn run_trellis(repo_root: &Path, args: &[&str]) -> Output {
    let binary = assert_cmd::cargo::cargo_bin!("trellis");
    let mut cmd = Command::new(binary);
    cmd.current_dir(repo_root);
    cmd.arg("--format").arg("json");
    cmd.args(args);
    cmd.output().expect("trellis command executes")
}

fn run_trellis_ok(repo_root: &Path, args: &[&str]) -> Output {
    let output = run_trellis(repo_root, args);
    assert!(
        output.status.success(),
        "trellis {:?} failed:\nstdout:\n{}\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn run_trellis_json(repo_root: &Path, args: &[&str]) -> Value {
    let output = run_trellis_ok(repo_root, args);
    serde_json::from_slice(&output.stdout).expect("valid json stdout")
}

fn run_trellis_err_json(repo_root: &Path, args: &[&str]) -> Value {
    let output = run_trellis(repo_root, args);
    assert!(
        !output.status.success(),
        "expected trellis {:?} to fail, but it succeeded:\nstdout:\n{}\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    let json_line = stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    serde_json::from_str(json_line).expect("valid json error line in stderr")
}

fn create_task(repo_root: &Path, args: &[&str]) -> String {
    let mut full = vec!["create"];
    full.extend_from_slice(args);
    let task = run_trellis_json(repo_root, &full);
    task.get("id")
        .and_then(Value::as_str)
        .expect("task id")
        .to_string()
}

#[test]
fn init_create_show_round_trip() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();

    run_trellis_ok(repo_root, &["init"]);
    let id = create_task(repo_root, &["Write the docs", "-d", "All of them"]);
    assert_eq!(id, "1");

    let shown = run_trellis_json(repo_root, &["show", "1"]);
    assert_eq!(shown["title"], "Write the docs");
    assert_eq!(shown["description"], "All of them");
    assert_eq!(shown["status"], "pending");
}

#[test]
fn init_twice_fails_with_code() {
    let dir = tempdir().unwrap();
    run_trellis_ok(dir.path(), &["init"]);
    let err = run_trellis_err_json(dir.path(), &["init"]);
    assert_eq!(err["error"], "already_initialized");
}

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = tempdir().unwrap();
    let err = run_trellis_err_json(dir.path(), &["list"]);
    assert_eq!(err["error"], "not_initialized");
}

#[test]
fn children_get_dotted_ids_and_tree_nests_them() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);

    create_task(repo_root, &["epic"]);
    let child = create_task(repo_root, &["step", "--parent", "1"]);
    assert_eq!(child, "1.1");

    let forest = run_trellis_json(repo_root, &["tree"]);
    let roots = forest.as_array().expect("array of roots");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["children"][0]["id"], "1.1");
}

#[test]
fn next_respects_dependencies() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);

    create_task(repo_root, &["gate"]);
    create_task(repo_root, &["gated", "--depends-on", "1"]);

    let next = run_trellis_json(repo_root, &["next"]);
    assert_eq!(next["id"], "1");

    run_trellis_ok(repo_root, &["status", "1", "done"]);
    let next = run_trellis_json(repo_root, &["next"]);
    assert_eq!(next["id"], "2");

    run_trellis_ok(repo_root, &["status", "2", "done"]);
    let output = run_trellis_ok(repo_root, &["next"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "null");
}

#[test]
fn unknown_status_is_a_validation_error() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["t"]);

    let err = run_trellis_err_json(repo_root, &["status", "1", "bogus"]);
    assert_eq!(err["error"], "validation_error");

    // The rejected write must not have disturbed the task.
    let shown = run_trellis_json(repo_root, &["show", "1"]);
    assert_eq!(shown["status"], "pending");
}

#[test]
fn dependency_cycle_is_rejected() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["a"]);
    create_task(repo_root, &["b", "--depends-on", "1"]);

    let err = run_trellis_err_json(repo_root, &["depend", "1", "--on", "2"]);
    assert_eq!(err["error"], "validation_error");
}

#[test]
fn delete_with_children_needs_recursive() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["parent"]);
    create_task(repo_root, &["child", "--parent", "1"]);

    let err = run_trellis_err_json(repo_root, &["delete", "1"]);
    assert_eq!(err["error"], "validation_error");

    let deleted = run_trellis_json(repo_root, &["delete", "1", "--recursive"]);
    let ids: Vec<&str> = deleted["deleted"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1.1", "1"]);
}

#[test]
fn move_mints_a_new_id_under_the_target() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["from"]);
    create_task(repo_root, &["to"]);
    create_task(repo_root, &["wanderer", "--parent", "1"]);

    let moved = run_trellis_json(repo_root, &["move", "1.1", "--to", "2"]);
    assert_eq!(moved["id"], "2.1");

    let err = run_trellis_err_json(repo_root, &["show", "1.1"]);
    assert_eq!(err["error"], "not_found");
}

#[test]
fn list_filters_by_status_and_readiness() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["a"]);
    create_task(repo_root, &["b", "--depends-on", "1"]);
    run_trellis_ok(repo_root, &["status", "1", "in_progress"]);

    let in_progress = run_trellis_json(repo_root, &["list", "--status", "in_progress"]);
    assert_eq!(in_progress.as_array().unwrap().len(), 1);

    let ready = run_trellis_json(repo_root, &["list", "--ready"]);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    // "b" waits on "a"; "a" itself is still ready (not done).
    assert_eq!(ids, vec!["1"]);
}

#[test]
fn custom_fields_round_trip_and_reserved_names_are_refused() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["t", "--field", "owner=ana"]);

    let shown = run_trellis_json(repo_root, &["show", "1"]);
    assert_eq!(shown["custom"]["owner"], "ana");

    let err = run_trellis_err_json(repo_root, &["edit", "1", "--field", "created_at=now"]);
    assert_eq!(err["error"], "validation_error");
}

#[test]
fn append_extends_the_description() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["t"]);

    run_trellis_ok(repo_root, &["append", "1", "first note"]);
    run_trellis_ok(repo_root, &["append", "1", "second note"]);

    let shown = run_trellis_json(repo_root, &["show", "1"]);
    assert_eq!(shown["description"], "first note\nsecond note");
}

#[test]
fn pretty_format_prints_human_output() {
    let dir = tempdir().unwrap();
    run_trellis_ok(dir.path(), &["init"]);
    create_task(dir.path(), &["Readable title"]);

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("trellis"))
        .current_dir(dir.path())
        .args(["--format", "pretty", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Readable title"));
}

#[test]
fn invalid_id_is_a_format_error() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);

    let err = run_trellis_err_json(repo_root, &["show", "1..2"]);
    assert_eq!(err["error"], "format_error");
}

#[test]
fn check_reports_and_repairs_a_torn_state() {
    let dir = tempdir().unwrap();
    let repo_root = dir.path();
    run_trellis_ok(repo_root, &["init"]);
    create_task(repo_root, &["kept"]);

    // Tear the stores apart by hand: a content record the index never saw.
    std::fs::write(
        repo_root.join(".trellis/tasks/7.json"),
        r#"{"title": "stray", "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let report = run_trellis_json(repo_root, &["check"]);
    assert_eq!(report["missing_entries"][0], "7");

    run_trellis_ok(repo_root, &["check", "--fix"]);
    let report = run_trellis_json(repo_root, &["check"]);
    assert!(report["missing_entries"].as_array().unwrap().is_empty());

    let shown = run_trellis_json(repo_root, &["show", "7"]);
    assert_eq!(shown["status"], "pending");
}
