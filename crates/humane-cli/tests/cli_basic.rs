//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli_with_input(dir: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_humane"))
        .args(args)
        .env("HUMANE_DATA_DIR", dir)
        .env_remove("HUMANE_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(dir, args, "")
}

fn run_cli_success(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&run_cli_success(dir, args)).expect("Failed to parse JSON output")
}

fn add_habit(dir: &Path, name: &str, category: &str, target: &str) -> String {
    let out = run_cli_success(
        dir,
        &["habit", "add", name, "--category", category, "--target", target],
    );
    out.lines()
        .next()
        .and_then(|l| l.strip_prefix("Habit created: "))
        .expect("missing habit id")
        .to_string()
}

#[test]
fn test_habit_add_and_list() {
    let dir = TempDir::new().unwrap();
    let id = add_habit(dir.path(), "Walk", "mobility", "3");

    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    let habits = habits.as_array().unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0]["id"], id.as_str());
    assert_eq!(habits[0]["category"], "mobility");
    assert_eq!(habits[0]["user_id"], "anonymous");
}

#[test]
fn test_habit_add_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["habit", "add", "Walk", "--category", "fitness"]);
    assert_ne!(code, 0);
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["habit", "add", "Walk", "--category", "joy", "--target", "9"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_habit_add_with_nonce_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let args = ["habit", "add", "Yoga", "--category", "mobility", "--nonce", "n-1"];
    let first = run_cli_success(dir.path(), &args);
    let second = run_cli_success(dir.path(), &args);
    assert_eq!(first.lines().next(), second.lines().next());
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert_eq!(habits.as_array().unwrap().len(), 1);
}

#[test]
fn test_habit_update_and_rm() {
    let dir = TempDir::new().unwrap();
    let id = add_habit(dir.path(), "Walk", "mobility", "3");
    run_cli_success(dir.path(), &["habit", "update", &id, "--name", "Long walk", "--target", "4"]);
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert_eq!(habits[0]["name"], "Long walk");
    assert_eq!(habits[0]["target_per_week"], 4);

    let out = run_cli_success(dir.path(), &["habit", "rm", &id]);
    assert!(out.contains("Habit deleted"));
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert!(habits.as_array().unwrap().is_empty());
}

#[test]
fn test_seed_then_status() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(dir.path(), &["habit", "seed"]);
    assert!(out.starts_with("Seeded"));
    let out = run_cli_success(dir.path(), &["habit", "seed"]);
    assert!(out.contains("nothing seeded"));

    let dash = run_json(dir.path(), &["status", "--date", "2025-11-24", "--json"]);
    assert_eq!(dash["sections"].as_array().unwrap().len(), 5);
    assert_eq!(dash["sections"][0]["category"], "mobility");
    assert_eq!(dash["summary"]["total"], 11);

    let text = run_cli_success(dir.path(), &["status", "--date", "2025-11-24"]);
    assert!(text.contains("Week of 2025-11-24"));
    assert!(text.contains("Mobility"));
}

#[test]
fn test_entry_cycle() {
    let dir = TempDir::new().unwrap();
    let id = add_habit(dir.path(), "Walk", "mobility", "3");

    let out = run_cli_success(dir.path(), &["entry", "cycle", &id]);
    assert!(out.contains("none -> 1"), "{out}");
    let out = run_cli_success(dir.path(), &["entry", "cycle", &id]);
    assert!(out.contains("1 -> 2"), "{out}");

    let entries = run_json(dir.path(), &["entry", "list", "--json"]);
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["value"], 2.0);
}

#[test]
fn test_entry_cycle_historical_needs_confirmation() {
    let dir = TempDir::new().unwrap();
    let id = add_habit(dir.path(), "Walk", "mobility", "3");

    let (stdout, _, code) =
        run_cli_with_input(dir.path(), &["entry", "cycle", &id, "--date", "2020-01-06"], "n\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("unchanged"), "{stdout}");

    let (stdout, _, code) =
        run_cli_with_input(dir.path(), &["entry", "cycle", &id, "--date", "2020-01-06"], "y\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("none -> 1"), "{stdout}");

    let out = run_cli_success(dir.path(), &["entry", "cycle", &id, "--date", "2020-01-06", "--yes"]);
    assert!(out.contains("1 -> 2"), "{out}");
}

#[test]
fn test_entry_cycle_unknown_habit_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["entry", "cycle", "missing"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn test_signin_abandon_and_signout() {
    let dir = TempDir::new().unwrap();
    add_habit(dir.path(), "Walk", "mobility", "3");

    let out = run_cli_success(dir.path(), &["signin", "alice", "--choice", "abandon"]);
    assert!(out.contains("Removed 1 local habits"), "{out}");
    assert!(out.contains("Signed in as alice"));
    assert_eq!(run_cli_success(dir.path(), &["config", "get", "session.user_id"]).trim(), "alice");
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert!(habits.as_array().unwrap().is_empty());

    run_cli_success(dir.path(), &["signout"]);
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert!(habits.as_array().unwrap().is_empty());
}

#[test]
fn test_signin_merge_copies_local_data() {
    let dir = TempDir::new().unwrap();
    let id = add_habit(dir.path(), "Walk", "mobility", "3");
    run_cli_success(dir.path(), &["entry", "cycle", &id]);

    let (stdout, _, code) = run_cli_with_input(dir.path(), &["signin", "bob"], "m\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Merged 1 habits and 1 entries"), "{stdout}");
    let habits = run_json(dir.path(), &["habit", "list", "--json"]);
    assert_eq!(habits[0]["user_id"], "bob");
    assert_eq!(habits[0]["name"], "Walk");
}

#[test]
fn test_signin_cancel_on_eof() {
    let dir = TempDir::new().unwrap();
    add_habit(dir.path(), "Walk", "mobility", "3");

    let (stdout, _, code) = run_cli_with_input(dir.path(), &["signin", "carol"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("cancelled"), "{stdout}");
    assert_eq!(run_cli_success(dir.path(), &["config", "get", "session.user_id"]).trim(), "null");
}

#[test]
fn test_signin_as_anonymous_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["signin", "anonymous"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not a valid account"), "{stderr}");
}

#[test]
fn test_config_set_and_toggle() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "tracker.confirm_historical_edits", "false"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "tracker.confirm_historical_edits"]).trim(),
        "false"
    );
    let out = run_cli_success(dir.path(), &["config", "toggle-section", "joy"]);
    assert_eq!(out.trim(), "Joy & Play collapsed");
    let out = run_cli_success(dir.path(), &["config", "toggle-section", "joy"]);
    assert_eq!(out.trim(), "Joy & Play expanded");
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "tracker.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_backup_merge_and_import() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("backup.json");
    std::fs::write(
        &file,
        r#"{
            "version": 1,
            "habits": [
                {"id": "tgu", "name": "TGU", "category": "strength", "targetPerWeek": 3},
                {"id": "tgu-l", "name": "TGU-L", "category": "strength", "targetPerWeek": 2}
            ],
            "entries": [
                {"id": "e1", "habitId": "tgu", "date": "2025-11-28", "value": 2},
                {"id": "e2", "habitId": "tgu-l", "date": "2025-11-28", "value": 4},
                {"id": "e3", "habitId": "tgu-l", "date": "2025-11-26", "value": 1}
            ]
        }"#,
    )
    .unwrap();

    let stats = run_json(dir.path(), &["backup", "list", file.to_str().unwrap(), "--json"]);
    assert_eq!(stats[0]["category"], "strength");
    assert_eq!(stats[0]["total_target"], 5);

    let merged_file = dir.path().join("merged.json");
    run_cli_success(
        dir.path(),
        &[
            "backup",
            "merge",
            file.to_str().unwrap(),
            "--into",
            "tgu",
            "--from",
            "tgu-l",
            "-o",
            merged_file.to_str().unwrap(),
        ],
    );
    let merged: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&merged_file).unwrap()).unwrap();
    assert_eq!(merged["habits"].as_array().unwrap().len(), 1);
    assert_eq!(merged["entries"].as_array().unwrap().len(), 2);

    let report = run_json(dir.path(), &["backup", "import", merged_file.to_str().unwrap()]);
    assert_eq!(report["habits_created"], 1);
    assert_eq!(report["entries_written"], 2);

    let exported = run_json(dir.path(), &["backup", "export"]);
    assert_eq!(exported["habits"][0]["name"], "TGU");
    assert_eq!(exported["entries"].as_array().unwrap().len(), 2);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(dir.path(), &["completions", "bash"]);
    assert!(out.contains("humane"));
}
