//! Integration tests for the `ft` CLI.
//!
//! Each test initializes a temp project, runs `ft` as a subprocess, and
//! checks stdout and/or the task store on disk.

use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;

/// Run `ft` with the given args in the given directory, returning (stdout, stderr, success).
fn run_ft(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_ft"))
        .args(args)
        .current_dir(dir)
        .env_remove("FRACTAL_LOG")
        .output()
        .expect("failed to run ft");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `ft` expecting success, return stdout.
fn run_ft_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_ft(dir, args);
    if !success {
        panic!(
            "ft {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    serde_json::from_str(&run_ft_ok(dir, &full)).unwrap()
}

/// Life -> {Garden -> {Water}, Taxes}
fn garden_project(root: &Path) {
    run_ft_ok(root, &["init", "--name", "Life"]);
    run_ft_ok(root, &["add", "1", "Garden"]);
    run_ft_ok(root, &["add", "2", "Water", "-p", "3"]);
    run_ft_ok(root, &["add", "1", "Taxes"]);
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_project() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ft_ok(tmp.path(), &["init", "--name", "Life"]);
    assert_eq!(out.trim(), "Initialized fractal project: Life");
    assert!(tmp.path().join("fractal/config.toml").is_file());
    assert!(tmp.path().join("fractal/tasks.json").is_file());

    let tree = run_ft_ok(tmp.path(), &["tree"]);
    assert_eq!(tree.trim(), "[ ] Life  0%  #1 p1");
}

#[test]
fn test_init_infers_name_from_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().join("house-move_2026");
    fs::create_dir(&dir).unwrap();
    let out = run_ft_ok(&dir, &["init"]);
    assert_eq!(out.trim(), "Initialized fractal project: House Move 2026");
}

#[test]
fn test_init_twice_fails_without_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ft_ok(tmp.path(), &["init", "--name", "Life"]);
    let (_, stderr, success) = run_ft(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    run_ft_ok(tmp.path(), &["init", "--name", "Work", "--force"]);
    let tree = run_ft_ok(tmp.path(), &["tree"]);
    assert!(tree.contains("Work"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_ft(tmp.path(), &["tree"]);
    assert!(!success);
    assert!(stderr.starts_with("error: not a fractal project"));
}

// ---------------------------------------------------------------------------
// Tree and show
// ---------------------------------------------------------------------------

#[test]
fn test_tree_is_expanded_outline() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());
    run_ft_ok(tmp.path(), &["toggle", "4"]);

    let out = run_ft_ok(tmp.path(), &["tree"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "▾ [ ] Life  50%  #1 p1",
            "  ▾ [ ] Garden  0%  #2 p1",
            "      [ ] Water  0%  #3 p3",
            "    [x] Taxes  100%  #4 p1",
        ]
    );
}

#[test]
fn test_tree_fold_and_hoist() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let out = run_ft_ok(tmp.path(), &["tree", "--fold", "2"]);
    assert!(out.contains("▸ [ ] Garden"));
    assert!(!out.contains("Water"));

    let out = run_ft_ok(tmp.path(), &["tree", "--hoist", "2"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, vec!["▾ [ ] Garden  0%  #2 p1", "    [ ] Water  0%  #3 p3"]);

    let out = run_ft_ok(tmp.path(), &["tree", "--collapsed"]);
    assert_eq!(out.lines().count(), 1);

    let (_, stderr, success) = run_ft(tmp.path(), &["tree", "--hoist", "99"]);
    assert!(!success);
    assert!(stderr.contains("task not found: 99"));
}

#[test]
fn test_tree_json_has_styles_and_layout() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let value = json(tmp.path(), &["tree"]);
    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0]["id"], 1);
    assert_eq!(nodes[0]["emphasis"], "neutral");
    assert_eq!(value["edges"].as_array().unwrap().len(), 3);
    assert_eq!(value["layout"].as_array().unwrap().len(), 4);
    assert!(value.get("warnings").is_none());
}

#[test]
fn test_show_lists_path_and_children() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let out = run_ft_ok(tmp.path(), &["show", "2"]);
    assert!(out.starts_with("[ ] #2 Garden (p1)"));
    assert!(out.contains("progress: 0%"));
    assert!(out.contains("path: Life > Garden"));
    assert!(out.contains("children:\n  [ ] #3 Water (p3)"));

    let value = json(tmp.path(), &["show", "3"]);
    assert_eq!(value["title"], "Water");
    assert_eq!(value["percent"], 0);
    assert_eq!(value["ancestors"].as_array().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[test]
fn test_add_validates_parent_and_title() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ft_ok(tmp.path(), &["init", "--name", "Life"]);

    let out = run_ft_ok(tmp.path(), &["add", "1", "  Garden  ", "--deadline", "2026-05-01"]);
    assert_eq!(out.trim(), "added [ ] #2 Garden (p1) due 2026-05-01");

    let (_, stderr, success) = run_ft(tmp.path(), &["add", "42", "Orphan"]);
    assert!(!success);
    assert!(stderr.contains("parent task not found: 42"));

    let (_, stderr, success) = run_ft(tmp.path(), &["add", "1", "   "]);
    assert!(!success);
    assert!(stderr.contains("task title cannot be empty"));
}

#[test]
fn test_rename_priority_toggle() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let out = run_ft_ok(tmp.path(), &["rename", "3", "Water beds"]);
    assert_eq!(out.trim(), "updated [ ] #3 Water beds (p3)");

    let out = run_ft_ok(tmp.path(), &["priority", "3", "-2"]);
    assert_eq!(out.trim(), "updated [ ] #3 Water beds (p-2)");

    let out = run_ft_ok(tmp.path(), &["toggle", "3"]);
    assert_eq!(out.trim(), "done [x] #3 Water beds (p-2)");
    let out = run_ft_ok(tmp.path(), &["toggle", "3"]);
    assert_eq!(out.trim(), "reopened [ ] #3 Water beds (p-2)");
}

#[test]
fn test_delete_cascades_and_keeps_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let out = run_ft_ok(tmp.path(), &["delete", "2"]);
    assert_eq!(out.trim(), "deleted #2 and 1 task below it");

    let value = json(tmp.path(), &["delete", "4"]);
    assert_eq!(value["deleted"], serde_json::json!([4]));

    // ids are never reused
    let value = json(tmp.path(), &["add", "1", "Mow"]);
    assert_eq!(value["id"], 5);

    let log = fs::read_to_string(tmp.path().join("fractal/.recovery.log")).unwrap();
    assert!(log.contains("Water"));
}

#[test]
fn test_root_cannot_be_deleted() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());
    let (_, stderr, success) = run_ft(tmp.path(), &["delete", "1"]);
    assert!(!success);
    assert_eq!(stderr.trim(), "error: cannot delete root task 1");
}

// ---------------------------------------------------------------------------
// Leaves and choose
// ---------------------------------------------------------------------------

#[test]
fn test_leaves_grouped_by_parent() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let out = run_ft_ok(tmp.path(), &["leaves"]);
    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec!["Garden:", "  [ ] #3 Water (p3)", "", "Life:", "  [ ] #4 Taxes (p1)"]
    );

    run_ft_ok(tmp.path(), &["toggle", "3"]);
    run_ft_ok(tmp.path(), &["toggle", "4"]);
    let out = run_ft_ok(tmp.path(), &["leaves"]);
    assert_eq!(out.trim(), "nothing actionable");
}

#[test]
fn test_choose_picks_an_actionable_leaf() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let value = json(tmp.path(), &["choose"]);
    let id = value["id"].as_i64().unwrap();
    assert!(id == 3 || id == 4);
    assert!(value["score"].as_f64().unwrap() > 0.0);

    run_ft_ok(tmp.path(), &["toggle", "3"]);
    run_ft_ok(tmp.path(), &["toggle", "4"]);
    let out = run_ft_ok(tmp.path(), &["choose"]);
    assert_eq!(out.trim(), "nothing actionable");
    assert_eq!(json(tmp.path(), &["choose"]), serde_json::Value::Null);
}

// ---------------------------------------------------------------------------
// Project discovery
// ---------------------------------------------------------------------------

#[test]
fn test_project_dir_flag_and_nested_discovery() {
    let tmp = tempfile::TempDir::new().unwrap();
    garden_project(tmp.path());

    let nested = tmp.path().join("notes/2026");
    fs::create_dir_all(&nested).unwrap();
    let out = run_ft_ok(&nested, &["show", "1"]);
    assert!(out.starts_with("[ ] #1 Life"));

    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_str().unwrap();
    let out = run_ft_ok(elsewhere.path(), &["-C", dir, "leaves"]);
    assert!(out.contains("Water"));
}

#[test]
fn test_corrupt_store_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ft_ok(tmp.path(), &["init", "--name", "Life"]);
    fs::write(tmp.path().join("fractal/tasks.json"), "{ not json").unwrap();

    let (_, stderr, success) = run_ft(tmp.path(), &["tree"]);
    assert!(!success);
    assert!(stderr.contains("is not a valid task store"));
}
