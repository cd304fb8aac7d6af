//! Integration tests for the hydro binary.
//!
//! These tests verify end-to-end behavior including:
//! - The profile dialogue and goal derivation
//! - Water, food and workout logging
//! - Snapshot persistence across runs
//! - Replay of multi-user scripts

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Config with a local food table so offline runs can log food
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        r#"
[weather]
fallback_celsius = 20.0

[food.local]
banana = 89.0
"#,
    )
    .expect("Failed to write config");
    path
}

/// Helper to get the CLI, offline, rooted in the temp dir
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hydro"));
    cmd.arg("--offline")
        .arg("--data-dir")
        .arg(dir)
        .arg("--config")
        .arg(write_config(dir));
    cmd
}

const PROFILE: &str = "/set_profile\n70\n175\n30\n30\nBerlin\n/skip\n";

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("hydro"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily water and calorie tracker"));
}

#[test]
fn test_start_greets() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("chat")
        .write_stdin("/start\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("/set_profile"));
}

#[test]
fn test_profile_dialogue_reports_goals() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("chat")
        .write_stdin(PROFILE)
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter your weight (kg):"))
        .stdout(predicate::str::contains("Water goal: 3100 ml/day"))
        .stdout(predicate::str::contains("Calorie goal: 2473 kcal/day"))
        .stdout(predicate::str::contains("Keeping the calorie goal of 2473"));
}

#[test]
fn test_invalid_weight_is_reprompted() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("chat")
        .write_stdin("/set_profile\nheavy\n70\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("'heavy' is not a number"))
        .stdout(predicate::str::contains("Enter your height (cm):"));
}

#[test]
fn test_logging_requires_profile() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("chat")
        .write_stdin("/log_water 250\n/log_water abc\n/log_workout yoga\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Set up your profile first"))
        .stdout(predicate::str::contains("Usage:").not());
}

#[test]
fn test_full_day() {
    let temp_dir = setup_test_dir();
    let input = format!(
        "{PROFILE}/log_water 500\n/log_workout running 30\n/log_food banana\n150\n/check_progress\n"
    );

    cli(temp_dir.path())
        .arg("chat")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Remaining: 2600 ml"))
        .stdout(predicate::str::contains("Running 30 min - 280 kcal burned."))
        .stdout(predicate::str::contains("Drink an extra 200 ml of water."))
        .stdout(predicate::str::contains("banana - 89 kcal/100g"))
        .stdout(predicate::str::contains("Logged banana: 133.5 kcal"))
        .stdout(predicate::str::contains("Drunk: 500 ml of 3300 ml"))
        // 2473 - 133.5 + 280 = 2619.5
        .stdout(predicate::str::contains("Balance: 2620 kcal"));
}

#[test]
fn test_unknown_food_not_found() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("chat")
        .write_stdin(format!("{PROFILE}/log_food dragonfruit\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Food not found: dragonfruit"));
}

#[test]
fn test_state_persists_between_runs() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("chat")
        .write_stdin(format!("{PROFILE}/log_water 1000\n"))
        .assert()
        .success();

    let state_path = temp_dir.path().join("state.json");
    let state = fs::read_to_string(&state_path).expect("Failed to read state");
    let json: serde_json::Value = serde_json::from_str(&state).unwrap();
    assert_eq!(json["users"]["local"]["ledger"]["logged_water_ml"], 1000.0);

    cli(temp_dir.path())
        .arg("chat")
        .write_stdin("/check_progress\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drunk: 1000 ml of 3100 ml"));
}

#[test]
fn test_no_persist_leaves_no_state() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--no-persist")
        .arg("chat")
        .write_stdin(PROFILE)
        .assert()
        .success();

    assert!(!temp_dir.path().join("state.json").exists());
}

#[test]
fn test_replay_groups_by_user() {
    let temp_dir = setup_test_dir();
    let script = temp_dir.path().join("script.txt");
    fs::write(
        &script,
        "# two users interleaved\n\
         alice /set_profile\n\
         bob /log_water 100\n\
         alice 70\n\
         alice 175\n\
         alice 30\n\
         alice 30\n\
         alice Berlin\n\
         alice /skip\n\
         alice /log_water 500\n",
    )
    .unwrap();

    cli(temp_dir.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("[alice] Enter your weight (kg):"))
        .stdout(predicate::str::contains("[alice] Logged 500 ml of water. Remaining: 2600 ml"))
        .stdout(predicate::str::contains("[bob] Set up your profile first"));
}
