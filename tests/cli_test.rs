//! The `treewalk` binary: exit codes and output.

use std::process::{Command, Output};

use rstest::rstest;
use tempfile::TempDir;

/// Run the binary with an empty config home and no TREEWALK_* overrides.
fn treewalk(args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    Command::new(env!("CARGO_BIN_EXE_treewalk"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("TREEWALK_CONFIG")
        .env_remove("TREEWALK_STRATEGY")
        .env_remove("TREEWALK_CAPACITY")
        .env_remove("TREEWALK_MAX_DEPTH")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[rstest]
#[case(&["same", "--left", "x"])]
#[case(&["walk", "--tour", "2", "1,2"])]
#[case(&["--capacity", "many", "walk", "1"])]
#[case(&["frobnicate"])]
#[case(&[])]
fn given_rejected_arguments_when_running_then_exits_with_usage(#[case] args: &[&str]) {
    let output = treewalk(args);
    assert_eq!(output.status.code(), Some(64), "stderr: {}", stderr(&output));
    assert!(!stderr(&output).is_empty());
}

#[rstest]
#[case(&["--help"])]
#[case(&["--version"])]
#[case(&["same", "--help"])]
fn given_help_or_version_when_running_then_exits_cleanly(#[case] args: &[&str]) {
    let output = treewalk(args);
    assert_eq!(output.status.code(), Some(0));
    assert!(!stdout(&output).is_empty());
}

#[test]
fn given_equal_sequences_when_running_same_then_prints_true_and_exits_zero() {
    let output = treewalk(&["same", "--left", "2,1,3", "--right", "1,2,3"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("true"));
}

#[test]
fn given_different_sequences_when_running_same_then_prints_false_and_exits_one() {
    let output = treewalk(&["same", "--left", "1,2,3", "--right", "1,20,3"]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("false"));
    assert!(stdout(&output).contains("position 1"));
}

#[test]
fn given_depth_limit_when_walking_deep_tree_then_exits_with_data_error() {
    let output = treewalk(&["--max-depth", "2", "walk", "1,2,3,4"]);
    assert_eq!(output.status.code(), Some(65));
    assert!(stderr(&output).contains("depth limit of 2"));
}

#[test]
fn given_values_when_walking_inline_then_prints_sorted_sequence() {
    let output = treewalk(&["walk", "--inline", "3,1,2"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "1,2,3");
}
