use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const GOOD_LOG: &str = "Alpha - Core
foo:
  status: PASS
  elapsed: 1.5
";

fn runledger(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("runledger").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUNLEDGER_DB")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn help_exits_zero() {
    let dir = tempdir().unwrap();
    runledger(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn days_back_with_latest_is_a_usage_error() {
    let dir = tempdir().unwrap();
    runledger(dir.path())
        .args(["report", "--days-back", "7", "--latest"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Cannot combine --days-back with --latest",
        ));
    assert!(!dir.path().join("runledger.db").exists());
}

#[test]
fn ingest_without_input_is_a_no_op() {
    let dir = tempdir().unwrap();
    runledger(dir.path())
        .arg("ingest")
        .assert()
        .success()
        .stdout(predicate::str::contains("No file or directory to process"));
}

#[test]
fn undecodable_block_exits_one() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("run-2024-01-02-03:04"),
        "S - G\nbroken: [unclosed\n",
    )
    .unwrap();
    runledger(dir.path())
        .args(["ingest", "--file", "run-2024-01-02-03:04"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken: [unclosed"));
}

#[test]
fn malformed_file_name_exits_one() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("results.log"), GOOD_LOG).unwrap();
    runledger(dir.path())
        .args(["ingest", "--file", "results.log"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot derive run date"));
}

#[test]
fn unsupported_config_version_exits_two() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("runledger.yaml"), "version: 9\n").unwrap();
    runledger(dir.path())
        .arg("report")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported config version 9"));
}

#[test]
fn explicit_missing_config_exits_two() {
    let dir = tempdir().unwrap();
    runledger(dir.path())
        .args(["report", "--config", "nope.yaml"])
        .assert()
        .code(2);
}
