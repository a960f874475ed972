use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

fn svcwrap() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("svcwrap"))
}

#[test]
fn help_lists_every_command() {
    let mut cmd = svcwrap();
    cmd.arg("--help");
    let mut assert = cmd.assert().success();
    for command in ["install", "enable", "disable", "remove", "start", "stop", "status", "log"] {
        assert = assert.stdout(contains(command));
    }
}

#[test]
fn status_help_mentions_json() {
    svcwrap()
        .args(["status", "--help"])
        .assert()
        .success()
        .stdout(contains("--json"));
}

#[test]
fn invalid_log_level_is_rejected() {
    svcwrap()
        .args(["--log-level", "loud", "status"])
        .assert()
        .failure()
        .stderr(contains("invalid log level"));
}

#[test]
fn unknown_service_file_keys_are_rejected() {
    let temp = tempdir().expect("failed to create tempdir");
    let path = temp.path().join("svcwrap.yaml");
    fs::write(&path, "exec: /bin/true\nrestart: always\n").expect("failed to write config");

    svcwrap()
        .args(["--config", path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(contains("restart").or(contains("unknown field")));
}

#[test]
fn missing_environment_variable_is_reported() {
    let temp = tempdir().expect("failed to create tempdir");
    let path = temp.path().join("svcwrap.yaml");
    fs::write(&path, "exec: ${SVCWRAP_TEST_UNSET_EXEC}\n").expect("failed to write config");

    svcwrap()
        .env_remove("SVCWRAP_TEST_UNSET_EXEC")
        .args(["--config", path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(contains("SVCWRAP_TEST_UNSET_EXEC"));
}
