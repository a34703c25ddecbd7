//! Tests of the `bkit` binary: argument parsing, exit codes and `--json` output

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bkit(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bkit").unwrap();
    cmd.arg("--workdir")
        .arg(workdir.path())
        .env_remove("BKIT_WORKDIR")
        .env("BKIT_SETTINGS_ROOT", workdir.path())
        .env_remove("BKIT_JSON")
        .env("NO_COLOR", "1");
    cmd
}

fn report(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("a JSON report on stdout");
    serde_json::from_str(line).expect("valid JSON report")
}

#[test]
fn help_lists_the_commands() {
    let dir = TempDir::new().unwrap();
    bkit(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn version_report_in_json_mode() {
    let dir = TempDir::new().unwrap();
    let output = bkit(&dir).args(["--json", "version"]).output().unwrap();

    assert!(output.status.success());
    let report = report(&output.stdout);
    assert_eq!(report["ok"], true);
    assert_eq!(report["command"], "version");
    assert_eq!(report["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn missing_project_fails_with_a_json_error() {
    let dir = TempDir::new().unwrap();
    let output = bkit(&dir).args(["--json", "build"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report = report(&output.stdout);
    assert_eq!(report["ok"], false);
    assert_eq!(report["command"], "build");
    assert!(report["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(!output.stderr.is_empty());
}

#[test]
fn init_then_validate_from_the_command_line() {
    let dir = TempDir::new().unwrap();
    bkit(&dir)
        .args(["--yes", "init", "demo", "--name", "demo", "--no-script"])
        .assert()
        .success();
    assert!(dir.path().join("demo/bkit.config.json").is_file());

    let output = bkit(&dir)
        .args(["--json", "validate", "--project", "demo"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report = report(&output.stdout);
    assert_eq!(report["ok"], true);
    assert_eq!(report["issues"], serde_json::json!([]));
}

#[test]
fn language_and_no_script_conflict() {
    let dir = TempDir::new().unwrap();
    bkit(&dir)
        .args(["init", "demo", "--language", "typescript", "--no-script"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    assert!(!dir.path().join("demo").exists());
}

#[test]
fn bump_needs_a_level_or_set() {
    let dir = TempDir::new().unwrap();
    bkit(&dir).arg("bump").assert().failure();
}
