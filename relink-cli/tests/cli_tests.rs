use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn relink(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("relink").expect("relink binary");
    cmd.current_dir(cwd.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_config_file_fails_with_its_path() {
    let cwd = TempDir::new().unwrap();
    relink(&cwd)
        .args(["--config", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn malformed_config_fails_before_any_command() {
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join(".relinkrc"), r#"{"links": "dep-1"}"#).unwrap();
    relink(&cwd)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "config is malformed, expected links to be array",
        ));
}

#[test]
fn dry_run_prints_resolved_repositories() {
    let cwd = TempDir::new().unwrap();
    std::fs::create_dir(cwd.path().join("api")).unwrap();
    std::fs::write(
        cwd.path().join(".relinkrc"),
        r#"{"repositories": [{"path": "api", "links": ["dep-1"]}]}"#,
    )
    .unwrap();

    let output = relink(&cwd)
        .args(["--dry-run", "--log-level", "silent"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let repos: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(repos[0]["name"], "api");
    assert_eq!(repos[0]["upstream"], "master");
    assert_eq!(repos[0]["remote"], "origin");
    assert_eq!(repos[0]["links"], serde_json::json!(["dep-1"]));
}

#[test]
fn flags_override_discovered_config() {
    let cwd = TempDir::new().unwrap();
    std::fs::write(
        cwd.path().join("package.json"),
        r#"{"name": "app", "relink": {"upstream": "develop"}}"#,
    )
    .unwrap();

    let output = relink(&cwd)
        .args(["--dry-run", "--log-level", "silent", "-u", "release", "-n", "app"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let repos: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(repos[0]["name"], "app");
    assert_eq!(repos[0]["upstream"], "release");
}

#[test]
fn fetch_failure_is_reported_and_exits_non_zero() {
    let cwd = TempDir::new().unwrap();
    let output = relink(&cwd)
        .args(["--json", "--log-level", "silent", "-r", "nowhere"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(report["success"], false);
    assert_eq!(report["repositories"][0]["outcome"], Value::Null);
    let error = report["repositories"][0]["error"].as_str().unwrap();
    assert!(error.starts_with("git fetch nowhere failed"), "got: {error}");
}
