#![cfg(unix)]

use serde_json::Value;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_BOLT: &str = r#"#!/bin/sh
case "$1 $2" in
  "inventory show")
    echo '{"targets": [{"name": "web-01", "uri": "ssh://web-01.example.com"}, "db-01"]}'
    ;;
  "command run")
    case "$3" in
      fail*)
        echo '{"items": [{"target": "web-01", "status": "failure", "value": {"stdout": "", "stderr": "boom", "exit_code": 3}}]}'
        echo "Failed on web-01" >&2
        exit 2
        ;;
      *)
        echo '{"items": [{"target": "web-01", "status": "success", "value": {"stdout": "ok", "stderr": "", "exit_code": 0}}]}'
        ;;
    esac
    ;;
  "task show")
    echo "Could not find a task named '$3'" >&2
    exit 1
    ;;
  *)
    echo "unexpected arguments: $*" >&2
    exit 1
    ;;
esac
"#;

fn fake_bolt(dir: &Path) -> PathBuf {
    let path = dir.join("bolt");
    std::fs::write(&path, FAKE_BOLT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn boltdesk(dir: &TempDir, args: &[&str]) -> Output {
    let bolt = fake_bolt(dir.path());
    Command::new(env!("CARGO_BIN_EXE_boltdesk"))
        .arg("--bolt")
        .arg(&bolt)
        .arg("--project")
        .arg(dir.path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn assert_succeeded(output: &Output) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_inventory_prints_nodes() {
    let dir = TempDir::new().unwrap();
    let output = boltdesk(&dir, &["inventory"]);
    assert_succeeded(&output);

    let nodes = stdout_json(&output);
    let names: Vec<&str> = nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["web-01", "db-01"]);
    assert_eq!(nodes[0]["uri"], "ssh://web-01.example.com");
}

#[test]
fn test_command_run_succeeds() {
    let dir = TempDir::new().unwrap();
    let output = boltdesk(&dir, &["run", "web-01", "uptime"]);
    assert_succeeded(&output);

    let result = stdout_json(&output);
    assert_eq!(result["type"], "command");
    assert_eq!(result["results"][0]["output"]["stdout"], "ok");
}

#[test]
fn test_failed_command_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let output = boltdesk(&dir, &["run", "web-01", "fail-now"]);
    assert!(!output.status.success());

    let result = stdout_json(&output);
    assert_eq!(result["results"][0]["nodeId"], "web-01");
    assert_eq!(result["results"][0]["error"], "boom");
}

#[test]
fn test_streaming_echoes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let output = boltdesk(&dir, &["--stream", "run", "web-01", "uptime"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("$ "), "{stderr}");
    assert!(stderr.contains("command run uptime"), "{stderr}");
}

#[test]
fn test_unknown_task_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = boltdesk(&dir, &["task", "show", "nope::missing"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_params_are_rejected() {
    let dir = TempDir::new().unwrap();
    let args = ["task", "run", "web-01", "package", "--params", "[1, 2]"];
    let output = boltdesk(&dir, &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--params"));
}
