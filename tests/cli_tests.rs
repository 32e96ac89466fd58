//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::{fixture_arg, invalid_config_fixture, valid_config_fixture};

/// Get a command for the stuntman binary
fn stuntman_cmd() -> Command {
    let mut cmd = Command::cargo_bin("stuntman").unwrap();
    cmd.env_remove("STUNTMAN_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn valid_config() -> String {
    valid_config_fixture().to_string_lossy().into_owned()
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    stuntman_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    stuntman_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("stuntman "));
}

#[test]
fn test_version_json() {
    stuntman_cmd()
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"git_hash\""));
}

// ─────────────────────────────────────────────────────────────────
// Registry Commands
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_list_from_config() {
    stuntman_cmd()
        .args(["list", "--config", &valid_config()])
        .assert()
        .success()
        .stdout(predicate::str::contains("inline-1"))
        .stdout(predicate::str::contains("Inline User"))
        .stdout(predicate::str::contains("/fake-auth/sign-in"));
}

#[test]
fn test_import_adds_file_personas() {
    stuntman_cmd()
        .args([
            "import",
            &fixture_arg("users.json"),
            "--config",
            &valid_config(),
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"inline-1\""))
        .stdout(predicate::str::contains("\"user-1\""))
        .stdout(predicate::str::contains("\"user-2\""));
}

#[test]
fn test_import_relative_path_rejected() {
    stuntman_cmd()
        .args(["import", "users.json", "--config", &valid_config()])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("E130"));
}

#[test]
fn test_export_federation_document() {
    stuntman_cmd()
        .args(["export", "--config", &valid_config()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\"Users\":["))
        .stdout(predicate::str::contains("\"AccessToken\":\"inline-token\""));
}

#[test]
fn test_fetch_from_mock_peer() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/stuntman/server")
        .with_header("content-type", "application/json")
        .with_body(r#"{"Users":[{"Id":"user-9","Name":"User 9"}]}"#)
        .create();

    stuntman_cmd()
        .args(["fetch", &server.url(), "--config", &valid_config()])
        .assert()
        .success()
        .stdout(predicate::str::contains("user-9"))
        .stdout(predicate::str::contains(server.url()));
}

#[test]
fn test_fetch_unreachable_peer() {
    // Lenient fetch keeps going with what it has
    stuntman_cmd()
        .args(["fetch", "http://127.0.0.1:9", "--config", &valid_config()])
        .assert()
        .success()
        .stdout(predicate::str::contains("inline-1"));

    stuntman_cmd()
        .args(["fetch", "http://127.0.0.1:9", "--strict", "--config", &valid_config()])
        .assert()
        .failure()
        .code(40);
}

// ─────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file() {
    stuntman_cmd()
        .args(["list", "--config", "/nonexistent/stuntman.toml"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_validate() {
    stuntman_cmd()
        .args(["config", "validate", "--config", &valid_config()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid."));

    stuntman_cmd()
        .args([
            "config",
            "validate",
            "--config",
            invalid_config_fixture().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("stuntman.toml");
    let path = path.to_str().unwrap();

    stuntman_cmd()
        .args(["config", "init", "--path", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    stuntman_cmd()
        .args(["config", "init", "--path", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    stuntman_cmd()
        .args(["config", "init", "--path", path, "--force"])
        .assert()
        .success();

    stuntman_cmd()
        .args(["config", "show", "--config", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("root_path = \"/stuntman/\""));
}
