//! Smoke tests for the `devpod-civo` binary surface.
//!
//! These tests only exercise paths that never reach the Civo API: argument
//! parsing, configuration failures, and the token round-trip.

use assert_cmd::Command;
use predicates::prelude::*;

fn provider_command() -> Command {
    let mut cmd = Command::cargo_bin("devpod-civo")
        .unwrap_or_else(|err| panic!("binary should build: {err}"));
    for var in ["CIVO_TOKEN", "CIVO_API_KEY", "CIVO_REGION", "COMMAND"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn no_arguments_prints_help_and_fails() {
    provider_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_every_lifecycle_operation() {
    provider_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("command"))
        .stdout(predicate::str::contains("token"));
}

#[test]
fn status_without_credentials_names_the_missing_variable() {
    provider_command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CIVO_API_KEY"));
}

#[test]
fn command_without_a_command_value_fails_fast() {
    provider_command()
        .arg("command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMAND"));
}

#[test]
fn token_round_trips_discrete_credentials() {
    provider_command()
        .arg("token")
        .env("CIVO_API_KEY", "key-123")
        .env("CIVO_REGION", "lon1")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"apiKey":"key-123","region":"lon1"}"#,
        ));
}

#[test]
fn token_forwards_an_existing_token_verbatim() {
    let raw = r#"{"region":"nyc1","apiKey":"token-key"}"#;
    provider_command()
        .arg("token")
        .env("CIVO_TOKEN", raw)
        .assert()
        .success()
        .stdout(predicate::str::contains(raw));
}
