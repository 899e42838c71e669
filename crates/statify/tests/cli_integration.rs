//! CLI integration tests for the Statify command-line interface.
//!
//! These tests verify:
//! - Help text and argument parsing
//! - Config and auth commands against an isolated config directory
//! - An authenticated command against a mock Web API
//!
//! Every test runs with its own temporary config directory and working
//! directory, so no real user config or session is touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the statify binary, isolated in `dir`.
fn statify(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("statify").unwrap();
    cmd.current_dir(dir.path())
        .env("STATIFY_CONFIG_DIR", dir.path())
        .env_remove("STATIFY_CLIENT_ID")
        .env_remove("STATIFY_REDIRECT_URI");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) {
    std::fs::write(dir.path().join("config.toml"), contents).unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Statify"))
        .stdout(predicate::str::contains("Spotify listening stats"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("statify"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("me"))
        .stdout(predicate::str::contains("top"))
        .stdout(predicate::str::contains("recent"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("playlist"))
        .stdout(predicate::str::contains("config"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_flags_accepted() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args([
            "--verbose",
            "--json",
            "--client-id",
            "abc",
            "--redirect-uri",
            "http://127.0.0.1:8888/callback",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_top_help_mentions_ranges() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["top", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("short_term"))
        .stdout(predicate::str::contains("artists"));
}

#[test]
fn test_auth_help() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("logout"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_time_range_fails() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["top", "tracks", "--range", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown time range"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["--client-id", "my-app", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(dir.path().join("config.toml").is_file());

    statify(&dir)
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"client_id\": \"my-app\""))
        .stdout(predicate::str::contains("\"configured\": true"));
}

#[test]
fn test_config_init_requires_client_id() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--client-id"));
}

#[test]
fn test_env_client_id_is_reported() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .env("STATIFY_CLIENT_ID", "from-env")
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STATIFY_CLIENT_ID"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_auth_status_without_session() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"no session\""))
        .stdout(predicate::str::contains("\"configured\": false"));
}

#[test]
fn test_auth_login_requires_config() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["auth", "login", "--no-browser"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn test_auth_logout_without_session() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No Spotify session found"));
}

#[test]
fn test_data_command_without_session_suggests_login() {
    let dir = TempDir::new().unwrap();
    statify(&dir)
        .arg("me")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active session"))
        .stderr(predicate::str::contains("statify auth login"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticated Commands
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_me_with_stored_session() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "listener",
            "display_name": "Listener",
            "product": "premium"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        &format!(
            "[spotify]\nclient_id = \"abc\"\nredirect_uri = \"http://127.0.0.1:8888/callback\"\napi_base_url = \"{}/v1\"\n",
            server.uri()
        ),
    );
    let expires_at = chrono::Utc::now().timestamp_millis() + 3_600_000;
    std::fs::write(
        dir.path().join("session.json"),
        serde_json::json!({
            "accessToken": "stored-token",
            "refreshToken": "stored-refresh",
            "scope": "user-read-private",
            "expiresAt": expires_at
        })
        .to_string(),
    )
    .unwrap();

    let mut cmd = statify(&dir);
    tokio::task::spawn_blocking(move || {
        cmd.arg("me")
            .assert()
            .success()
            .stdout(predicate::str::contains("Listener"))
            .stdout(predicate::str::contains("premium"));
    })
    .await
    .unwrap();
}
