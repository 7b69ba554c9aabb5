//! CLI integration tests for the dify command-line interface.
//!
//! Parsing and help tests need no server. The request tests run the binary
//! against a wiremock server with config discovery pointed at an empty
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the dify binary, isolated from the user's config.
fn dify(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dify").unwrap();
    cmd.current_dir(config_dir.path())
        .env("DIFY_CONFIG_DIR", config_dir.path())
        .env_remove("DIFY_BASE_URL")
        .env_remove("DIFY_API_KEY")
        .env_remove("DIFY_USER")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dify workflows"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dify"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("detail"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn test_run_help_shows_stream_flags() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stream"))
        .stdout(predicate::str::contains("--base64"))
        .stdout(predicate::str::contains("KEY=VALUE"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_base64_requires_stream() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["--base-url", "http://127.0.0.1:9", "run", "--base64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--stream"));
}

#[test]
fn test_malformed_input_rejected() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["run", "--input", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_invalid_log_status_rejected() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["logs", "--status", "bogus"])
        .assert()
        .failure();
}

#[test]
fn test_detail_requires_run_id() {
    let dir = TempDir::new().unwrap();
    dify(&dir).arg("detail").assert().failure();
}

#[test]
fn test_missing_base_url_is_reported() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["detail", "run-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base URL"));
}

#[test]
fn test_explicit_config_file_must_exist() {
    let dir = TempDir::new().unwrap();
    dify(&dir)
        .args(["--config", "missing.toml", "detail", "run-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_run_blocking_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .and(header("Authorization", "Bearer app-cli"))
        .and(body_partial_json(json!({
            "inputs": {"query": "hi", "n": 2},
            "response_mode": "blocking",
            "user": "tester"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflow_run_id": "run-1",
            "task_id": "task-1",
            "data": {"id": "run-1", "status": "succeeded", "outputs": {"answer": 42}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        dify(&dir)
            .args([
                "--json",
                "--base-url",
                &format!("{}/v1", uri),
                "--api-key",
                "app-cli",
                "run",
                "--user",
                "tester",
                "--input",
                "query=hi",
                "--input",
                "n=2",
            ])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"workflow_run_id\": \"run-1\""))
        .stdout(predicate::str::contains("\"answer\": 42"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_stream_prints_events() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"event\": \"workflow_started\", \"task_id\": \"task-1\", \"workflow_run_id\": \"run-1\", \"data\": {}}\n\n",
        "data: {\"event\": \"node_started\", \"task_id\": \"task-1\", \"data\": {\"title\": \"LLM\"}}\n\n",
        "data: {\"event\": \"workflow_finished\", \"task_id\": \"task-1\", \"data\": {\"status\": \"succeeded\", \"outputs\": {\"answer\": \"done\"}}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .and(body_partial_json(json!({"response_mode": "streaming"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = format!("base_url = \"{}/v1\"\nuser = \"from-file\"\n", server.uri());
    std::fs::write(dir.path().join("dify.toml"), config).unwrap();

    let assert = tokio::task::spawn_blocking(move || {
        dify(&dir).args(["--json", "run", "--stream"]).assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"event\":\"workflow_started\""))
        .stdout(predicate::str::contains("\"event\":\"node_started\""))
        .stdout(predicate::str::contains("\"event\":\"workflow_finished\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_stream_run_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(
                    "data: {\"event\": \"workflow_finished\", \"task_id\": \"t\", \"data\": {\"status\": \"failed\", \"error\": \"node exploded\"}}\n\n",
                ),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        dify(&dir)
            .args(["--base-url", &format!("{}/v1", uri), "run", "--stream"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("node exploded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_detail_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/workflows/run/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found",
            "message": "Workflow run not found"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        dify(&dir)
            .args(["--base-url", &format!("{}/v1", uri), "detail", "missing"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("Workflow run not found"));
}
