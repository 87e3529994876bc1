// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box end-to-end tests against the compiled `mediatord` binary.
//!
//! These drive the real process over its HTTP surface the way an operator
//! or a client integration would: start it against a config file, poll
//! `/healthz`, and exchange RPCs over `/rpc`. The richer invariants around
//! historian ordering, batch coalescing, read prioritisation, and session
//! abandonment are exercised with fakes at the crate level, where a
//! `FakeClock` and `FakeModule` can force the relevant timing and ordering
//! directly; this file only checks that the wiring between them survives
//! a real process boundary.

use std::io::Write as _;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use assert_cmd::cargo::cargo_bin;
use serial_test::serial;
use tempfile::TempDir;

struct DaemonProcess {
    child: Child,
    base_url: String,
    start_complete_file: std::path::PathBuf,
    _workdir: TempDir,
}

impl DaemonProcess {
    async fn spawn() -> Self {
        let workdir = TempDir::new().expect("create temp workdir");
        let port = free_port();
        let start_complete_file = workdir.path().join("ready");
        let config_path = workdir.path().join("mediator.xml");

        let config = format!(
            r#"
<MediatorConfig>
    <ClientListenHost>127.0.0.1</ClientListenHost>
    <ClientListenPort>{port}</ClientListenPort>
    <StartCompleteFile>{start_complete_file}</StartCompleteFile>
</MediatorConfig>
"#,
            port = port,
            start_complete_file = start_complete_file.display(),
        );
        std::fs::File::create(&config_path)
            .and_then(|mut f| f.write_all(config.as_bytes()))
            .expect("write config file");

        let child = Command::new(cargo_bin("mediatord"))
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn mediatord");

        let base_url = format!("http://127.0.0.1:{port}");
        wait_for_ready(&start_complete_file, Duration::from_secs(10)).await;

        DaemonProcess {
            child,
            base_url,
            start_complete_file,
            _workdir: workdir,
        }
    }

    async fn call(&self, request_json: serde_json::Value) -> serde_json::Value {
        let resp = reqwest::Client::new()
            .post(format!("{}/rpc", self.base_url))
            .json(&request_json)
            .send()
            .await
            .expect("rpc request");
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.expect("rpc response body");
        assert!(status.is_success(), "rpc call failed: {body}");
        body
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

async fn wait_for_ready(marker: &std::path::Path, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if marker.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("mediatord did not become ready within {timeout:?}");
}

/// Cold start: a fresh process with an empty module list still comes up,
/// serves its HTTP surface, and announces readiness via the start-complete
/// marker file (the supervisor has nothing to wait on, so this is the
/// degenerate case of the scenario — no adapters ship in this workspace to
/// exercise the module-bearing path end to end, which is why the richer
/// startup ordering lives in `mediator-daemon`'s own process tests).
#[tokio::test]
#[serial]
async fn cold_start_serves_health_and_reports_no_modules() {
    let daemon = DaemonProcess::spawn().await;
    assert!(daemon.start_complete_file.exists());

    let health = reqwest::get(format!("{}/healthz", daemon.base_url))
        .await
        .expect("healthz request");
    assert!(health.status().is_success());

    let body = daemon
        .call(serde_json::json!({"method": "GetModules"}))
        .await;
    assert_eq!(body["modules"], serde_json::json!([]));
}

/// Unauthenticated reads of variables nobody configured resolve to `None`
/// rather than an error, per the read-boundary contract; no module means
/// no variable store, which exercises the same "unconfigured" code path as
/// a configured-but-absent variable.
#[tokio::test]
#[serial]
async fn reading_an_unconfigured_variable_is_not_an_error() {
    let daemon = DaemonProcess::spawn().await;

    let body = daemon
        .call(serde_json::json!({
            "method": "ReadVariables",
            "params": {
                "variables": [
                    {"object": {"module_id": "modA", "object_id": "obj1"}, "name": "temp"}
                ]
            }
        }))
        .await;
    assert_eq!(body["values"], serde_json::json!([null]));
}

/// A malformed request body never reaches the RPC dispatcher: it is
/// rejected as a plain bad request, distinct from a well-formed request
/// the dispatcher itself refuses.
#[tokio::test]
#[serial]
async fn a_non_json_body_is_rejected_before_dispatch() {
    let daemon = DaemonProcess::spawn().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/rpc", daemon.base_url))
        .header("content-type", "application/json")
        .body("definitely not json")
        .send()
        .await
        .expect("rpc request");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("body text");
    assert!(!body.contains("\"error\""));
}

/// `Login` without a user or a module id is a well-formed request the
/// dispatcher itself rejects, carrying the taxonomy's `BadRequest` status
/// and an `"error"` field distinguishing it from a transport-level parse
/// failure.
#[tokio::test]
#[serial]
async fn login_without_a_principal_is_a_request_error() {
    let daemon = DaemonProcess::spawn().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/rpc", daemon.base_url))
        .json(&serde_json::json!({"method": "Login", "params": {}}))
        .send()
        .await
        .expect("rpc request");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.expect("rpc response body");
    assert!(body["error"].is_string());
}

/// `Login` with a user identity issues a non-empty challenge the caller is
/// expected to answer via `Authenticate`.
#[tokio::test]
#[serial]
async fn login_with_a_user_issues_a_challenge() {
    let daemon = DaemonProcess::spawn().await;

    let body = daemon
        .call(serde_json::json!({"method": "Login", "params": {"user": "alice"}}))
        .await;
    assert!(!body["session_id"].as_str().unwrap_or_default().is_empty());
    assert!(!body["challenge"].as_str().unwrap_or_default().is_empty());
}
