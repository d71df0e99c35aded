use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with a `sh` based transform
fn minimal_config(port: u16, dir: &TempDir) -> String {
    let fixture = dir.path().join("probe_test.txt");
    std::fs::write(&fixture, b"Probe Test").unwrap();

    format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[transformer]
name = "Startup Transformer"
work_dir = "{work}"

[transformer.commands]
"*" = ["sh", "-c", "cat \"$1\" > \"$2\"", "sh", "{{source}}", "{{target}}"]

[probe]
source_path = "{fixture}"
work_dir = "{probe_work}"
interval_ms = 200
"#,
        port = port,
        work = dir.path().join("requests").display(),
        fixture = fixture.display(),
        probe_work = dir.path().join("probe").display(),
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_tengine"))
        .env("TENGINE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/live", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[tokio::test]
async fn test_ready_and_version_endpoints() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let temp_file = write_config(&minimal_config(port, &dir));

    let mut server = spawn_server(temp_file.path()).await;
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/ready", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["ready"], true);

    let version = client
        .get(format!("http://127.0.0.1:{}/version", port))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .unwrap();
    assert_eq!(version, "Startup Transformer available");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_transform_over_http() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let temp_file = write_config(&minimal_config(port, &dir));

    let mut server = spawn_server(temp_file.path()).await;
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"hello over http".to_vec()).file_name("in.txt"),
        )
        .text("targetExtension", "txt")
        .text("targetMimetype", "text/plain");

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/transform", port))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello over http");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_tengine"))
            .env("TENGINE_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_probe_thresholds_exit_with_error() {
    let config = r#"
[server]
port = 8090

[probe]
expected_time_ms = 5000
max_time_ms = 100
"#;
    let temp_file = write_config(config);

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_tengine"))
            .env("TENGINE_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
