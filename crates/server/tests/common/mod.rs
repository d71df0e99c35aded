//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a `MockRunner` (or a real `ProcessRunner`) behind the executor,
//! so the HTTP layer can be exercised without ffmpeg installed.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tengine_core::{
    testing::MockRunner,
    transform::{CommandTable, WILDCARD},
    CommandRunner, Config, HealthProbe, ProcessRunner, TransformExecutor, TransformerConfig,
};
use tengine_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use tengine_core::testing::fixtures;

const BOUNDARY: &str = "tengine-test-boundary";

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_transform() {
///     let fixture = TestFixture::new().await;
///
///     let form = MultipartForm::new()
///         .file("file", "hello.txt", b"Hello")
///         .text("targetExtension", "mp4");
///     let response = fixture.post_multipart("/transform", form).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock runner - script exit codes and failures
    pub runner: Arc<MockRunner>,
    /// Health probe shared with the router
    pub probe: Arc<HealthProbe>,
    /// Temporary directory for work dirs and the probe fixture
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl TestFixture {
    /// Create a fixture whose commands are served by a `MockRunner` that
    /// writes `rendered video` to the target on success.
    pub async fn new() -> Self {
        let runner = Arc::new(MockRunner::new());
        runner.write_target_on_success(b"rendered video".to_vec()).await;

        let commands = CommandTable::new().with_command(
            WILDCARD,
            ["render", "{source}", "{option.language:English}", "{target}"],
        );
        Self::build(commands, runner.clone(), runner)
    }

    /// Create a fixture that runs real processes.
    pub async fn with_process_commands(commands: CommandTable) -> Self {
        Self::build(
            commands,
            Arc::new(ProcessRunner::with_defaults()),
            Arc::new(MockRunner::new()),
        )
    }

    fn build(
        commands: CommandTable,
        command_runner: Arc<dyn CommandRunner>,
        runner: Arc<MockRunner>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let probe_config =
            fixtures::probe_config(temp_dir.path()).expect("Failed to write probe fixture");

        let config = Config {
            transformer: TransformerConfig {
                name: "Test Transformer".to_string(),
                work_dir: temp_dir.path().join("requests"),
                commands: commands.clone(),
                ..Default::default()
            },
            probe: probe_config.clone(),
            ..Default::default()
        };

        let executor = Arc::new(TransformExecutor::new(
            commands,
            command_runner,
            Duration::from_secs(10),
        ));
        let probe = Arc::new(HealthProbe::new(probe_config, Arc::clone(&executor)));
        let state = Arc::new(AppState::new(config, executor, Arc::clone(&probe)));

        Self {
            router: create_router(state),
            runner,
            probe,
            temp_dir,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST request.
    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            content_type,
            bytes,
        }
    }

    /// Number of entries left in the request work dir.
    pub fn leftover_request_dirs(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path().join("requests"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Minimal multipart/form-data body builder.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}
