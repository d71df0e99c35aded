//! Types for the transform module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A single transform request, as handed over by the hosting layer.
///
/// The source file is already on local storage and the target path is
/// allocated but not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Transform name used to select the command (e.g. "helloWorld").
    pub transform_name: String,
    /// Media type of the source file.
    pub source_mimetype: String,
    /// Media type to produce.
    pub target_mimetype: String,
    /// Transform options. Keys are case-sensitive.
    #[serde(default)]
    pub options: HashMap<String, String>,
    /// Path of the received source file.
    pub source_path: PathBuf,
    /// Path the transformer must write to.
    pub target_path: PathBuf,
}

impl TransformRequest {
    /// Creates a request with empty mimetypes and no options.
    pub fn new(
        transform_name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transform_name: transform_name.into(),
            source_mimetype: String::new(),
            target_mimetype: String::new(),
            options: HashMap::new(),
            source_path: source_path.into(),
            target_path: target_path.into(),
        }
    }

    /// Sets source and target mimetypes.
    pub fn with_mimetypes(
        mut self,
        source_mimetype: impl Into<String>,
        target_mimetype: impl Into<String>,
    ) -> Self {
        self.source_mimetype = source_mimetype.into();
        self.target_mimetype = target_mimetype.into();
        self
    }

    /// Adds a single option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Replaces all options.
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options = options;
        self
    }
}

/// Classification of a finished execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The target file exists and is non-empty.
    Success { target_size_bytes: u64 },
    /// The input was rejected by the tool.
    ClientError { message: String },
    /// The tool crashed, timed out, or produced no usable output.
    ServerError { message: String },
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ClientError { .. } => "client_error",
            Self::ServerError { .. } => "server_error",
        }
    }
}

/// Summary of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub transform_name: String,
    pub target_size_bytes: u64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = TransformRequest::new("helloWorld", "/in/source.txt", "/out/target.mp4")
            .with_mimetypes("text/plain", "video/mp4")
            .with_option("language", "Spanish");

        assert_eq!(request.transform_name, "helloWorld");
        assert_eq!(request.source_mimetype, "text/plain");
        assert_eq!(request.target_mimetype, "video/mp4");
        assert_eq!(request.options.get("language").map(String::as_str), Some("Spanish"));
        assert_eq!(request.options.get("Language"), None);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            TransformOutcome::Success {
                target_size_bytes: 1
            }
            .label(),
            "success"
        );
        assert_eq!(
            TransformOutcome::ClientError {
                message: "bad".into()
            }
            .label(),
            "client_error"
        );
        assert!(!TransformOutcome::ServerError {
            message: "crash".into()
        }
        .is_success());
    }
}
