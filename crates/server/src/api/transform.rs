//! Transform endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tengine_core::{StatusHint, TransformError, TransformRequest};
use tracing::{info, warn};
use uuid::Uuid;

use crate::metrics::UPLOADED_BYTES;
use crate::state::AppState;

/// Transform used when the form has no `transform` field.
pub const DEFAULT_TRANSFORM: &str = "helloWorld";

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn transform_error(e: TransformError) -> ApiError {
    let status = match e.status {
        StatusHint::BadRequest => StatusCode::BAD_REQUEST,
        StatusHint::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.message)
}

/// Parsed multipart form of a transform request.
#[derive(Debug)]
struct TransformForm {
    file: Vec<u8>,
    file_name: Option<String>,
    transform: String,
    target_extension: String,
    source_mimetype: String,
    target_mimetype: String,
    options: HashMap<String, String>,
}

impl TransformForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut file: Option<Vec<u8>> = None;
        let mut file_name: Option<String> = None;
        let mut file_mimetype: Option<String> = None;
        let mut transform: Option<String> = None;
        let mut target_extension: Option<String> = None;
        let mut source_mimetype: Option<String> = None;
        let mut target_mimetype: Option<String> = None;
        let mut options = HashMap::new();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    return Err(api_error(
                        StatusCode::BAD_REQUEST,
                        format!("Invalid multipart body: {}", e),
                    ))
                }
            };
            let name = field.name().unwrap_or("").to_string();

            if name == "file" {
                file_name = field.file_name().map(|s| s.to_string());
                file_mimetype = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file: {}", e),
                    )
                })?;
                file = Some(bytes.to_vec());
                continue;
            }

            let text = field.text().await.map_err(|e| {
                api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read field '{}': {}", name, e),
                )
            })?;
            match name.as_str() {
                "transform" => transform = non_empty(text),
                "targetExtension" => target_extension = non_empty(text),
                "sourceMimetype" => source_mimetype = non_empty(text),
                "targetMimetype" => target_mimetype = non_empty(text),
                "" => {}
                _ => {
                    options.insert(name, text);
                }
            }
        }

        let file = match file {
            Some(f) if !f.is_empty() => f,
            _ => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "No source file provided",
                ))
            }
        };

        let target_extension = target_extension
            .map(|ext| ext.trim_start_matches('.').to_string())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "targetExtension is required"))?;
        if !is_valid_extension(&target_extension) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid targetExtension '{}'", target_extension),
            ));
        }

        Ok(Self {
            file,
            file_name,
            transform: transform.unwrap_or_else(|| DEFAULT_TRANSFORM.to_string()),
            target_extension,
            source_mimetype: source_mimetype
                .or(file_mimetype)
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            target_mimetype: target_mimetype.unwrap_or_else(|| OCTET_STREAM.to_string()),
            options,
        })
    }

    /// Name the source is stored under: the uploaded file name when it is
    /// a plain, safe name, otherwise `source`.
    fn source_file_name(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| is_safe_file_name(name))
            .unwrap_or("source")
            .to_string()
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_safe_file_name(name: &str) -> bool {
    !name.starts_with('.')
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// POST /transform
///
/// Multipart form with the source `file`, `targetExtension`, optional
/// `transform`, `sourceMimetype` and `targetMimetype`; any other text field is
/// passed as a transform option. Responds with the target file bytes.
pub async fn transform(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = TransformForm::read(&mut multipart).await?;

    let request_id = Uuid::new_v4();
    let work_dir = state
        .config()
        .transformer
        .work_dir
        .join(format!("request-{}", request_id));

    info!(
        request_id = %request_id,
        transform = %form.transform,
        source_bytes = form.file.len(),
        target_extension = %form.target_extension,
        "Transform request received"
    );

    let result = run_in_dir(&state, form, &work_dir).await;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(request_id = %request_id, error = %e, "Failed to remove request directory");
        }
    }

    result
}

async fn run_in_dir(
    state: &AppState,
    form: TransformForm,
    work_dir: &Path,
) -> Result<Response, ApiError> {
    let internal = |e: std::io::Error| transform_error(TransformError::from(e));

    // The source lives in its own directory so no upload name can alias the target.
    let source_dir = work_dir.join("source");
    tokio::fs::create_dir_all(&source_dir)
        .await
        .map_err(internal)?;

    let source_path = source_dir.join(form.source_file_name());
    let target_path = work_dir.join(format!("target.{}", form.target_extension));

    tokio::fs::write(&source_path, &form.file)
        .await
        .map_err(internal)?;
    UPLOADED_BYTES.inc_by(form.file.len() as u64);

    let request = TransformRequest::new(form.transform, &source_path, &target_path)
        .with_mimetypes(form.source_mimetype, form.target_mimetype.clone())
        .with_options(form.options);

    state
        .executor()
        .run(&request)
        .await
        .map_err(transform_error)?;

    let bytes = tokio::fs::read(&target_path).await.map_err(internal)?;
    let content_type = HeaderValue::from_str(&form.target_mimetype)
        .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
