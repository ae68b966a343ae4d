//! Turns `multipart/form-data` requests into JSON before they reach a handler.
//!
//! Text parts become string fields. File parts are streamed to a temporary
//! file and replaced by a [`StagedFile`] object, so services only ever see
//! JSON. The temp files are owned by [`TempUpload`] guards held until the
//! response is produced, so whatever the service did not consume is removed
//! on success, on error and on cancellation.

use std::collections::HashSet;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use folio_core::FolioError;
use folio_media::{StagedFile, TempUpload, STAGED_FILE_PREFIX};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::FolioAxumError;

#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Where file parts are staged.
    pub upload_dir: PathBuf,
    /// Per-file limit in bytes (`None` = unlimited).
    pub max_file_size: Option<u64>,
    /// Accepted content type prefixes for file parts (empty = any).
    pub allowed_content_types: Vec<String>,
    /// Parts always treated as files, even without a filename.
    pub file_fields: HashSet<String>,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir(),
            max_file_size: Some(10 * 1024 * 1024),
            allowed_content_types: vec!["image/".to_string()],
            file_fields: HashSet::new(),
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn allow_content_type(mut self, prefix: &str) -> Self {
        self.allowed_content_types.push(prefix.to_string());
        self
    }

    pub fn allow_any_content_type(mut self) -> Self {
        self.allowed_content_types.clear();
        self
    }

    pub fn file_field(mut self, name: &str) -> Self {
        self.file_fields.insert(name.to_string());
        self
    }

    fn accepts(&self, content_type: &str) -> bool {
        self.allowed_content_types.is_empty()
            || self
                .allowed_content_types
                .iter()
                .any(|prefix| content_type.starts_with(prefix.as_str()))
    }
}

#[derive(Clone)]
pub struct MultipartToJson {
    config: Arc<MultipartConfig>,
}

impl MultipartToJson {
    pub fn new(config: MultipartConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for MultipartToJson {
    type Service = MultipartToJsonService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MultipartToJsonService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

#[derive(Clone)]
pub struct MultipartToJsonService<S> {
    inner: S,
    config: Arc<MultipartConfig>,
}

impl<S> Service<Request> for MultipartToJsonService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let Some(boundary) = multipart_boundary(req.headers()) else {
            return Box::pin(self.inner.call(req));
        };

        // The clone may not be ready; call the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            let (fields, guards) = match stage_parts(body, boundary, &config).await {
                Ok(staged) => staged,
                Err(err) => return Ok(FolioAxumError::from(err).into_response()),
            };

            let bytes = match serde_json::to_vec(&Value::Object(fields)) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = FolioError::general_error("Failed to encode form data").with_source(e.into());
                    return Ok(FolioAxumError::from(err).into_response());
                }
            };

            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            parts.headers.remove(header::CONTENT_LENGTH);

            let res = inner.call(Request::from_parts(parts, Body::from(bytes))).await;
            drop(guards);
            res
        })
    }
}

fn multipart_boundary(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    if !content_type.starts_with("multipart/form-data") {
        return None;
    }
    multer::parse_boundary(content_type).ok()
}

fn malformed(err: multer::Error) -> FolioError {
    FolioError::bad_request("Malformed multipart body").with_errors(serde_json::json!({"_schema": [err.to_string()]}))
}

fn staging_failed(err: impl Into<anyhow::Error>) -> FolioError {
    FolioError::general_error("Failed to stage upload").with_source(err.into())
}

/// Text fields repeat into arrays; a later file part replaces an earlier value.
fn insert_text(fields: &mut Map<String, Value>, name: String, text: String) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        None => {
            fields.insert(name, Value::String(text));
        }
    }
}

fn field_slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

async fn stage_parts(
    body: Body,
    boundary: String,
    config: &MultipartConfig,
) -> Result<(Map<String, Value>, Vec<TempUpload>), FolioError> {
    let mut multipart = multer::Multipart::new(body.into_data_stream(), boundary);
    let mut fields = Map::new();
    let mut guards = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);

        if filename.is_none() && !config.file_fields.contains(&name) {
            let text = field.text().await.map_err(malformed)?;
            insert_text(&mut fields, name, text);
            continue;
        }

        // An untouched file input arrives as a part with an empty filename.
        if filename.as_deref() == Some("") {
            while field.chunk().await.map_err(malformed)?.is_some() {}
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !config.accepts(&content_type) {
            return Err(FolioError::bad_request(format!(
                "Unsupported file type {content_type} for field {name}"
            ))
            .with_field_error(&name, "only image files are allowed"));
        }

        let temp_path = config
            .upload_dir
            .join(format!("{STAGED_FILE_PREFIX}{}_{}", field_slug(&name), Uuid::new_v4().simple()));
        let mut file = tokio::fs::File::create(&temp_path).await.map_err(staging_failed)?;
        guards.push(TempUpload::new(&temp_path));

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            size += chunk.len() as u64;
            if let Some(max) = config.max_file_size {
                if size > max {
                    return Err(FolioError::payload_too_large(format!(
                        "File {name} exceeds the {max} byte limit"
                    ))
                    .with_field_error(&name, "file too large"));
                }
            }
            file.write_all(&chunk).await.map_err(staging_failed)?;
        }
        file.flush().await.map_err(staging_failed)?;

        tracing::debug!(field = %name, size, content_type = %content_type, "file part staged");

        let staged = StagedFile {
            key: name.clone(),
            temp_path,
            filename,
            content_type: Some(content_type),
            size,
        };
        let value = serde_json::to_value(&staged).map_err(staging_failed)?;
        fields.insert(name, value);
    }

    Ok((fields, guards))
}
