//! File API
//!
//! Upload, inline download and per-user listing of shared files.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sl_mapping::{Mapping, MappingService, ShortCode};
use tracing::{info, warn};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::file::{is_allowed_content_type, stored_name_for, BlobStore, StoredFile};
use crate::shared::api_common::public_url;
use crate::shared::error::{ErrorResponse, PlatformError, Result};
use crate::shared::middleware::Authenticated;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Upload response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileUploadResponse {
    pub short_url: String,
    pub original_filename: String,
    pub file_size: i64,
    pub content_type: String,
}

/// File as listed to its owner
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
}

/// File service state
#[derive(Clone)]
pub struct FileApiState {
    pub service: Arc<MappingService<StoredFile>>,
    pub blobs: Arc<dyn BlobStore>,
    pub base_url: String,
    pub max_file_size: usize,
}

impl FileApiState {
    fn file_url(&self, code: &ShortCode) -> String {
        public_url(&self.base_url, &format!("f/{}", code))
    }

    fn info(&self, m: Mapping<StoredFile>) -> FileInfo {
        FileInfo {
            id: m.id,
            short_url: self.file_url(&m.code),
            short_code: m.code.into_inner(),
            original_filename: m.resource.original_filename,
            content_type: m.resource.content_type,
            file_size: m.resource.file_size,
            downloads: m.usage_counter,
            created_at: m.created_at,
        }
    }
}

/// Request body limit for the upload route
pub fn upload_body_limit(max_file_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_file_size.saturating_add(MULTIPART_OVERHEAD_BYTES))
}

struct UploadedPart {
    filename: String,
    content_type: String,
    data: Bytes,
}

async fn read_file_part(multipart: &mut Multipart) -> Result<UploadedPart> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PlatformError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("unknown")
            .to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| PlatformError::validation(e.body_text()))?;

        return Ok(UploadedPart {
            filename,
            content_type,
            data,
        });
    }

    Err(PlatformError::validation("Multipart field 'file' is required"))
}

/// Upload a file
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    operation_id = "postFileUpload",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "File stored", body = FileUploadResponse),
        (status = 400, description = "Empty, oversized or disallowed file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<FileApiState>,
    auth: Authenticated,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>> {
    let part = read_file_part(&mut multipart).await?;

    if part.data.is_empty() {
        return Err(PlatformError::validation("File is empty"));
    }
    if !is_allowed_content_type(&part.content_type) {
        return Err(PlatformError::validation(
            "Only images (PNG, JPEG, GIF) and PDF files are allowed",
        ));
    }
    if part.data.len() > state.max_file_size {
        return Err(PlatformError::validation(format!(
            "File exceeds the maximum size of {} bytes",
            state.max_file_size
        )));
    }

    let stored_filename = stored_name_for(&part.filename, uuid::Uuid::new_v4());
    let file_size = part.data.len() as i64;
    state.blobs.put(&stored_filename, part.data).await?;

    let resource = StoredFile {
        original_filename: part.filename,
        stored_filename: stored_filename.clone(),
        content_type: part.content_type,
        file_size,
    };

    let mapping = match state.service.create(resource, Some(auth.subject.clone())).await {
        Ok(mapping) => mapping,
        Err(e) => {
            if let Err(cleanup) = state.blobs.delete(&stored_filename).await {
                warn!(error = %cleanup, name = %stored_filename, "Could not remove orphaned blob");
            }
            return Err(e.into());
        }
    };

    info!(code = %mapping.code, owner = %auth.subject, file_size, "File uploaded");

    Ok(Json(FileUploadResponse {
        short_url: state.file_url(&mapping.code),
        original_filename: mapping.resource.original_filename,
        file_size,
        content_type: mapping.resource.content_type,
    }))
}

fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();
    HeaderValue::from_str(&format!("inline; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

/// Download a file inline
#[utoipa::path(
    get,
    path = "/f/{code}",
    tag = "files",
    operation_id = "getFile",
    params(("code" = String, Path, description = "Short code")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Unknown code or missing file", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<FileApiState>,
    Path(code): Path<String>,
) -> Result<Response> {
    // A mapping whose blob is gone is not counted as a download
    if let Some(short_code) = ShortCode::parse(&code) {
        if let Some(mapping) = state.service.store().find(&short_code).await? {
            if !state.blobs.exists(&mapping.resource.stored_filename).await? {
                warn!(code = %short_code, name = %mapping.resource.stored_filename, "Blob missing for file mapping");
                return Err(PlatformError::not_found("File", code));
            }
        }
    }

    let mapping = state
        .service
        .resolve(&code)
        .await
        .map_err(|e| PlatformError::from_mapping("File", e))?;

    let data = state
        .blobs
        .get(&mapping.resource.stored_filename)
        .await?
        .ok_or_else(|| PlatformError::not_found("File", code.clone()))?;

    let content_type = HeaderValue::from_str(&mapping.resource.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&mapping.resource.original_filename)),
        ],
        data,
    )
        .into_response())
}

/// Files uploaded by the caller
#[utoipa::path(
    get,
    path = "/api/files/my-files",
    tag = "files",
    operation_id = "getMyFiles",
    responses(
        (status = 200, description = "Caller's files", body = Vec<FileInfo>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_files(
    State(state): State<FileApiState>,
    auth: Authenticated,
) -> Result<Json<Vec<FileInfo>>> {
    let mappings = state.service.list_for(&auth.subject).await?;
    Ok(Json(mappings.into_iter().map(|m| state.info(m)).collect()))
}

/// Create file router
pub fn file_router(state: FileApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(upload_file))
        .routes(routes!(my_files))
        .routes(routes!(download_file))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let value = content_disposition("my \"report\".pdf");
        assert_eq!(value.to_str().unwrap(), "inline; filename=\"my _report_.pdf\"");
    }
}
