//! Note API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sl_mapping::{MappingService, ShortCode};
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::note::Note;
use crate::shared::api_common::{public_url, require_text};
use crate::shared::error::{ErrorResponse, PlatformError, Result};
use crate::shared::middleware::Authenticated;

const TITLE_MAX_CHARS: usize = 200;
/// SQLite TEXT has no practical limit; keep notes to 1 MiB of characters
const CONTENT_MAX_CHARS: usize = 1024 * 1024;

/// Save note request
#[derive(Debug, Deserialize, ToSchema)]
pub struct NoteSaveRequest {
    pub title: String,
    pub content: String,
}

/// Save note response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteSaveResponse {
    pub short_url: String,
    pub title: String,
    pub content_preview: String,
}

/// Public note view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteView {
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Note as listed to its owner
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteInfo {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

/// Note service state
#[derive(Clone)]
pub struct NoteApiState {
    pub service: Arc<MappingService<Note>>,
    pub base_url: String,
}

impl NoteApiState {
    fn note_url(&self, code: &ShortCode) -> String {
        public_url(&self.base_url, &format!("n/{}", code))
    }
}

/// Save a note
#[utoipa::path(
    post,
    path = "/api/notes/save",
    tag = "notes",
    operation_id = "postNoteSave",
    request_body = NoteSaveRequest,
    responses(
        (status = 200, description = "Note saved", body = NoteSaveResponse),
        (status = 400, description = "Missing title or content", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_note(
    State(state): State<NoteApiState>,
    auth: Authenticated,
    Json(req): Json<NoteSaveRequest>,
) -> Result<Json<NoteSaveResponse>> {
    require_text("title", &req.title, TITLE_MAX_CHARS)?;
    require_text("content", &req.content, CONTENT_MAX_CHARS)?;

    let note = Note {
        title: req.title,
        content: req.content,
    };
    let content_preview = note.preview();

    let mapping = state.service.create(note, Some(auth.subject.clone())).await?;
    info!(code = %mapping.code, owner = %auth.subject, "Note saved");

    Ok(Json(NoteSaveResponse {
        short_url: state.note_url(&mapping.code),
        title: mapping.resource.title,
        content_preview,
    }))
}

/// View a note
#[utoipa::path(
    get,
    path = "/n/{code}",
    tag = "notes",
    operation_id = "getNote",
    params(("code" = String, Path, description = "Short code")),
    responses(
        (status = 200, description = "Note", body = NoteView),
        (status = 404, description = "Unknown short code", body = ErrorResponse)
    )
)]
pub async fn view_note(
    State(state): State<NoteApiState>,
    Path(code): Path<String>,
) -> Result<Json<NoteView>> {
    let mapping = state
        .service
        .resolve(&code)
        .await
        .map_err(|e| PlatformError::from_mapping("Note", e))?;

    Ok(Json(NoteView {
        title: mapping.resource.title,
        content: mapping.resource.content,
        created_at: mapping.created_at,
    }))
}

/// Notes saved by the caller
#[utoipa::path(
    get,
    path = "/api/notes/my-notes",
    tag = "notes",
    operation_id = "getMyNotes",
    responses(
        (status = 200, description = "Caller's notes", body = Vec<NoteInfo>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_notes(
    State(state): State<NoteApiState>,
    auth: Authenticated,
) -> Result<Json<Vec<NoteInfo>>> {
    let notes = state
        .service
        .list_for(&auth.subject)
        .await?
        .into_iter()
        .map(|m| NoteInfo {
            id: m.id,
            short_url: state.note_url(&m.code),
            short_code: m.code.into_inner(),
            title: m.resource.title,
            content: m.resource.content,
            views: m.usage_counter,
            created_at: m.created_at,
        })
        .collect();

    Ok(Json(notes))
}

/// Create note router
pub fn note_router(state: NoteApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(save_note))
        .routes(routes!(my_notes))
        .routes(routes!(view_note))
        .with_state(state)
}
