//! Axum route handlers for editing sessions.
//!
//! Every action answers with the full session view. Notices and remote
//! failures are reported as `ok: false` plus the queued toast, the way the
//! client surfaces them; only auth, ownership and malformed requests map to
//! HTTP errors.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::billing::DownloadGate;
use crate::deterrence::{suppress_context_menu, KeyChord, KeyVerdict};
use crate::editor::{ClickOutcome, TextSpan};
use crate::errors::AppError;
use crate::export::PhotoOffset;
use crate::state::AppState;
use crate::templates::TemplateId;
use crate::workspace::registry::SharedWorkspace;
use crate::workspace::{ActionError, WorkspaceView};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session: WorkspaceView,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub template: TemplateId,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    /// Position in the session's feedback `improvements`.
    pub index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    pub data_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EditorAction {
    Select { start: usize, end: usize },
    ClearSelection,
    Exec { command: String, value: Option<String> },
    OpenLink,
    SetLinkUrl { url: String },
    CommitLink { url: String },
    CancelLink,
    RemoveLink,
    Click { path: Vec<usize> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorResponse {
    #[serde(flatten)]
    pub action: ActionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    Key(KeyChord),
    Focus { focused: bool },
    ContextMenu,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Whether the client should prevent the event's default action.
    pub prevent_default: bool,
    pub blurred: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequestBody {
    /// Style sheets active on the client page, inlined into the document.
    #[serde(default)]
    pub styles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    #[serde(flatten)]
    pub action: ActionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn session(state: &AppState, id: Uuid, current: &CurrentUser) -> Result<SharedWorkspace, AppError> {
    state
        .sessions
        .get(id, current.user.id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id} not found")))
}

fn respond<T>(result: Result<T, ActionError>, session: WorkspaceView) -> ActionResponse {
    match result {
        Ok(_) => ActionResponse {
            ok: true,
            error: None,
            session,
        },
        Err(e) => {
            debug!("Session action did not go through: {e}");
            ActionResponse {
                ok: false,
                error: Some(e.to_string()),
                session,
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<WorkspaceView>, AppError> {
    let (_, ws) = state.sessions.create(current.user.id).await;
    let view = ws.lock().await.view();
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkspaceView>, AppError> {
    let ws = session(&state, id, &current).await?;
    let view = ws.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.sessions.remove(id, current.user.id).await {
        return Err(AppError::NotFound(format!("session {id} not found")));
    }
    Ok(Json(serde_json::json!({ "closed": id })))
}

/// POST /api/v1/sessions/:id/upload (multipart, field `file`)
pub async fn handle_upload(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("invalid upload: {e}")))?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(
                "File too large. Maximum size is 10MB".to_string(),
            ));
        }
        upload = Some((mime_type, STANDARD.encode(&data)));
    }
    let (mime_type, document) =
        upload.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;

    let mut ws = ws.lock().await;
    let result = ws.upload_resume(state.ai.as_ref(), &document, &mime_type).await;
    Ok(Json(respond(result, ws.view())))
}

/// POST /api/v1/sessions/:id/text
pub async fn handle_submit_text(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws.submit_text(state.ai.as_ref(), &request.text).await;
    Ok(Json(respond(result, ws.view())))
}

/// PUT /api/v1/sessions/:id/job-description
pub async fn handle_job_description(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<JobDescriptionRequest>,
) -> Result<Json<WorkspaceView>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    ws.set_job_description(&request.job_description);
    Ok(Json(ws.view()))
}

/// PUT /api/v1/sessions/:id/template
pub async fn handle_template(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<WorkspaceView>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    ws.set_template(request.template);
    Ok(Json(ws.view()))
}

/// POST /api/v1/sessions/:id/reorder
pub async fn handle_reorder(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws.smart_reorder(state.ai.as_ref()).await;
    Ok(Json(respond(result, ws.view())))
}

/// POST /api/v1/sessions/:id/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws
        .apply_improvement(state.ai.as_ref(), request.index, current.user.is_premium)
        .await;
    Ok(Json(respond(result, ws.view())))
}

/// POST /api/v1/sessions/:id/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws.refresh_feedback(state.ai.as_ref()).await;
    Ok(Json(respond(result, ws.view())))
}

/// POST /api/v1/sessions/:id/photo
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PhotoRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws.upload_photo(&request.data_url);
    Ok(Json(respond(result, ws.view())))
}

/// PUT /api/v1/sessions/:id/photo/offset
pub async fn handle_move_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(offset): Json<PhotoOffset>,
) -> Result<Json<ActionResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    let result = ws.move_photo(offset);
    Ok(Json(respond(result, ws.view())))
}

/// DELETE /api/v1/sessions/:id/photo
pub async fn handle_remove_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkspaceView>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    ws.remove_photo();
    Ok(Json(ws.view()))
}

/// POST /api/v1/sessions/:id/editor
pub async fn handle_editor(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(action): Json<EditorAction>,
) -> Result<Json<EditorResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;

    let mut click = None;
    let result: Result<(), ActionError> = match action {
        EditorAction::Select { start, end } => {
            ws.select(Some(TextSpan::new(start, end)));
            Ok(())
        }
        EditorAction::ClearSelection => {
            ws.select(None);
            Ok(())
        }
        EditorAction::Exec { command, value } => ws.exec(&command, value.as_deref()).map(drop),
        EditorAction::OpenLink => ws.open_link_editor(),
        EditorAction::SetLinkUrl { url } => ws.set_link_url(&url),
        EditorAction::CommitLink { url } => ws.commit_link(&url).map(drop),
        EditorAction::CancelLink => {
            ws.cancel_link();
            Ok(())
        }
        EditorAction::RemoveLink => {
            ws.remove_link();
            Ok(())
        }
        EditorAction::Click { path } => {
            click = Some(ws.click(&path));
            Ok(())
        }
    };

    Ok(Json(EditorResponse {
        action: respond(result, ws.view()),
        click,
    }))
}

/// POST /api/v1/sessions/:id/events
pub async fn handle_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(event): Json<SessionEvent>,
) -> Result<Json<EventResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;

    let prevent_default = match event {
        SessionEvent::Key(chord) => ws.key_pressed(&chord) == KeyVerdict::Suppress,
        SessionEvent::Focus { focused } => {
            ws.focus_changed(focused);
            false
        }
        SessionEvent::ContextMenu => suppress_context_menu(),
    };

    Ok(Json(EventResponse {
        prevent_default,
        blurred: ws.is_blurred(),
    }))
}

/// POST /api/v1/sessions/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ExportRequestBody>>,
) -> Result<Json<ExportResponse>, AppError> {
    let ws = session(&state, id, &current).await?;
    let styles = body.map(|Json(b)| b.styles).unwrap_or_default();
    let gate = DownloadGate {
        pool: state.db.clone(),
        user_id: current.user.id,
        limit: state.config.free_download_limit,
    };

    let mut ws = ws.lock().await;
    let result = ws.export(&gate, styles).await;
    let document = result.as_ref().ok().map(|ctx| ctx.document.clone());
    Ok(Json(ExportResponse {
        action: respond(result, ws.view()),
        document,
    }))
}

/// DELETE /api/v1/sessions/:id/upsell
pub async fn handle_dismiss_upsell(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkspaceView>, AppError> {
    let ws = session(&state, id, &current).await?;
    let mut ws = ws.lock().await;
    ws.dismiss_upsell();
    Ok(Json(ws.view()))
}
