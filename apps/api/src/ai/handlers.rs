//! Stateless AI endpoints. Each call takes the document in the request and
//! returns the model's answer without touching any editing session.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::ai::{AtsFeedback, ExtractedResume};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Base64 file contents.
    #[serde(alias = "base64Data")]
    pub file_data: String,
    pub mime_type: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureTextRequest {
    #[serde(alias = "pastedText")]
    pub text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveRequest {
    #[serde(alias = "currentHtml")]
    pub html: String,
    pub instruction: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(alias = "currentHtml")]
    pub html: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(alias = "resumeText")]
    pub text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct HtmlResponse {
    pub html: String,
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ai/convert
pub async fn handle_convert(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ExtractedResume>, AppError> {
    require(&request.file_data, "fileData")?;
    let resume = state
        .ai
        .convert(&request.file_data, &request.mime_type, &request.job_description)
        .await?;
    Ok(Json(resume))
}

/// POST /api/v1/ai/text
pub async fn handle_structure_text(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<StructureTextRequest>,
) -> Result<Json<ExtractedResume>, AppError> {
    require(&request.text, "text")?;
    let resume = state
        .ai
        .structure_from_text(&request.text, &request.job_description)
        .await?;
    Ok(Json(resume))
}

/// POST /api/v1/ai/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<HtmlResponse>, AppError> {
    require(&request.html, "html")?;
    require(&request.instruction, "instruction")?;
    let html = state
        .ai
        .improve(&request.html, &request.instruction, &request.job_description)
        .await?;
    Ok(Json(HtmlResponse { html }))
}

/// POST /api/v1/ai/reorder
pub async fn handle_reorder(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<HtmlResponse>, AppError> {
    require(&request.html, "html")?;
    require(&request.job_description, "jobDescription")?;
    let html = state
        .ai
        .reorder_sections(&request.html, &request.job_description)
        .await?;
    Ok(Json(HtmlResponse { html }))
}

/// POST /api/v1/ai/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<AtsFeedback>, AppError> {
    require(&request.text, "text")?;
    let feedback = state
        .ai
        .score_for_ats(&request.text, &request.job_description)
        .await?;
    Ok(Json(feedback.clamped()))
}
