use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resumes::{self, NewResume};
use crate::state::AppState;
use crate::templates::TemplateId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResumeRequest {
    pub candidate_name: String,
    #[serde(default)]
    pub template: TemplateId,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub resume: ResumeRow,
    pub html: String,
}

/// POST /api/v1/resumes
pub async fn handle_save(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<SaveResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    if request.html.trim().is_empty() {
        return Err(AppError::Validation("html cannot be empty".to_string()));
    }
    let row = resumes::save_resume(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        NewResume {
            user_id: current.user.id,
            candidate_name: request.candidate_name.trim(),
            template: request.template,
            html: &request.html,
        },
    )
    .await?;
    Ok(Json(row))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(resumes::list_resumes(&state.db, current.user.id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = resumes::get_resume(&state.db, current.user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("resume {id} not found")))?;
    let html = resumes::load_body(&state.s3, &state.config.s3_bucket, &resume.s3_key)
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;
    Ok(Json(ResumeDetailResponse { resume, html }))
}
