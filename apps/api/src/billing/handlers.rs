//! Axum route handlers for downloads, upgrades and payment review.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminUser, CurrentUser};
use crate::billing::{downloads, payments};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::templates::TemplateId;

#[derive(Debug, Deserialize)]
pub struct TrackDownloadRequest {
    #[serde(default)]
    pub template: TemplateId,
}

#[derive(Debug, Serialize)]
pub struct TrackDownloadResponse {
    pub downloads: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/auth/track-download
///
/// The body is optional; clients that send none count against the default template.
pub async fn handle_track_download(
    State(state): State<AppState>,
    current: CurrentUser,
    body: Option<Json<TrackDownloadRequest>>,
) -> Result<Json<TrackDownloadResponse>, AppError> {
    let template = body.map(|Json(request)| request.template).unwrap_or_default();
    let downloads = downloads::record_download(
        &state.db,
        current.user.id,
        template,
        state.config.free_download_limit,
    )
    .await??;
    Ok(Json(TrackDownloadResponse { downloads }))
}

/// POST /api/v1/auth/upgrade
pub async fn handle_upgrade(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<UpgradeRequest>,
) -> Result<Json<User>, AppError> {
    let transaction_id = payments::validate_transaction_id(&request.transaction_id)
        .ok_or_else(|| AppError::Validation("transactionId is not valid".to_string()))?;
    let user = payments::submit_upgrade(&state.db, current.user.id, transaction_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

/// GET /api/v1/auth/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(payments::list_users(&state.db).await?))
}

/// POST /api/v1/auth/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<User>, AppError> {
    review(&state, request.user_id, true).await
}

/// POST /api/v1/auth/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<User>, AppError> {
    review(&state, request.user_id, false).await
}

async fn review(state: &AppState, user_id: Uuid, approve: bool) -> Result<Json<User>, AppError> {
    payments::review_payment(&state.db, user_id, approve)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRequest,
        http::Request,
    };

    use super::*;

    #[test]
    fn test_track_download_body_shapes() {
        let empty: TrackDownloadRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.template, TemplateId::default());

        let named: TrackDownloadRequest =
            serde_json::from_str(r#"{"template":"modern-mono"}"#).unwrap();
        assert_eq!(named.template, TemplateId::ModernMono);
    }

    #[tokio::test]
    async fn test_track_download_accepts_a_bodyless_post() {
        let request = Request::post("/api/v1/auth/track-download")
            .body(Body::empty())
            .unwrap();
        let body = Option::<Json<TrackDownloadRequest>>::from_request(request, &())
            .await
            .unwrap();
        assert!(body.is_none());
        let template = body.map(|Json(r)| r.template).unwrap_or_default();
        assert_eq!(template, TemplateId::default());
    }

    #[tokio::test]
    async fn test_track_download_reads_a_json_body() {
        let request = Request::post("/api/v1/auth/track-download")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"template":"modern-mono"}"#))
            .unwrap();
        let body = Option::<Json<TrackDownloadRequest>>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.map(|Json(r)| r.template), Some(TemplateId::ModernMono));
    }
}
