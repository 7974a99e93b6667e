pub mod health;
pub mod templates;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{ai, auth, billing, resumes, workspace};

/// Uploads are capped at 10MB of file data; leave room for multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates", get(templates::catalog_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handlers::handle_register))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/logout", get(auth::handlers::handle_logout))
        .route("/api/v1/auth/me", get(auth::handlers::handle_me))
        // Billing
        .route(
            "/api/v1/auth/track-download",
            post(billing::handlers::handle_track_download),
        )
        .route("/api/v1/auth/upgrade", post(billing::handlers::handle_upgrade))
        .route("/api/v1/auth/users", get(billing::handlers::handle_list_users))
        .route("/api/v1/auth/approve", post(billing::handlers::handle_approve))
        .route("/api/v1/auth/reject", post(billing::handlers::handle_reject))
        // Stateless AI
        .route("/api/v1/ai/convert", post(ai::handlers::handle_convert))
        .route("/api/v1/ai/text", post(ai::handlers::handle_structure_text))
        .route("/api/v1/ai/improve", post(ai::handlers::handle_improve))
        .route("/api/v1/ai/reorder", post(ai::handlers::handle_reorder))
        .route("/api/v1/ai/feedback", post(ai::handlers::handle_feedback))
        // Saved resumes
        .route(
            "/api/v1/resumes",
            post(resumes::handlers::handle_save).get(resumes::handlers::handle_list),
        )
        .route("/api/v1/resumes/:id", get(resumes::handlers::handle_get))
        // Editing sessions
        .route("/api/v1/sessions", post(workspace::handlers::handle_create))
        .route(
            "/api/v1/sessions/:id",
            get(workspace::handlers::handle_get).delete(workspace::handlers::handle_delete),
        )
        .route(
            "/api/v1/sessions/:id/upload",
            post(workspace::handlers::handle_upload),
        )
        .route(
            "/api/v1/sessions/:id/text",
            post(workspace::handlers::handle_submit_text),
        )
        .route(
            "/api/v1/sessions/:id/job-description",
            put(workspace::handlers::handle_job_description),
        )
        .route(
            "/api/v1/sessions/:id/template",
            put(workspace::handlers::handle_template),
        )
        .route(
            "/api/v1/sessions/:id/reorder",
            post(workspace::handlers::handle_reorder),
        )
        .route(
            "/api/v1/sessions/:id/improve",
            post(workspace::handlers::handle_improve),
        )
        .route(
            "/api/v1/sessions/:id/feedback",
            post(workspace::handlers::handle_feedback),
        )
        .route(
            "/api/v1/sessions/:id/photo",
            post(workspace::handlers::handle_upload_photo)
                .delete(workspace::handlers::handle_remove_photo),
        )
        .route(
            "/api/v1/sessions/:id/photo/offset",
            put(workspace::handlers::handle_move_photo),
        )
        .route(
            "/api/v1/sessions/:id/editor",
            post(workspace::handlers::handle_editor),
        )
        .route(
            "/api/v1/sessions/:id/events",
            post(workspace::handlers::handle_event),
        )
        .route(
            "/api/v1/sessions/:id/export",
            post(workspace::handlers::handle_export),
        )
        .route(
            "/api/v1/sessions/:id/upsell",
            delete(workspace::handlers::handle_dismiss_upsell),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_s3::config::{BehaviorVersion, Region};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::ai::mock::MockAi;
    use crate::config::test_config;
    use crate::workspace::SessionRegistry;

    /// State whose backing stores are never contacted by these tests.
    fn offline_state() -> AppState {
        let config = test_config();
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        AppState {
            db: PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            redis: redis::Client::open(config.redis_url.clone()).unwrap(),
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            ai: Arc::new(MockAi::default()),
            config,
            sessions: SessionRegistry::default(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(offline_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-api");
    }

    #[tokio::test]
    async fn test_template_catalog_is_public() {
        let app = build_router(offline_state());
        let response = app
            .oneshot(Request::get("/api/v1/templates").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 15);
        assert_eq!(entries[0]["id"], "sourabh");
        assert_eq!(entries[0]["premium"], false);
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_session_cookie() {
        for (method, uri) in [
            ("GET", "/api/v1/auth/me"),
            ("POST", "/api/v1/sessions"),
            ("GET", "/api/v1/resumes"),
            ("POST", "/api/v1/auth/track-download"),
        ] {
            let app = build_router(offline_state());
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }
}
