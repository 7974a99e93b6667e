//! Axum route handlers for the Auth API.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::extractor::CurrentUser;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{sessions, users, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("email is not valid".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn me(state: &AppState, user: User) -> MeResponse {
    let is_admin = state.config.is_admin(&user.email);
    MeResponse { user, is_admin }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<MeResponse>), AppError> {
    request.validate()?;
    let email = users::normalize_email(&request.email);

    let user = users::insert(
        &state.db,
        request.name.trim(),
        &email,
        &hash_password(&request.password)?,
    )
    .await?
    .ok_or_else(|| AppError::Validation("An account with this email already exists".to_string()))?;

    let token = sessions::create_session(&state.redis, user.id, state.config.session_ttl_secs).await?;
    info!("Registered user {}", user.id);

    Ok((jar.add(session_cookie(token)), Json(me(&state, user))))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MeResponse>), AppError> {
    let email = users::normalize_email(&request.email);
    let user = users::find_by_email(&state.db, &email)
        .await?
        .filter(|u| verify_password(&request.password, &u.password_hash))
        .ok_or(AppError::Unauthorized)?;

    let token = sessions::create_session(&state.redis, user.id, state.config.session_ttl_secs).await?;
    info!("User {} logged in", user.id);

    Ok((jar.add(session_cookie(token)), Json(me(&state, user))))
}

/// GET /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
    current: CurrentUser,
) -> Result<(CookieJar, Json<LogoutResponse>), AppError> {
    sessions::destroy_session(&state.redis, &current.token).await?;
    info!("User {} logged out", current.user.id);
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(LogoutResponse { message: "Logged out" })))
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(me(&state, current.user)))
}
