use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::auth::{sessions, users, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The logged-in user, resolved from the `token` cookie.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Err(AppError::Unauthorized);
        };

        let Some(user_id) = sessions::lookup_session(&state.redis, &token).await? else {
            warn!("Session token missing or expired, authentication denied");
            return Err(AppError::Unauthorized);
        };

        let user = users::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser { user, token })
    }
}

/// A `CurrentUser` whose email is the configured operator address.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if !state.config.is_admin(&user.email) {
            warn!("Non-admin {} attempted an admin action", user.id);
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
