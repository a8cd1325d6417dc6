use anyhow::Context;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::ApiError;
use crate::models::User;
use crate::server::AppState;
use crate::services::auth::token_digest;

/// The user behind a valid `Authorization: Bearer <token>` header.
pub struct AuthUser(pub User);

/// Same as [`AuthUser`], but the user must be an admin.
pub struct AdminUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

        let digest = token_digest(&state.config.session_secret, token)?;
        let user = state
            .db
            .get_session_user(&digest)
            .await
            .context("Failed to verify session")?
            .ok_or_else(|| ApiError::Forbidden("Invalid token".to_string()))?;

        Ok(AuthUser(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            log::warn!("🚫 Non-admin user {} tried an admin route", user.id);
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
