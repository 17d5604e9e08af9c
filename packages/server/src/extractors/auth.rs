use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The user row is
/// loaded on every request so qualification and approval flags are always
/// fresh; a token whose user no longer exists is treated as invalid.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    pub is_qualified: bool,
    pub is_approved: bool,
}

impl AuthUser {
    /// Returns `Ok(())` if the user is qualified and approved for team
    /// formation, `Err(PermissionDenied)` otherwise.
    pub fn require_qualified(&self) -> Result<(), AppError> {
        if self.is_qualified && self.is_approved {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl From<user::Model> for AuthUser {
    fn from(user: user::Model) -> Self {
        AuthUser {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_qualified: user.is_qualified,
            is_approved: user.is_approved,
        }
    }
}

/// Verify a bearer token and load the user it belongs to.
///
/// Shared between the HTTP extractor and the WebSocket handshakes so both
/// boundaries apply identical auth rules.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    let user = user::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(AuthUser::from(user))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        authenticate_token(state, token).await
    }
}
