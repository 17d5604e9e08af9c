pub mod chat;
pub mod protocol;
pub mod registry;
pub mod signaling;

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::auth::{AuthUser, authenticate_token};
use crate::state::AppState;

/// Query parameters accepted by both WebSocket handshakes.
#[derive(Deserialize)]
pub struct SocketAuthQuery {
    pub token: Option<String>,
}

/// Authenticate a WebSocket handshake.
///
/// Browsers cannot set headers on WebSocket upgrades, so the token is
/// usually passed as a `?token=` query parameter; an `Authorization` header
/// is accepted as well for non-browser clients.
pub(crate) async fn authenticate_handshake(
    state: &AppState,
    query: &SocketAuthQuery,
    headers: &HeaderMap,
) -> Result<AuthUser, AppError> {
    let header_token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = query
        .token
        .as_deref()
        .or(header_token)
        .ok_or(AppError::TokenMissing)?;

    authenticate_token(state, token).await
}
