use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{message, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::message::{CreateMessageRequest, MessageListResponse, MessageResponse};
use crate::models::shared::UserSummary;
use crate::state::AppState;
use crate::utils::rooms;
use crate::ws::chat;

/// Most recent messages returned by the global history endpoint.
const GLOBAL_HISTORY_LIMIT: u64 = 100;

/// Get recent global lobby messages, oldest first.
#[utoipa::path(
    get,
    path = "/global",
    tag = "Messages",
    operation_id = "listGlobalMessages",
    summary = "Get global chat history",
    description = "Returns the 100 most recent global messages in chronological order.",
    responses(
        (status = 200, description = "Global messages", body = MessageListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_global_messages(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageListResponse>, AppError> {
    let rows = message::Entity::find()
        .filter(message::Column::IsGlobal.eq(true))
        .find_also_related(user::Entity)
        .order_by_desc(message::Column::CreatedAt)
        .limit(GLOBAL_HISTORY_LIMIT)
        .all(&state.db)
        .await?;

    let mut data: Vec<MessageResponse> = rows
        .into_iter()
        .filter_map(|(msg, user)| {
            user.map(|u| MessageResponse::from_parts(msg, UserSummary::from(u)))
        })
        .collect();
    data.reverse();

    Ok(Json(MessageListResponse { data }))
}

/// Get a room's message history, oldest first. Members only.
#[utoipa::path(
    get,
    path = "/room/{room_id}",
    tag = "Messages",
    operation_id = "listRoomMessages",
    summary = "Get room chat history",
    params(("room_id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room messages", body = MessageListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member of the room's team (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, room_id))]
pub async fn list_room_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<MessageListResponse>, AppError> {
    rooms::require_room_member(&state.db, room_id, auth_user.user_id).await?;

    let rows = message::Entity::find()
        .filter(message::Column::RoomId.eq(room_id))
        .find_also_related(user::Entity)
        .order_by_asc(message::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .filter_map(|(msg, user)| {
            user.map(|u| MessageResponse::from_parts(msg, UserSummary::from(u)))
        })
        .collect();

    Ok(Json(MessageListResponse { data }))
}

/// Create a message over REST.
///
/// Alternate entry to the chat gateway's message events: same validation,
/// same persistence, and the stored message is broadcast to connected
/// chat subscribers exactly as if it had arrived over the socket.
#[utoipa::path(
    post,
    path = "/",
    tag = "Messages",
    operation_id = "createMessage",
    summary = "Send a message",
    description = "Sends a global message when `is_global` is true, otherwise a message to `room_id`. Exactly one of the two must be chosen.",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created and broadcast", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member of the room's team (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = if payload.is_global {
        chat::post_global_message(&state, &auth_user, &payload.message_text).await?
    } else {
        let room_id = payload.room_id.ok_or_else(|| {
            AppError::Validation("Either room_id or is_global must be provided".into())
        })?;
        chat::post_room_message(&state, &auth_user, room_id, &payload.message_text).await?
    };

    let user = UserSummary {
        id: auth_user.user_id,
        email: auth_user.email,
        full_name: auth_user.full_name,
    };

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::from_parts(model, user)),
    ))
}
