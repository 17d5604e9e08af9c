//! Chat gateway: token-authenticated WebSocket endpoint for the global
//! lobby and per-team rooms.
//!
//! Messages are persisted before fan-out, so every delivered frame
//! corresponds to a stored row and the REST history endpoints can never
//! disagree with what subscribers saw.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use sea_orm::*;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::entity::message;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::message::validate_message_text;
use crate::models::shared::UserSummary;
use crate::state::AppState;
use crate::utils::rooms;
use crate::ws::protocol::{ChatClientEvent, ChatServerEvent};
use crate::ws::registry::{Channel, ConnectionId};
use crate::ws::{SocketAuthQuery, authenticate_handshake};

/// Upgrade handler for `GET /ws/chat`.
pub async fn chat_handler(
    State(state): State<AppState>,
    Query(query): Query<SocketAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let user = match authenticate_handshake(&state, &query, &headers).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let conn_id = state.chat.register(user.user_id, tx);
    // Every chat connection participates in the global lobby.
    state.chat.subscribe(conn_id, Channel::Global);
    info!(user_id = user.user_id, %conn_id, "chat connection opened");

    let forward = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(err) = handle_frame(&state, conn_id, &user, text.as_str()).await {
                    send_error(&state, conn_id, err);
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.chat.unregister(conn_id);
    forward.abort();
    info!(user_id = user.user_id, %conn_id, "chat connection closed");
}

async fn handle_frame(
    state: &AppState,
    conn_id: ConnectionId,
    user: &AuthUser,
    text: &str,
) -> Result<(), AppError> {
    let event: ChatClientEvent = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Malformed event: {e}")))?;

    match event {
        ChatClientEvent::JoinRoom { room_id } => {
            // Membership is re-checked here, not trusted from the handshake.
            rooms::require_room_member(&state.db, room_id, user.user_id).await?;
            state.chat.subscribe(conn_id, Channel::Room(room_id));
            debug!(user_id = user.user_id, room_id, "joined chat room");
            send_event(state, conn_id, &ChatServerEvent::JoinedRoom { room_id })
        }
        ChatClientEvent::LeaveRoom { room_id } => {
            // Idempotent: leaving a room that was never joined still acks.
            state.chat.unsubscribe(conn_id, Channel::Room(room_id));
            debug!(user_id = user.user_id, room_id, "left chat room");
            send_event(state, conn_id, &ChatServerEvent::LeftRoom { room_id })
        }
        ChatClientEvent::GlobalMessage { message_text } => {
            post_global_message(state, user, &message_text).await?;
            Ok(())
        }
        ChatClientEvent::RoomMessage {
            room_id,
            message_text,
        } => {
            post_room_message(state, user, room_id, &message_text).await?;
            Ok(())
        }
    }
}

/// Persist a global lobby message, then fan it out to all chat connections.
///
/// Shared with the REST message-create endpoint so both entry points have
/// identical validation, persistence, and broadcast behavior.
pub(crate) async fn post_global_message(
    state: &AppState,
    author: &AuthUser,
    text: &str,
) -> Result<message::Model, AppError> {
    validate_message_text(text)?;

    let model = message::ActiveModel {
        user_id: Set(author.user_id),
        message_text: Set(text.trim().to_owned()),
        room_id: Set(None),
        is_global: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let frame = encode(&ChatServerEvent::GlobalMessage {
        id: model.id,
        message_text: model.message_text.clone(),
        user: UserSummary {
            id: author.user_id,
            email: author.email.clone(),
            full_name: author.full_name.clone(),
        },
        created_at: model.created_at,
    })?;
    state.chat.broadcast(Channel::Global, &frame);

    Ok(model)
}

/// Persist a room message after re-verifying membership, then fan it out to
/// the room's subscribers.
pub(crate) async fn post_room_message(
    state: &AppState,
    author: &AuthUser,
    room_id: i32,
    text: &str,
) -> Result<message::Model, AppError> {
    validate_message_text(text)?;
    rooms::require_room_member(&state.db, room_id, author.user_id).await?;

    let model = message::ActiveModel {
        user_id: Set(author.user_id),
        message_text: Set(text.trim().to_owned()),
        room_id: Set(Some(room_id)),
        is_global: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let frame = encode(&ChatServerEvent::RoomMessage {
        id: model.id,
        room_id,
        message_text: model.message_text.clone(),
        user: UserSummary {
            id: author.user_id,
            email: author.email.clone(),
            full_name: author.full_name.clone(),
        },
        created_at: model.created_at,
    })?;
    state.chat.broadcast(Channel::Room(room_id), &frame);

    Ok(model)
}

fn send_event(
    state: &AppState,
    conn_id: ConnectionId,
    event: &ChatServerEvent,
) -> Result<(), AppError> {
    let frame = encode(event)?;
    state.chat.send_to(conn_id, &frame);
    Ok(())
}

fn send_error(state: &AppState, conn_id: ConnectionId, err: AppError) {
    let (_, body) = err.status_and_body();
    let event = ChatServerEvent::Error {
        code: body.code.to_owned(),
        message: body.message,
    };
    if let Ok(frame) = serde_json::to_string(&event) {
        state.chat.send_to(conn_id, &frame);
    }
}

fn encode(event: &ChatServerEvent) -> Result<String, AppError> {
    serde_json::to_string(event).map_err(|e| AppError::Internal(e.to_string()))
}
