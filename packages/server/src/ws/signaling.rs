//! Signaling gateway: relays WebRTC session negotiation between room
//! members without ever interpreting the payloads.
//!
//! Runs on its own connection registry. A user in a chat room is not
//! automatically present in the matching signaling room; call presence is
//! opt-in via `join_room` on this socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;
use crate::utils::rooms;
use crate::ws::protocol::{SignalClientEvent, SignalServerEvent};
use crate::ws::registry::{Channel, ConnectionId};
use crate::ws::{SocketAuthQuery, authenticate_handshake};

/// Upgrade handler for `GET /ws/signaling`.
pub async fn signaling_handler(
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

    let conn_id = state.signaling.register(user.user_id, tx);
    info!(user_id = user.user_id, %conn_id, "signaling connection opened");

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

    // Announce departure to any rooms this connection was still in.
    leave_all(&state, conn_id, &user);
    state.signaling.unregister(conn_id);
    forward.abort();
    info!(user_id = user.user_id, %conn_id, "signaling connection closed");
}

async fn handle_frame(
    state: &AppState,
    conn_id: ConnectionId,
    user: &AuthUser,
    text: &str,
) -> Result<(), AppError> {
    let event: SignalClientEvent = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Malformed event: {e}")))?;

    match event {
        SignalClientEvent::JoinRoom { room_id } => {
            rooms::require_room_member(&state.db, room_id, user.user_id).await?;
            state.signaling.subscribe(conn_id, Channel::Room(room_id));
            debug!(user_id = user.user_id, room_id, "joined signaling room");

            // Existing occupants learn about the newcomer; the newcomer gets
            // an ack so clients can sequence their first offer.
            let joined = encode(&SignalServerEvent::UserJoined {
                user_id: user.user_id,
                user_name: user.full_name.clone(),
            })?;
            state
                .signaling
                .broadcast_except(Channel::Room(room_id), conn_id, &joined);
            send_event(state, conn_id, &SignalServerEvent::JoinedRoom { room_id })
        }
        SignalClientEvent::LeaveRoom { room_id } => {
            leave_room(state, conn_id, user, room_id)?;
            send_event(state, conn_id, &SignalServerEvent::LeftRoom { room_id })
        }
        SignalClientEvent::Offer { room_id, offer } => {
            relay(state, conn_id, user, room_id, RelayKind::Offer(offer))
        }
        SignalClientEvent::Answer { room_id, answer } => {
            relay(state, conn_id, user, room_id, RelayKind::Answer(answer))
        }
        SignalClientEvent::IceCandidate { room_id, candidate } => {
            relay(state, conn_id, user, room_id, RelayKind::IceCandidate(candidate))
        }
    }
}

enum RelayKind {
    Offer(Value),
    Answer(Value),
    IceCandidate(Value),
}

/// Relay a negotiation payload verbatim to everyone else in the room,
/// tagged with the sender's user ID.
///
/// The sender must currently be in the signaling room. This is a registry
/// check, not a database query; room membership was verified against the
/// database when the sender joined.
fn relay(
    state: &AppState,
    conn_id: ConnectionId,
    user: &AuthUser,
    room_id: i32,
    kind: RelayKind,
) -> Result<(), AppError> {
    if !state.signaling.is_subscribed(conn_id, Channel::Room(room_id)) {
        return Err(AppError::PermissionDenied);
    }

    let event = match kind {
        RelayKind::Offer(offer) => SignalServerEvent::Offer {
            offer,
            from: user.user_id,
        },
        RelayKind::Answer(answer) => SignalServerEvent::Answer {
            answer,
            from: user.user_id,
        },
        RelayKind::IceCandidate(candidate) => SignalServerEvent::IceCandidate {
            candidate,
            from: user.user_id,
        },
    };

    let frame = encode(&event)?;
    state
        .signaling
        .broadcast_except(Channel::Room(room_id), conn_id, &frame);
    Ok(())
}

/// Leave one signaling room, announcing departure to remaining occupants.
/// Idempotent: leaving a room that was never joined only acks.
fn leave_room(
    state: &AppState,
    conn_id: ConnectionId,
    user: &AuthUser,
    room_id: i32,
) -> Result<(), AppError> {
    let was_member = state.signaling.is_subscribed(conn_id, Channel::Room(room_id));
    state.signaling.unsubscribe(conn_id, Channel::Room(room_id));

    if was_member {
        let left = encode(&SignalServerEvent::UserLeft {
            user_id: user.user_id,
        })?;
        state.signaling.broadcast(Channel::Room(room_id), &left);
        debug!(user_id = user.user_id, room_id, "left signaling room");
    }
    Ok(())
}

fn leave_all(state: &AppState, conn_id: ConnectionId, user: &AuthUser) {
    if let Ok(left) = serde_json::to_string(&SignalServerEvent::UserLeft {
        user_id: user.user_id,
    }) {
        // Unsubscribing first keeps the departing socket out of the fan-out.
        for channel in state.signaling.subscriptions(conn_id) {
            state.signaling.unsubscribe(conn_id, channel);
            if let Channel::Room(_) = channel {
                state.signaling.broadcast(channel, &left);
            }
        }
    }
}

fn send_event(
    state: &AppState,
    conn_id: ConnectionId,
    event: &SignalServerEvent,
) -> Result<(), AppError> {
    let frame = encode(event)?;
    state.signaling.send_to(conn_id, &frame);
    Ok(())
}

fn send_error(state: &AppState, conn_id: ConnectionId, err: AppError) {
    let (_, body) = err.status_and_body();
    let event = SignalServerEvent::Error {
        code: body.code.to_owned(),
        message: body.message,
    };
    if let Ok(frame) = serde_json::to_string(&event) {
        state.signaling.send_to(conn_id, &frame);
    }
}

fn encode(event: &SignalServerEvent) -> Result<String, AppError> {
    serde_json::to_string(event).map_err(|e| AppError::Internal(e.to_string()))
}
