//! Wire format for the chat and signaling gateways.
//!
//! Every frame is a JSON object with a `type` tag. Client frames that fail
//! to parse produce an `error` frame on the offending connection only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::shared::UserSummary;

/// Frames accepted by the chat gateway.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatClientEvent {
    JoinRoom { room_id: i32 },
    LeaveRoom { room_id: i32 },
    GlobalMessage { message_text: String },
    RoomMessage { room_id: i32, message_text: String },
}

/// Frames emitted by the chat gateway.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatServerEvent {
    JoinedRoom {
        room_id: i32,
    },
    LeftRoom {
        room_id: i32,
    },
    GlobalMessage {
        id: i32,
        message_text: String,
        user: UserSummary,
        created_at: DateTime<Utc>,
    },
    RoomMessage {
        id: i32,
        room_id: i32,
        message_text: String,
        user: UserSummary,
        created_at: DateTime<Utc>,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Frames accepted by the signaling gateway.
///
/// The SDP/ICE payloads are relayed verbatim, so they stay opaque
/// `serde_json::Value`s. Field casing inside `offer`/`answer`/`ice-candidate`
/// follows the WebRTC convention used by browser clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalClientEvent {
    JoinRoom {
        room_id: i32,
    },
    LeaveRoom {
        room_id: i32,
    },
    Offer {
        #[serde(rename = "roomId")]
        room_id: i32,
        offer: Value,
    },
    Answer {
        #[serde(rename = "roomId")]
        room_id: i32,
        answer: Value,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        #[serde(rename = "roomId")]
        room_id: i32,
        candidate: Value,
    },
}

/// Frames emitted by the signaling gateway.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalServerEvent {
    JoinedRoom {
        room_id: i32,
    },
    LeftRoom {
        room_id: i32,
    },
    UserJoined {
        #[serde(rename = "userId")]
        user_id: i32,
        #[serde(rename = "userName")]
        user_name: String,
    },
    UserLeft {
        #[serde(rename = "userId")]
        user_id: i32,
    },
    Offer {
        offer: Value,
        from: i32,
    },
    Answer {
        answer: Value,
        from: i32,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        candidate: Value,
        from: i32,
    },
    Error {
        code: String,
        message: String,
    },
}
