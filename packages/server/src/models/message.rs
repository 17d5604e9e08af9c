use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::message;
use crate::error::AppError;
use crate::models::shared::UserSummary;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateMessageRequest {
    #[schema(example = "Anyone up for a warmup round?")]
    pub message_text: String,
    /// Target room. Ignored when `is_global` is true.
    pub room_id: Option<i32>,
    /// Send to the global lobby instead of a room.
    #[serde(default)]
    pub is_global: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    pub message_text: String,
    pub user: UserSummary,
    pub room_id: Option<i32>,
    pub is_global: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageResponse {
    pub fn from_parts(message: message::Model, user: UserSummary) -> Self {
        MessageResponse {
            id: message.id,
            message_text: message.message_text,
            user,
            room_id: message.room_id,
            is_global: message.is_global,
            created_at: message.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageListResponse {
    pub data: Vec<MessageResponse>,
}

const MAX_MESSAGE_LEN: usize = 10_000;

pub fn validate_message_text(text: &str) -> Result<(), AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message text is required".into()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}
