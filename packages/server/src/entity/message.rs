use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chat message. Either `room_id` is set (room message) or `is_global` is
/// true (global lobby message), never both.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub room_id: Option<i32>,
    #[sea_orm(belongs_to, from = "room_id", to = "id")]
    pub room: Option<super::room::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    pub message_text: String,
    pub is_global: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
