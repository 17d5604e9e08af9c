use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub full_name: String,

    /// Cleared the qualification round for the current competition cycle.
    pub is_qualified: bool,
    /// Approved by an organizer after identity review.
    pub is_approved: bool,

    #[sea_orm(has_many, via = "team_member")]
    pub teams: HasMany<super::team::Entity>,

    #[sea_orm(has_many)]
    pub messages: HasMany<super::message::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
