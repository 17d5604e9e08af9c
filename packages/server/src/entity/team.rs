use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Competition this team was formed for. Competitions live in a separate
    /// service, so this is a plain foreign identifier.
    pub competition_id: i32,
    pub name: String,

    /// Always present in `team_member` as well; the leader occupies a
    /// regular roster slot.
    pub leader_id: i32,

    #[sea_orm(unique)]
    pub invite_code: String,

    pub is_locked: bool,
    pub is_complete: bool,

    #[sea_orm(has_many, via = "team_member")]
    pub members: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
