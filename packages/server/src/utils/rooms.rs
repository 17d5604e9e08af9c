use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::{room, team_member};
use crate::error::AppError;

/// Look up a room by ID, returning 404 if not found.
pub async fn find_room<C: sea_orm::ConnectionTrait>(
    db: &C,
    room_id: i32,
) -> Result<room::Model, AppError> {
    room::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))
}

/// Look up the room attached to a team.
pub async fn find_room_for_team<C: sea_orm::ConnectionTrait>(
    db: &C,
    team_id: i32,
) -> Result<room::Model, AppError> {
    room::Entity::find()
        .filter(room::Column::TeamId.eq(team_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))
}

/// Verify the user belongs to the team that owns the room.
///
/// This is the single membership gate for room-scoped access. It runs at
/// both the REST boundary (room history, room message create) and the
/// realtime boundary (join_room, room_message), so the two surfaces cannot
/// drift apart. The team leader always has a membership row, created at
/// team creation time.
pub async fn require_room_member<C: sea_orm::ConnectionTrait>(
    db: &C,
    room_id: i32,
    user_id: i32,
) -> Result<room::Model, AppError> {
    let room = find_room(db, room_id).await?;

    let is_member = team_member::Entity::find_by_id((room.team_id, user_id))
        .one(db)
        .await?
        .is_some();
    if !is_member {
        return Err(AppError::PermissionDenied);
    }

    Ok(room)
}
