use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::message;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for global chat history:
    // SELECT * FROM message WHERE is_global = true ORDER BY created_at DESC LIMIT 100
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_message_global_created")
        .table(message::Entity)
        .col(message::Column::IsGlobal)
        .col(message::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_message_global_created exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_message_global_created: {}", e);
        }
    }

    // Composite index for room chat history:
    // SELECT * FROM message WHERE room_id = ? ORDER BY created_at ASC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_message_room_created")
        .table(message::Entity)
        .col(message::Column::RoomId)
        .col(message::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_message_room_created exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_message_room_created: {}", e);
        }
    }

    Ok(())
}
