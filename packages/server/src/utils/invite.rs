use rand::Rng;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::team;
use crate::error::AppError;

/// Invite codes are 8 random bytes rendered as 16 uppercase hex characters.
const INVITE_CODE_BYTES: usize = 8;

/// Collision retry budget. With 64 bits of entropy collisions are
/// effectively impossible, the loop exists so a hit cannot surface as a
/// unique-constraint error to the client.
const MAX_ATTEMPTS: u32 = 8;

/// Generate an invite code that is not yet used by any team.
pub async fn generate_invite_code<C: sea_orm::ConnectionTrait>(db: &C) -> Result<String, AppError> {
    for _ in 0..MAX_ATTEMPTS {
        let bytes: [u8; INVITE_CODE_BYTES] = rand::rng().random();
        let code = hex::encode_upper(bytes);

        let taken = team::Entity::find()
            .filter(team::Column::InviteCode.eq(&code))
            .one(db)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
    }
    Err(AppError::Internal(
        "Failed to generate a unique invite code".into(),
    ))
}
