use serde::Serialize;

use crate::entity::user;
use crate::error::AppError;

/// Public view of a user, embedded in team rosters and chat messages.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: i32,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice Chen")]
    pub full_name: String,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        UserSummary {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(name: &str, what: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{what} must be 1-256 characters"
        )));
    }
    Ok(())
}
