use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{room, team};
use crate::error::AppError;
use crate::models::shared::{UserSummary, validate_name};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    #[schema(example = 7)]
    pub competition_id: i32,
    #[schema(example = "Rustaceans")]
    pub name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct JoinTeamRequest {
    #[schema(example = "3F2A9B10C4D5E6F7")]
    pub invite_code: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub competition_id: i32,
    pub name: String,
    pub leader_id: i32,
    pub invite_code: String,
    pub is_locked: bool,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl From<team::Model> for TeamResponse {
    fn from(team: team::Model) -> Self {
        TeamResponse {
            id: team.id,
            competition_id: team.competition_id,
            name: team.name,
            leader_id: team.leader_id,
            invite_code: team.invite_code,
            is_locked: team.is_locked,
            is_complete: team.is_complete,
            created_at: team.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoomSummary {
    pub id: i32,
    pub team_id: i32,
    pub name: String,
}

impl From<room::Model> for RoomSummary {
    fn from(room: room::Model) -> Self {
        RoomSummary {
            id: room.id,
            team_id: room.team_id,
            name: room.name,
        }
    }
}

/// Full team view returned by `GET /teams/my-team`: the team row plus its
/// roster (join order) and collaboration room.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub members: Vec<UserSummary>,
    pub room: RoomSummary,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct JoinTeamResponse {
    pub message: String,
    pub team: TeamResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaveTeamResponse {
    pub message: String,
}

pub fn validate_create_team_request(req: &CreateTeamRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Team name")
}

pub fn validate_join_team_request(req: &JoinTeamRequest) -> Result<(), AppError> {
    if req.invite_code.trim().is_empty() {
        return Err(AppError::Validation("Invite code is required".into()));
    }
    Ok(())
}
