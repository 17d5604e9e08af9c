use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{room, team, team_member, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::UserSummary;
use crate::models::team::{
    CreateTeamRequest, JoinTeamRequest, JoinTeamResponse, LeaveTeamResponse, RoomSummary,
    TeamDetailResponse, TeamResponse, validate_create_team_request, validate_join_team_request,
};
use crate::state::AppState;
use crate::utils::invite;

/// Maximum members per team, leader included.
pub const TEAM_CAPACITY: u64 = 5;

/// Create a team for a competition.
///
/// The creator becomes leader, gets a membership row like any other member,
/// and the team's collaboration room is created in the same transaction.
#[utoipa::path(
    post,
    path = "/create",
    tag = "Teams",
    operation_id = "createTeam",
    summary = "Create a team",
    description = "Creates a team led by the caller, together with its invite code and collaboration room. Requires a qualified and approved account. A user can lead at most one team per competition.",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not qualified or not approved (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Caller already leads a team in this competition (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_qualified()?;
    validate_create_team_request(&payload)?;

    let name = payload.name.trim().to_string();
    let now = chrono::Utc::now();

    let txn = state.db.begin().await?;

    let existing = team::Entity::find()
        .filter(team::Column::LeaderId.eq(auth_user.user_id))
        .filter(team::Column::CompetitionId.eq(payload.competition_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You already lead a team in this competition".into(),
        ));
    }

    let invite_code = invite::generate_invite_code(&txn).await?;

    let team_model = team::ActiveModel {
        competition_id: Set(payload.competition_id),
        name: Set(name.clone()),
        leader_id: Set(auth_user.user_id),
        invite_code: Set(invite_code),
        is_locked: Set(false),
        is_complete: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // The leader occupies a regular membership slot.
    team_member::ActiveModel {
        team_id: Set(team_model.id),
        user_id: Set(auth_user.user_id),
        joined_at: Set(now),
    }
    .insert(&txn)
    .await?;

    room::ActiveModel {
        team_id: Set(team_model.id),
        name: Set(format!("{} Room", name)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(team_model))))
}

/// Join a team via invite code.
///
/// The team row is locked for the duration of the transaction, so
/// concurrent joins against the same team serialize and the capacity check
/// cannot be raced past.
#[utoipa::path(
    post,
    path = "/join",
    tag = "Teams",
    operation_id = "joinTeam",
    summary = "Join a team by invite code",
    request_body = JoinTeamRequest,
    responses(
        (status = 200, description = "Joined the team", body = JoinTeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not qualified or not approved (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No team with this invite code (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team locked, full, or already joined (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn join_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<JoinTeamRequest>,
) -> Result<Json<JoinTeamResponse>, AppError> {
    auth_user.require_qualified()?;
    validate_join_team_request(&payload)?;

    let code = payload.invite_code.trim().to_uppercase();

    let txn = state.db.begin().await?;

    let mut team_model = find_team_by_code_for_update(&txn, &code).await?;

    if team_model.is_locked {
        return Err(AppError::Conflict("Team is locked".into()));
    }

    let already_member = team_member::Entity::find_by_id((team_model.id, auth_user.user_id))
        .one(&txn)
        .await?
        .is_some();
    if already_member {
        return Err(AppError::Conflict(
            "You are already a member of this team".into(),
        ));
    }

    let member_count = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_model.id))
        .count(&txn)
        .await?;

    // A team can be at capacity while unlocked (a leave unlocks it without
    // recounting). Re-lock it and reject.
    if member_count >= TEAM_CAPACITY {
        let mut active: team::ActiveModel = team_model.into();
        active.is_locked = Set(true);
        active.is_complete = Set(true);
        active.update(&txn).await?;
        txn.commit().await?;
        return Err(AppError::Conflict("Team is full".into()));
    }

    team_member::ActiveModel {
        team_id: Set(team_model.id),
        user_id: Set(auth_user.user_id),
        joined_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You are already a member of this team".into())
        }
        _ => AppError::from(e),
    })?;

    if member_count + 1 >= TEAM_CAPACITY {
        let mut active: team::ActiveModel = team_model.into();
        active.is_locked = Set(true);
        active.is_complete = Set(true);
        team_model = active.update(&txn).await?;
    }

    txn.commit().await?;

    Ok(Json(JoinTeamResponse {
        message: "Successfully joined team".into(),
        team: TeamResponse::from(team_model),
    }))
}

/// Leave a team.
#[utoipa::path(
    delete,
    path = "/{id}/leave",
    tag = "Teams",
    operation_id = "leaveTeam",
    summary = "Leave a team",
    description = "Removes the caller's membership. The leader cannot leave. Leaving a locked team unlocks it and clears the complete flag so the freed slot can be refilled.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Left the team", body = LeaveTeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Leader cannot leave (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found or caller not a member (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, team_id))]
pub async fn leave_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
) -> Result<Json<LeaveTeamResponse>, AppError> {
    let txn = state.db.begin().await?;

    let team_model = find_team_for_update(&txn, team_id).await?;

    if team_model.leader_id == auth_user.user_id {
        return Err(AppError::LeaderCannotLeave);
    }

    let membership = team_member::Entity::find_by_id((team_id, auth_user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("You are not a member of this team".into()))?;

    let active: team_member::ActiveModel = membership.into();
    active.delete(&txn).await?;

    // Any departure reopens the team.
    if team_model.is_locked || team_model.is_complete {
        let mut active: team::ActiveModel = team_model.into();
        active.is_locked = Set(false);
        active.is_complete = Set(false);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    Ok(Json(LeaveTeamResponse {
        message: "Left team successfully".into(),
    }))
}

/// Get the caller's team for any competition, with roster and room.
#[utoipa::path(
    get,
    path = "/my-team",
    tag = "Teams",
    operation_id = "getMyTeam",
    summary = "Get the caller's team",
    responses(
        (status = 200, description = "Team details with members and room", body = TeamDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Caller has no team (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_my_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TeamDetailResponse>, AppError> {
    let team_model = team::Entity::find()
        .filter(
            Condition::any()
                .add(team::Column::LeaderId.eq(auth_user.user_id))
                .add(
                    team::Column::Id.in_subquery(
                        SeaQuery::select()
                            .column(team_member::Column::TeamId)
                            .from(team_member::Entity)
                            .and_where(team_member::Column::UserId.eq(auth_user.user_id))
                            .to_owned(),
                    ),
                ),
        )
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You are not in a team".into()))?;

    let members: Vec<UserSummary> = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_model.id))
        .find_also_related(user::Entity)
        .order_by_asc(team_member::Column::JoinedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(_, user)| user.map(UserSummary::from))
        .collect();

    let room_model = room::Entity::find()
        .filter(room::Column::TeamId.eq(team_model.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

    Ok(Json(TeamDetailResponse {
        team: TeamResponse::from(team_model),
        members,
        room: RoomSummary::from(room_model),
    }))
}

/// Fetch a team by ID with a row lock, returning 404 if it doesn't exist.
async fn find_team_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<team::Model, AppError> {
    use sea_orm::sea_query::LockType;
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

/// Fetch a team by invite code with a row lock. Concurrent joiners queue on
/// this lock; whoever holds it sees an up-to-date member count.
async fn find_team_by_code_for_update(
    txn: &DatabaseTransaction,
    invite_code: &str,
) -> Result<team::Model, AppError> {
    use sea_orm::sea_query::LockType;
    team::Entity::find()
        .filter(team::Column::InviteCode.eq(invite_code))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}
