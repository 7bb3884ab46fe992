//! Company membership and invitations.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{delete, get, patch, post},
};
use db::models::{
    profile::{Profile, UserRole},
    team_invitation::{AcceptTeamInvitation, CreateTeamInvitation, TeamInvitation},
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Session, Tenant},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateMemberRole {
    pub role: UserRole,
}

/// Loads another member of the caller's company that the caller may manage.
async fn managed_member(
    deployment: &DeploymentImpl,
    tenant: &Tenant,
    profile_id: Uuid,
) -> Result<Profile, ApiError> {
    tenant.require_manager()?;
    if profile_id == tenant.user_id {
        return Err(ApiError::bad_request("you cannot change your own membership"));
    }
    let member = server_timing::db(Profile::find_member(
        &deployment.db().pool,
        profile_id,
        tenant.company_id,
    ))
    .await?
    .ok_or(ApiError::NotFound("Team member"))?;
    if member.role == UserRole::Owner {
        return Err(ApiError::bad_request("the company owner cannot be changed"));
    }
    Ok(member)
}

pub async fn get_team(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<Profile>>>, ApiError> {
    let members =
        server_timing::db(Profile::find_by_company(&deployment.db().pool, tenant.company_id))
            .await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn update_member_role(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(profile_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMemberRole>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    if payload.role == UserRole::Owner {
        return Err(ApiError::bad_request("the owner role cannot be assigned"));
    }
    let member = managed_member(&deployment, &tenant, profile_id).await?;
    let member = server_timing::db(Profile::update_role(
        &deployment.db().pool,
        member.id,
        tenant.company_id,
        payload.role,
    ))
    .await?
    .ok_or(ApiError::NotFound("Team member"))?;
    info!(
        company_id = %tenant.company_id,
        profile_id = %member.id,
        role = %member.role,
        "Member role changed"
    );
    Ok(ResponseJson(ApiResponse::success(member)))
}

/// Detaches a member from the company. Their profile survives.
pub async fn remove_member(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(profile_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let member = managed_member(&deployment, &tenant, profile_id).await?;
    server_timing::db(Profile::set_membership(
        &deployment.db().pool,
        member.id,
        None,
        UserRole::Technician,
    ))
    .await?;
    info!(company_id = %tenant.company_id, profile_id = %member.id, "Member removed");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_invitations(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<TeamInvitation>>>, ApiError> {
    tenant.require_manager()?;
    let invitations = server_timing::db(TeamInvitation::find_by_company(
        &deployment.db().pool,
        tenant.company_id,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(invitations)))
}

pub async fn create_invitation(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateTeamInvitation>,
) -> Result<ResponseJson<ApiResponse<TeamInvitation>>, ApiError> {
    tenant.require_manager()?;
    let issued = deployment.invitations().create(&tenant.0, &payload).await?;

    deployment
        .track_event(
            "invitation_created",
            serde_json::json!({
                "company_id": tenant.company_id.to_string(),
                "role": issued.invitation.role.to_string(),
            }),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(issued.invitation)))
}

pub async fn revoke_invitation(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<TeamInvitation>>, ApiError> {
    tenant.require_manager()?;
    let invitation = deployment.invitations().revoke(&tenant.0, id).await?;
    Ok(ResponseJson(ApiResponse::success(invitation)))
}

/// Joins the caller to the inviting company. Needs a session, not a tenant.
pub async fn accept_invitation(
    State(deployment): State<DeploymentImpl>,
    session: Session,
    ApiJson(payload): ApiJson<AcceptTeamInvitation>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile = deployment
        .invitations()
        .accept(&session.profile, &payload.token)
        .await?;

    deployment
        .track_event(
            "invitation_accepted",
            serde_json::json!({
                "company_id": profile.company_id.map(|id| id.to_string()),
            }),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/team", get(get_team))
        .route(
            "/team/invitations",
            get(get_invitations).post(create_invitation),
        )
        .route("/team/invitations/{id}", delete(revoke_invitation))
        .route(
            "/team/{id}",
            patch(update_member_role).delete(remove_member),
        )
        .route("/invitations/accept", post(accept_invitation))
}
