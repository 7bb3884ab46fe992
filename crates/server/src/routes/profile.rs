use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::profile::{Profile, UpdateProfile};
use deployment::Deployment;
use utils::{response::ApiResponse, server_timing};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, Session},
};

/// The caller's profile, provisioned on first request.
pub async fn get_profile(session: Session) -> ResponseJson<ApiResponse<Profile>> {
    ResponseJson(ApiResponse::success(session.profile))
}

pub async fn update_profile(
    State(deployment): State<DeploymentImpl>,
    session: Session,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile = payload.apply(session.profile);
    let profile =
        server_timing::db(Profile::update_details(&deployment.db().pool, &profile)).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/profile", get(get_profile).patch(update_profile))
}
