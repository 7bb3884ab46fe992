use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::company::{Company, CreateCompany, UpdateCompany};
use deployment::Deployment;
use tracing::info;
use utils::{response::ApiResponse, server_timing};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, Session, Tenant},
};

/// Creates a company and makes the caller its owner.
pub async fn create_company(
    State(deployment): State<DeploymentImpl>,
    session: Session,
    ApiJson(payload): ApiJson<CreateCompany>,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    if session.profile.company_id.is_some() {
        return Err(ApiError::bad_request("user already belongs to a company"));
    }
    payload.validate()?;

    let company = server_timing::db(Company::create_with_owner(
        &deployment.db().pool,
        session.profile.id,
        &payload,
    ))
    .await?;
    info!(company_id = %company.id, user_id = %session.user.user_id, "Company created");

    deployment
        .track_event(
            "company_created",
            serde_json::json!({ "company_id": company.id.to_string() }),
        )
        .await;

    Ok(ResponseJson(ApiResponse::success(company)))
}

pub async fn get_company(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    let company = server_timing::db(Company::find_by_id(&deployment.db().pool, tenant.company_id))
        .await?
        .ok_or(ApiError::NotFound("Company"))?;
    Ok(ResponseJson(ApiResponse::success(company)))
}

pub async fn update_company(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<UpdateCompany>,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    tenant.require_manager()?;
    let pool = &deployment.db().pool;
    let existing = server_timing::db(Company::find_by_id(pool, tenant.company_id))
        .await?
        .ok_or(ApiError::NotFound("Company"))?;

    let company = payload.apply(existing);
    company.validate()?;
    let company = server_timing::db(Company::update(pool, &company)).await?;
    Ok(ResponseJson(ApiResponse::success(company)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/companies", post(create_company))
        .route("/company", get(get_company).patch(update_company))
}
