use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::template::{CreateTemplate, Template, UpdateTemplate};
use deployment::Deployment;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

pub async fn get_templates(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<Template>>>, ApiError> {
    let templates =
        server_timing::db(Template::find_by_company(&deployment.db().pool, tenant.company_id))
            .await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn create_template(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateTemplate>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    payload.validate()?;
    let template = server_timing::db(Template::create(
        &deployment.db().pool,
        tenant.company_id,
        &payload,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn get_template(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    let template = server_timing::db(Template::find_by_id_for_company(
        &deployment.db().pool,
        id,
        tenant.company_id,
    ))
    .await?
    .ok_or(ApiError::NotFound("Template"))?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn update_template(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTemplate>,
) -> Result<ResponseJson<ApiResponse<Template>>, ApiError> {
    let pool = &deployment.db().pool;
    let existing = server_timing::db(Template::find_by_id_for_company(pool, id, tenant.company_id))
        .await?
        .ok_or(ApiError::NotFound("Template"))?;
    let template = payload.apply(existing);
    template.validate()?;
    let template = server_timing::db(Template::update(pool, &template)).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn delete_template(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows =
        server_timing::db(Template::delete(&deployment.db().pool, id, tenant.company_id)).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Template"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/templates", get(get_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template).patch(update_template).delete(delete_template),
        )
}
