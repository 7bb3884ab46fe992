use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::chemical_addition::{ChemicalAddition, CreateChemicalAddition};
use deployment::Deployment;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::service_visits::load_service;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

pub async fn get_chemical_additions(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<ChemicalAddition>>>, ApiError> {
    let pool = &deployment.db().pool;
    let service = load_service(pool, service_id, tenant.company_id).await?;
    let additions = server_timing::db(ChemicalAddition::find_by_service(pool, service.id)).await?;
    Ok(ResponseJson(ApiResponse::success(additions)))
}

pub async fn create_chemical_addition(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(service_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateChemicalAddition>,
) -> Result<ResponseJson<ApiResponse<ChemicalAddition>>, ApiError> {
    let pool = &deployment.db().pool;
    let service = load_service(pool, service_id, tenant.company_id).await?;
    payload.validate()?;
    let addition =
        server_timing::db(ChemicalAddition::create(pool, service.id, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(addition)))
}

pub async fn delete_chemical_addition(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let addition =
        server_timing::db(ChemicalAddition::find_by_id_for_company(pool, id, tenant.company_id))
            .await?
            .ok_or(ApiError::NotFound("Chemical addition"))?;
    server_timing::db(ChemicalAddition::delete(pool, addition.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/services/{id}/chemicals",
            get(get_chemical_additions).post(create_chemical_addition),
        )
        .route("/chemical-additions/{id}", delete(delete_chemical_addition))
}
