use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::{
    equipment::Equipment,
    unit::{CreateUnit, Unit, UpdateUnit},
    water_test::WaterTest,
};
use deployment::Deployment;
use serde::Deserialize;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::properties::load_property;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, ApiQuery, Tenant},
};

const DEFAULT_HISTORY: i64 = 10;
const MAX_HISTORY: i64 = 100;

pub(crate) async fn load_unit(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Unit, ApiError> {
    server_timing::db(Unit::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Unit"))
}

pub async fn get_units(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<Unit>>>, ApiError> {
    let units =
        server_timing::db(Unit::find_by_company(&deployment.db().pool, tenant.company_id)).await?;
    Ok(ResponseJson(ApiResponse::success(units)))
}

pub async fn get_property_units(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Unit>>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    let units = server_timing::db(Unit::find_by_property(pool, property.id)).await?;
    Ok(ResponseJson(ApiResponse::success(units)))
}

pub async fn create_unit(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateUnit>,
) -> Result<ResponseJson<ApiResponse<Unit>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    payload.validate()?;
    let unit = server_timing::db(Unit::create(pool, property.id, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(unit)))
}

pub async fn get_unit(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Unit>>, ApiError> {
    let unit = load_unit(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(unit)))
}

pub async fn update_unit(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUnit>,
) -> Result<ResponseJson<ApiResponse<Unit>>, ApiError> {
    let pool = &deployment.db().pool;
    let unit = payload.apply(load_unit(pool, id, tenant.company_id).await?);
    unit.validate()?;
    let unit = server_timing::db(Unit::update(pool, &unit)).await?;
    Ok(ResponseJson(ApiResponse::success(unit)))
}

pub async fn delete_unit(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let unit = load_unit(pool, id, tenant.company_id).await?;
    server_timing::db(Unit::delete(pool, unit.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_unit_equipment(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Equipment>>>, ApiError> {
    let pool = &deployment.db().pool;
    let unit = load_unit(pool, id, tenant.company_id).await?;
    let equipment = server_timing::db(Equipment::find_by_unit(pool, unit.id)).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Most recent water tests across all of a unit's services.
pub async fn get_unit_water_tests(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<WaterTest>>>, ApiError> {
    let pool = &deployment.db().pool;
    let unit = load_unit(pool, id, tenant.company_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    let tests = server_timing::db(WaterTest::find_recent_by_unit(pool, unit.id, limit)).await?;
    Ok(ResponseJson(ApiResponse::success(tests)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/units", get(get_units))
        .route(
            "/properties/{id}/units",
            get(get_property_units).post(create_unit),
        )
        .route(
            "/units/{id}",
            get(get_unit).patch(update_unit).delete(delete_unit),
        )
        .route("/units/{id}/equipment", get(get_unit_equipment))
        .route("/units/{id}/water-tests", get(get_unit_water_tests))
}
