//! Equipment, its failures and its maintenance history.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::{
    equipment::{CreateEquipment, Equipment, EquipmentFilter, UpdateEquipment},
    equipment_failure::{CreateEquipmentFailure, EquipmentFailure, UpdateEquipmentFailure},
    equipment_maintenance_log::{CreateEquipmentMaintenanceLog, EquipmentMaintenanceLog},
};
use deployment::Deployment;
use sqlx::SqlitePool;
use tracing::{info, warn};
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::references;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, ApiQuery, Tenant},
};

async fn load_equipment(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Equipment, ApiError> {
    server_timing::db(Equipment::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Equipment"))
}

pub async fn get_equipment_list(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<EquipmentFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Equipment>>>, ApiError> {
    let equipment = server_timing::db(Equipment::find_by_company(
        &deployment.db().pool,
        tenant.company_id,
        &filter,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn create_equipment(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateEquipment>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    payload.validate()?;
    let pool = &deployment.db().pool;
    references::unit(pool, tenant.company_id, Some(payload.unit_id)).await?;
    let equipment = server_timing::db(Equipment::create(pool, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn get_equipment(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    let equipment = load_equipment(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn update_equipment(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEquipment>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = payload.apply(load_equipment(pool, id, tenant.company_id).await?);
    equipment.validate()?;
    let equipment = server_timing::db(Equipment::update(pool, &equipment)).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn delete_equipment(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = load_equipment(pool, id, tenant.company_id).await?;
    server_timing::db(Equipment::delete(pool, equipment.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_failures(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<EquipmentFailure>>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = load_equipment(pool, id, tenant.company_id).await?;
    let failures = server_timing::db(EquipmentFailure::find_by_equipment(pool, equipment.id)).await?;
    Ok(ResponseJson(ApiResponse::success(failures)))
}

pub async fn report_failure(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateEquipmentFailure>,
) -> Result<ResponseJson<ApiResponse<EquipmentFailure>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = load_equipment(pool, id, tenant.company_id).await?;
    payload.validate()?;
    let failure = server_timing::db(EquipmentFailure::create(
        pool,
        equipment.id,
        Some(tenant.user_id),
        &payload,
    ))
    .await?;
    warn!(
        company_id = %tenant.company_id,
        equipment_id = %equipment.id,
        severity = %failure.severity,
        "Equipment failure reported"
    );
    Ok(ResponseJson(ApiResponse::success(failure)))
}

/// Edits a failure; setting `resolved_on` resolves it.
pub async fn update_failure(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEquipmentFailure>,
) -> Result<ResponseJson<ApiResponse<EquipmentFailure>>, ApiError> {
    let pool = &deployment.db().pool;
    let existing =
        server_timing::db(EquipmentFailure::find_by_id_for_company(pool, id, tenant.company_id))
            .await?
            .ok_or(ApiError::NotFound("Equipment failure"))?;
    let was_open = existing.is_open();

    let failure = payload.apply(existing);
    failure.validate()?;
    let failure = server_timing::db(EquipmentFailure::update(pool, &failure)).await?;
    if was_open && !failure.is_open() {
        info!(company_id = %tenant.company_id, failure_id = %failure.id, "Equipment failure resolved");
    }
    Ok(ResponseJson(ApiResponse::success(failure)))
}

pub async fn get_maintenance(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<EquipmentMaintenanceLog>>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = load_equipment(pool, id, tenant.company_id).await?;
    let logs =
        server_timing::db(EquipmentMaintenanceLog::find_by_equipment(pool, equipment.id)).await?;
    Ok(ResponseJson(ApiResponse::success(logs)))
}

/// Logs maintenance. `next_due_on` defaults from the equipment's interval.
pub async fn log_maintenance(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateEquipmentMaintenanceLog>,
) -> Result<ResponseJson<ApiResponse<EquipmentMaintenanceLog>>, ApiError> {
    let pool = &deployment.db().pool;
    let equipment = load_equipment(pool, id, tenant.company_id).await?;
    payload.validate()?;
    references::service(pool, tenant.company_id, payload.service_id).await?;

    let payload = payload.with_default_due(equipment.maintenance_interval_days);
    let log = server_timing::db(EquipmentMaintenanceLog::create(
        pool,
        equipment.id,
        Some(tenant.user_id),
        &payload,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(log)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/equipment", get(get_equipment_list).post(create_equipment))
        .route(
            "/equipment/{id}",
            get(get_equipment)
                .patch(update_equipment)
                .delete(delete_equipment),
        )
        .route(
            "/equipment/{id}/failures",
            get(get_failures).post(report_failure),
        )
        .route(
            "/equipment/{id}/maintenance",
            get(get_maintenance).post(log_maintenance),
        )
        .route("/equipment-failures/{id}", patch(update_failure))
}
