use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::{
    plant_room::{CreatePlantRoom, PlantRoom, UpdatePlantRoom},
    plant_room_check::{CreatePlantRoomCheck, PlantRoomCheck},
};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::properties::load_property;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

async fn load_plant_room(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<PlantRoom, ApiError> {
    server_timing::db(PlantRoom::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Plant room"))
}

pub async fn get_property_plant_rooms(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<PlantRoom>>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    let rooms = server_timing::db(PlantRoom::find_by_property(pool, property.id)).await?;
    Ok(ResponseJson(ApiResponse::success(rooms)))
}

pub async fn create_plant_room(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreatePlantRoom>,
) -> Result<ResponseJson<ApiResponse<PlantRoom>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    payload.validate()?;
    let room = server_timing::db(PlantRoom::create(pool, property.id, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn get_plant_room(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<PlantRoom>>, ApiError> {
    let room = load_plant_room(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn update_plant_room(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePlantRoom>,
) -> Result<ResponseJson<ApiResponse<PlantRoom>>, ApiError> {
    let pool = &deployment.db().pool;
    let room = payload.apply(load_plant_room(pool, id, tenant.company_id).await?);
    room.validate()?;
    let room = server_timing::db(PlantRoom::update(pool, &room)).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn delete_plant_room(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let room = load_plant_room(pool, id, tenant.company_id).await?;
    server_timing::db(PlantRoom::delete(pool, room.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_checks(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<PlantRoomCheck>>>, ApiError> {
    let pool = &deployment.db().pool;
    let room = load_plant_room(pool, id, tenant.company_id).await?;
    let checks = server_timing::db(PlantRoomCheck::find_by_plant_room(pool, room.id)).await?;
    Ok(ResponseJson(ApiResponse::success(checks)))
}

pub async fn record_check(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreatePlantRoomCheck>,
) -> Result<ResponseJson<ApiResponse<PlantRoomCheck>>, ApiError> {
    let pool = &deployment.db().pool;
    let room = load_plant_room(pool, id, tenant.company_id).await?;
    payload.validate()?;
    let check = server_timing::db(PlantRoomCheck::create(
        pool,
        room.id,
        Some(tenant.user_id),
        &payload,
    ))
    .await?;
    if check.issues_found {
        tracing::warn!(
            company_id = %tenant.company_id,
            plant_room_id = %room.id,
            "Plant room check found issues"
        );
    }
    Ok(ResponseJson(ApiResponse::success(check)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/properties/{id}/plant-rooms",
            get(get_property_plant_rooms).post(create_plant_room),
        )
        .route(
            "/plant-rooms/{id}",
            get(get_plant_room)
                .patch(update_plant_room)
                .delete(delete_plant_room),
        )
        .route("/plant-rooms/{id}/checks", get(get_checks).post(record_check))
}
