use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::booking::{Booking, BookingFilter, CreateBooking, UpdateBooking};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::{properties::load_property, references};
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, ApiQuery, Tenant},
};

async fn load_booking(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Booking, ApiError> {
    server_timing::db(Booking::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Booking"))
}

/// Bookings overlapping `?from=&to=`, or all of them.
pub async fn get_bookings(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<BookingFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let bookings = server_timing::db(Booking::find_by_company(
        &deployment.db().pool,
        tenant.company_id,
        &filter,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

pub async fn get_property_bookings(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    let bookings = server_timing::db(Booking::find_by_property(pool, property.id)).await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

pub async fn create_booking(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateBooking>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    payload.validate()?;
    let pool = &deployment.db().pool;
    references::property(pool, tenant.company_id, Some(payload.property_id)).await?;
    let booking = server_timing::db(Booking::create(pool, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(booking)))
}

pub async fn get_booking(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    let booking = load_booking(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(booking)))
}

pub async fn update_booking(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateBooking>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    let pool = &deployment.db().pool;
    let booking = payload.apply(load_booking(pool, id, tenant.company_id).await?);
    booking.validate()?;
    let booking = server_timing::db(Booking::update(pool, &booking)).await?;
    Ok(ResponseJson(ApiResponse::success(booking)))
}

pub async fn delete_booking(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let booking = load_booking(pool, id, tenant.company_id).await?;
    server_timing::db(Booking::delete(pool, booking.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/bookings", get(get_bookings).post(create_booking))
        .route(
            "/bookings/{id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route("/properties/{id}/bookings", get(get_property_bookings))
}
