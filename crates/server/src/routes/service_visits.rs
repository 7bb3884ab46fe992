//! Service visits: scheduling, editing and completing work on a unit.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::service::{
    CreateService, Service, ServiceFilter, ServiceStatus, ServiceWithLocation, UpdateService,
};
use deployment::Deployment;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use ts_rs::TS;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::references;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, ApiQuery, Tenant},
};

const CANCELLED_NOT_COMPLETABLE: &str = "cannot complete a cancelled service";

pub(crate) async fn load_service(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Service, ApiError> {
    server_timing::db(Service::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Service"))
}

pub async fn get_services(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<ServiceFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<ServiceWithLocation>>>, ApiError> {
    let services = server_timing::db(Service::find_by_company(
        &deployment.db().pool,
        tenant.company_id,
        &filter,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(services)))
}

pub async fn create_service(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateService>,
) -> Result<ResponseJson<ApiResponse<Service>>, ApiError> {
    let pool = &deployment.db().pool;
    references::unit(pool, tenant.company_id, Some(payload.unit_id)).await?;
    references::member(pool, tenant.company_id, "technician_id", payload.technician_id).await?;
    references::template(pool, tenant.company_id, payload.template_id).await?;

    let service = server_timing::db(Service::create(pool, &payload)).await?;
    info!(
        company_id = %tenant.company_id,
        service_id = %service.id,
        service_date = %service.service_date,
        "Service scheduled"
    );
    Ok(ResponseJson(ApiResponse::success(service)))
}

pub async fn get_service(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<ServiceWithLocation>>, ApiError> {
    let service = server_timing::db(Service::find_with_location(
        &deployment.db().pool,
        id,
        tenant.company_id,
    ))
    .await?
    .ok_or(ApiError::NotFound("Service"))?;
    Ok(ResponseJson(ApiResponse::success(service)))
}

pub async fn update_service(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateService>,
) -> Result<ResponseJson<ApiResponse<Service>>, ApiError> {
    let pool = &deployment.db().pool;
    let existing = load_service(pool, id, tenant.company_id).await?;
    if existing.status == ServiceStatus::Cancelled
        && payload.status == Some(ServiceStatus::Completed)
    {
        return Err(ApiError::bad_request(CANCELLED_NOT_COMPLETABLE));
    }
    if let Some(technician_id) = payload.technician_id {
        references::member(pool, tenant.company_id, "technician_id", technician_id).await?;
    }
    if let Some(template_id) = payload.template_id {
        references::template(pool, tenant.company_id, template_id).await?;
    }

    let service = server_timing::db(Service::update(pool, &payload.apply(existing))).await?;
    Ok(ResponseJson(ApiResponse::success(service)))
}

pub async fn delete_service(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let service = load_service(pool, id, tenant.company_id).await?;
    server_timing::db(Service::delete(pool, service.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

#[derive(Debug, Default, Deserialize, TS)]
pub struct CompleteService {
    pub notes: Option<String>,
}

/// Marks a visit completed. The body is optional.
pub async fn complete_service(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<Service>>, ApiError> {
    let payload: CompleteService = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteService::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?
    };

    let pool = &deployment.db().pool;
    let service = load_service(pool, id, tenant.company_id).await?;
    if service.status == ServiceStatus::Cancelled {
        return Err(ApiError::bad_request(CANCELLED_NOT_COMPLETABLE));
    }

    let service = server_timing::db(Service::mark_completed(pool, service.id, payload.notes)).await?;
    info!(company_id = %tenant.company_id, service_id = %service.id, "Service completed");
    deployment
        .track_event(
            "service_completed",
            serde_json::json!({
                "company_id": tenant.company_id.to_string(),
                "service_id": service.id.to_string(),
            }),
        )
        .await;
    Ok(ResponseJson(ApiResponse::success(service)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/services", get(get_services).post(create_service))
        .route(
            "/services/{id}",
            get(get_service).patch(update_service).delete(delete_service),
        )
        .route("/services/{id}/complete", post(complete_service))
}
