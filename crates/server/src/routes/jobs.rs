//! One-off jobs (repairs, quotes, call-outs) outside the regular service round.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::job::{CreateJob, Job, JobFilter, UpdateJob};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::references;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, ApiQuery, Tenant},
};

async fn check_references(
    pool: &SqlitePool,
    company_id: Uuid,
    customer_id: Option<Uuid>,
    property_id: Option<Uuid>,
    unit_id: Option<Uuid>,
    assigned_to: Option<Uuid>,
) -> Result<(), ApiError> {
    references::customer(pool, company_id, customer_id).await?;
    references::property(pool, company_id, property_id).await?;
    references::unit(pool, company_id, unit_id).await?;
    references::member(pool, company_id, "assigned_to", assigned_to).await
}

/// A job naming both a property and a unit must name a unit on that property.
async fn check_unit_on_property(
    pool: &SqlitePool,
    company_id: Uuid,
    property_id: Option<Uuid>,
    unit_id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(property_id) = property_id else {
        return Ok(());
    };
    match references::unit(pool, company_id, unit_id).await? {
        Some(unit) if unit.property_id != property_id => Err(ApiError::bad_request(
            "unit_id must belong to the job's property",
        )),
        _ => Ok(()),
    }
}

pub async fn get_jobs(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<JobFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Job>>>, ApiError> {
    let jobs = server_timing::db(Job::find_by_company(
        &deployment.db().pool,
        tenant.company_id,
        &filter,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(jobs)))
}

pub async fn create_job(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateJob>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    payload.validate()?;
    let pool = &deployment.db().pool;
    check_references(
        pool,
        tenant.company_id,
        payload.customer_id,
        payload.property_id,
        payload.unit_id,
        payload.assigned_to,
    )
    .await?;
    check_unit_on_property(pool, tenant.company_id, payload.property_id, payload.unit_id).await?;
    let job = server_timing::db(Job::create(pool, tenant.company_id, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn get_job(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let job = server_timing::db(Job::find_by_id_for_company(
        &deployment.db().pool,
        id,
        tenant.company_id,
    ))
    .await?
    .ok_or(ApiError::NotFound("Job"))?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn update_job(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateJob>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let pool = &deployment.db().pool;
    let existing = server_timing::db(Job::find_by_id_for_company(pool, id, tenant.company_id))
        .await?
        .ok_or(ApiError::NotFound("Job"))?;
    check_references(
        pool,
        tenant.company_id,
        payload.customer_id.flatten(),
        payload.property_id.flatten(),
        payload.unit_id.flatten(),
        payload.assigned_to.flatten(),
    )
    .await?;

    let job = payload.apply(existing);
    job.validate()?;
    check_unit_on_property(pool, tenant.company_id, job.property_id, job.unit_id).await?;
    let job = server_timing::db(Job::update(pool, &job)).await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn delete_job(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = server_timing::db(Job::delete(&deployment.db().pool, id, tenant.company_id)).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Job"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/jobs", get(get_jobs).post(create_job))
        .route("/jobs/{id}", get(get_job).patch(update_job).delete(delete_job))
}
