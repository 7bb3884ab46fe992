//! Recurring service rules for a property. Stored and served only; nothing
//! here generates services from them.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::scheduling_rule::{CreateSchedulingRule, SchedulingRule, UpdateSchedulingRule};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::{properties::load_property, references};
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

async fn load_rule(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<SchedulingRule, ApiError> {
    server_timing::db(SchedulingRule::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Scheduling rule"))
}

/// A rule's unit must sit on the rule's property.
async fn check_unit(
    pool: &SqlitePool,
    company_id: Uuid,
    property_id: Uuid,
    unit_id: Option<Uuid>,
) -> Result<(), ApiError> {
    match references::unit(pool, company_id, unit_id).await? {
        Some(unit) if unit.property_id != property_id => Err(ApiError::bad_request(
            "unit_id must belong to the rule's property",
        )),
        _ => Ok(()),
    }
}

pub async fn get_property_rules(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<SchedulingRule>>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    let rules = server_timing::db(SchedulingRule::find_by_property(pool, property.id)).await?;
    Ok(ResponseJson(ApiResponse::success(rules)))
}

pub async fn create_rule(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(property_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateSchedulingRule>,
) -> Result<ResponseJson<ApiResponse<SchedulingRule>>, ApiError> {
    let pool = &deployment.db().pool;
    let property = load_property(pool, property_id, tenant.company_id).await?;
    payload.validate()?;
    check_unit(pool, tenant.company_id, property.id, payload.unit_id).await?;
    references::template(pool, tenant.company_id, payload.template_id).await?;
    references::member(pool, tenant.company_id, "technician_id", payload.technician_id).await?;

    let rule = server_timing::db(SchedulingRule::create(pool, property.id, &payload)).await?;
    Ok(ResponseJson(ApiResponse::success(rule)))
}

pub async fn get_rule(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<SchedulingRule>>, ApiError> {
    let rule = load_rule(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(rule)))
}

pub async fn update_rule(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateSchedulingRule>,
) -> Result<ResponseJson<ApiResponse<SchedulingRule>>, ApiError> {
    let pool = &deployment.db().pool;
    let existing = load_rule(pool, id, tenant.company_id).await?;
    if let Some(unit_id) = payload.unit_id {
        check_unit(pool, tenant.company_id, existing.property_id, unit_id).await?;
    }
    if let Some(template_id) = payload.template_id {
        references::template(pool, tenant.company_id, template_id).await?;
    }
    if let Some(technician_id) = payload.technician_id {
        references::member(pool, tenant.company_id, "technician_id", technician_id).await?;
    }

    let rule = payload.apply(existing);
    rule.validate()?;
    let rule = server_timing::db(SchedulingRule::update(pool, &rule)).await?;
    Ok(ResponseJson(ApiResponse::success(rule)))
}

pub async fn delete_rule(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;
    let rule = load_rule(pool, id, tenant.company_id).await?;
    server_timing::db(SchedulingRule::delete(pool, rule.id)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/properties/{id}/scheduling-rules",
            get(get_property_rules).post(create_rule),
        )
        .route(
            "/scheduling-rules/{id}",
            get(get_rule).patch(update_rule).delete(delete_rule),
        )
}
