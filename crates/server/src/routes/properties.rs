use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::property::{CreateProperty, Property, UpdateProperty};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use super::references;
use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

/// Path-parent lookup shared by the routes nested under a property.
pub(crate) async fn load_property(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Property, ApiError> {
    server_timing::db(Property::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Property"))
}

pub async fn get_properties(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<Property>>>, ApiError> {
    let properties =
        server_timing::db(Property::find_by_company(&deployment.db().pool, tenant.company_id))
            .await?;
    Ok(ResponseJson(ApiResponse::success(properties)))
}

pub async fn create_property(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    payload.validate()?;
    let pool = &deployment.db().pool;
    references::customer(pool, tenant.company_id, payload.customer_id).await?;

    let property = server_timing::db(Property::create(pool, tenant.company_id, &payload)).await?;
    deployment
        .track_event(
            "property_created",
            serde_json::json!({
                "company_id": tenant.company_id.to_string(),
                "property_type": property.property_type.to_string(),
            }),
        )
        .await;
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub async fn get_property(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let property = load_property(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub async fn update_property(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let pool = &deployment.db().pool;
    if let Some(customer_id) = payload.customer_id {
        references::customer(pool, tenant.company_id, customer_id).await?;
    }
    let property = payload.apply(load_property(pool, id, tenant.company_id).await?);
    property.validate()?;
    let property = server_timing::db(Property::update(pool, &property)).await?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

/// Deleting a property cascades to its units, services and plant.
pub async fn delete_property(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows =
        server_timing::db(Property::delete(&deployment.db().pool, id, tenant.company_id)).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Property"));
    }
    tracing::info!(company_id = %tenant.company_id, property_id = %id, "Property deleted");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/properties", get(get_properties).post(create_property))
        .route(
            "/properties/{id}",
            get(get_property).patch(update_property).delete(delete_property),
        )
}
