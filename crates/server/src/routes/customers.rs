use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use deployment::Deployment;
use sqlx::SqlitePool;
use utils::{response::ApiResponse, server_timing};
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiJson, ApiPath, Tenant},
};

async fn load_customer(
    pool: &SqlitePool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Customer, ApiError> {
    server_timing::db(Customer::find_by_id_for_company(pool, id, company_id))
        .await?
        .ok_or(ApiError::NotFound("Customer"))
}

pub async fn get_customers(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<Vec<Customer>>>, ApiError> {
    let customers =
        server_timing::db(Customer::find_by_company(&deployment.db().pool, tenant.company_id))
            .await?;
    Ok(ResponseJson(ApiResponse::success(customers)))
}

pub async fn create_customer(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateCustomer>,
) -> Result<ResponseJson<ApiResponse<Customer>>, ApiError> {
    payload.validate()?;
    let customer = server_timing::db(Customer::create(
        &deployment.db().pool,
        tenant.company_id,
        &payload,
    ))
    .await?;
    tracing::debug!(company_id = %tenant.company_id, customer_id = %customer.id, "Customer created");
    Ok(ResponseJson(ApiResponse::success(customer)))
}

pub async fn get_customer(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Customer>>, ApiError> {
    let customer = load_customer(&deployment.db().pool, id, tenant.company_id).await?;
    Ok(ResponseJson(ApiResponse::success(customer)))
}

pub async fn update_customer(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCustomer>,
) -> Result<ResponseJson<ApiResponse<Customer>>, ApiError> {
    let pool = &deployment.db().pool;
    let customer = payload.apply(load_customer(pool, id, tenant.company_id).await?);
    customer.validate()?;
    let customer = server_timing::db(Customer::update(pool, &customer)).await?;
    Ok(ResponseJson(ApiResponse::success(customer)))
}

pub async fn delete_customer(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows =
        server_timing::db(Customer::delete(&deployment.db().pool, id, tenant.company_id)).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Customer"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/customers", get(get_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}
