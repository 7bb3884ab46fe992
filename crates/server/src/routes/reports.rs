use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use chrono::{NaiveDate, Utc};
use db::models::{
    dashboard::DashboardSummary,
    report::{EquipmentFailureSummary, ReportRange, ServiceReport},
};
use deployment::Deployment;
use serde::Deserialize;
use utils::{response::ApiResponse, server_timing};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extractors::{ApiQuery, Tenant},
};

pub async fn get_dashboard(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
) -> Result<ResponseJson<ApiResponse<DashboardSummary>>, ApiError> {
    let today = Utc::now().date_naive();
    let summary = server_timing::db(DashboardSummary::get(
        &deployment.db().pool,
        tenant.company_id,
        today,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

#[derive(Debug, Deserialize)]
pub struct FailureReportQuery {
    pub since: Option<NaiveDate>,
}

pub async fn get_equipment_failure_report(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<FailureReportQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<EquipmentFailureSummary>>>, ApiError> {
    let rows = server_timing::db(EquipmentFailureSummary::for_company(
        &deployment.db().pool,
        tenant.company_id,
        query.since,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub async fn get_service_report(
    State(deployment): State<DeploymentImpl>,
    tenant: Tenant,
    ApiQuery(range): ApiQuery<ReportRange>,
) -> Result<ResponseJson<ApiResponse<ServiceReport>>, ApiError> {
    range.validate()?;
    let report = server_timing::db(ServiceReport::generate(
        &deployment.db().pool,
        tenant.company_id,
        &range,
    ))
    .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route(
            "/reports/equipment-failures",
            get(get_equipment_failure_report),
        )
        .route("/reports/services", get(get_service_report))
}
