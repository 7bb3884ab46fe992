//! Checks for ids supplied in request bodies. A reference outside the
//! caller's company is a validation error, never a 404.

use db::models::{
    customer::Customer, profile::Profile, property::Property, service::Service,
    template::Template, unit::Unit,
};
use sqlx::SqlitePool;
use utils::server_timing;
use uuid::Uuid;

use crate::error::ApiError;

fn ensure(found: bool, field: &str, what: &str) -> Result<(), ApiError> {
    if found {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "{field} does not reference a {what} in this company"
        )))
    }
}

pub async fn customer(
    pool: &SqlitePool,
    company_id: Uuid,
    id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = id else { return Ok(()) };
    let found = server_timing::db(Customer::find_by_id_for_company(pool, id, company_id)).await?;
    ensure(found.is_some(), "customer_id", "customer")
}

/// Any member of the company can be assigned work.
pub async fn member(
    pool: &SqlitePool,
    company_id: Uuid,
    field: &str,
    id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = id else { return Ok(()) };
    let found = server_timing::db(Profile::is_member(pool, id, company_id)).await?;
    ensure(found, field, "team member")
}

pub async fn template(
    pool: &SqlitePool,
    company_id: Uuid,
    id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = id else { return Ok(()) };
    let found = server_timing::db(Template::find_by_id_for_company(pool, id, company_id)).await?;
    ensure(found.is_some(), "template_id", "template")
}

pub async fn property(
    pool: &SqlitePool,
    company_id: Uuid,
    id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = id else { return Ok(()) };
    let found = server_timing::db(Property::find_by_id_for_company(pool, id, company_id)).await?;
    ensure(found.is_some(), "property_id", "property")
}

/// Returns the unit so callers can check where it lives.
pub async fn unit(
    pool: &SqlitePool,
    company_id: Uuid,
    id: Option<Uuid>,
) -> Result<Option<Unit>, ApiError> {
    let Some(id) = id else { return Ok(None) };
    let found = server_timing::db(Unit::find_by_id_for_company(pool, id, company_id)).await?;
    ensure(found.is_some(), "unit_id", "unit")?;
    Ok(found)
}

pub async fn service(
    pool: &SqlitePool,
    company_id: Uuid,
    id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = id else { return Ok(()) };
    let found = server_timing::db(Service::find_by_id_for_company(pool, id, company_id)).await?;
    ensure(found.is_some(), "service_id", "service")
}
