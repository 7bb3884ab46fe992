use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{DeploymentImpl, middleware::record_server_timing};

pub mod bookings;
pub mod chemical_additions;
pub mod companies;
pub mod customers;
pub mod equipment;
pub mod health;
pub mod jobs;
pub mod plant_rooms;
pub mod profile;
pub mod properties;
mod references;
pub mod reports;
pub mod scheduling_rules;
pub mod service_visits;
pub mod team;
pub mod templates;
pub mod units;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(profile::router(&deployment))
        .merge(companies::router(&deployment))
        .merge(customers::router(&deployment))
        .merge(properties::router(&deployment))
        .merge(units::router(&deployment))
        .merge(service_visits::router(&deployment))
        .merge(water_tests::router(&deployment))
        .merge(chemical_additions::router(&deployment))
        .merge(equipment::router(&deployment))
        .merge(plant_rooms::router(&deployment))
        .merge(scheduling_rules::router(&deployment))
        .merge(templates::router(&deployment))
        .merge(team::router(&deployment))
        .merge(jobs::router(&deployment))
        .merge(bookings::router(&deployment))
        .merge(reports::router(&deployment));

    Router::new()
        .nest("/api", api_routes)
        .layer(from_fn(record_server_timing))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    company_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(deployment)
}
