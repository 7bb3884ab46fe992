use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use utils::server_timing;

pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Adds `Server-Timing: db;dur=…, total;dur=…` to every response.
pub async fn record_server_timing(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let (mut response, timings) = server_timing::scope(next.run(request)).await;
    let value = timings.header_value(start.elapsed());
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            response.headers_mut().insert(SERVER_TIMING, value);
        }
        Err(e) => tracing::warn!(error = %e, "Invalid Server-Timing header"),
    }
    response
}
