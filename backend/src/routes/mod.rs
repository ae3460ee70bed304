//! Route definitions for the HealthWise API
//!
//! This module organizes all API routes and applies middleware.

use crate::state::AppState;
use axum::{
    http::{header, HeaderMap, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod backup;
mod chat;
mod dashboard;
mod health;
mod profile;
mod reports;
mod session;

pub use backup::backup_routes;
pub use chat::chat_routes;
pub use dashboard::dashboard_routes;
pub use profile::profile_routes;
pub use reports::report_routes;
pub use session::session_routes;

/// Headroom on top of the analysis timeout for an upload request
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let timeout =
        Duration::from_secs(state.config().analysis.timeout_secs + REQUEST_TIMEOUT_MARGIN_SECS);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes())
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .expose_headers([header::CONTENT_DISPOSITION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "HealthWise API v1" }))
        .nest("/session", session::session_routes())
        .nest("/profile", profile::profile_routes())
        .nest("/dashboard", dashboard::dashboard_routes())
        .nest("/reports", reports::report_routes())
        .nest("/backup", backup::backup_routes())
        .nest("/chat", chat::chat_routes())
}

/// Download response with a `Content-Disposition` filename
pub(crate) fn attachment(
    content_type: &'static str,
    filename: &str,
    body: String,
) -> impl IntoResponse {
    // Header values must be visible ASCII
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    (headers, body)
}
