//! Dashboard API route

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use healthwise_shared::aggregator::dashboard;
use healthwise_shared::DashboardResponse;

/// Create dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

/// GET /api/v1/dashboard - Counts across all reports
async fn get_dashboard(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    let store = manager.require_store()?;

    Ok(Json(DashboardResponse {
        profile: store.profile().clone(),
        summary: dashboard(store.reports()),
        recent_reports: store.reports().to_vec(),
    }))
}
