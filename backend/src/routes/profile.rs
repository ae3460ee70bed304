//! User profile API routes

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use healthwise_shared::health_metrics::{profile_metrics, ProfileMetrics};
use healthwise_shared::validation::validate_profile;
use healthwise_shared::UserProfile;

/// Create profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/metrics", get(get_metrics))
}

/// GET /api/v1/profile - Get user profile
async fn get_profile(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<UserProfile>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    Ok(Json(manager.require_store()?.profile().clone()))
}

/// PUT /api/v1/profile - Save user profile
async fn update_profile(
    State(state): State<AppState>,
    user: SessionUser,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    validate_profile(&profile)?;

    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    let store = manager.store_mut()?;
    store.save_profile(profile).await?;
    Ok(Json(store.profile().clone()))
}

/// GET /api/v1/profile/metrics - BMI and missing measurements
async fn get_metrics(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<ProfileMetrics>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    Ok(Json(profile_metrics(manager.require_store()?.profile())))
}
