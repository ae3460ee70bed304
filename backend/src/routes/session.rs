//! Session lifecycle API routes

use crate::auth::SessionUser;
use crate::services::{SessionManager, SessionState};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use healthwise_shared::{SessionResponse, UserProfile};

/// Create session routes
pub fn session_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        post(sign_in).get(get_session).delete(sign_out),
    )
}

pub(crate) fn session_response(manager: &SessionManager) -> SessionResponse {
    let outcome = manager.last_load();
    let store = manager.store();

    SessionResponse {
        state: manager.state().to_string(),
        user_id: manager.user_id().map(|id| id.to_string()),
        profile: store
            .map(|s| s.profile().clone())
            .unwrap_or_else(UserProfile::guest),
        report_count: store.map_or(0, |s| s.reports().len()),
        active_report_id: manager.active_report_id().map(str::to_string),
        profile_fallback: outcome.profile_fallback,
        reports_fallback: outcome.reports_fallback,
    }
}

/// POST /api/v1/session - Start a session and load the user's data
async fn sign_in(State(state): State<AppState>, user: SessionUser) -> Json<SessionResponse> {
    let session = state.sessions.sign_in(user.scope).await;
    let manager = session.lock().await;
    Json(session_response(&manager))
}

/// GET /api/v1/session - Current lifecycle state
async fn get_session(State(state): State<AppState>, user: SessionUser) -> Json<SessionResponse> {
    match state.sessions.get(user.user_id()).await {
        Some(session) => {
            let manager = session.lock().await;
            Json(session_response(&manager))
        }
        None => Json(SessionResponse {
            state: SessionState::Unauthenticated.to_string(),
            user_id: None,
            profile: UserProfile::guest(),
            report_count: 0,
            active_report_id: None,
            profile_fallback: false,
            reports_fallback: false,
        }),
    }
}

/// DELETE /api/v1/session - Sign out; nothing is deleted remotely
async fn sign_out(State(state): State<AppState>, user: SessionUser) -> StatusCode {
    state.sessions.sign_out(user.user_id()).await;
    StatusCode::NO_CONTENT
}
