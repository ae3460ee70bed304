//! Backup API routes
//!
//! A restored backup only replaces the in-memory session; it reaches the
//! remote store through the explicit persist call.

use super::attachment;
use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use healthwise_shared::backup::import_backup;
use healthwise_shared::{ImportResponse, PersistResponse};
use tracing::info;

/// Largest backup document accepted for restore
const RESTORE_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Create backup routes
pub fn backup_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(download_backup)
                .post(restore_backup)
                .layer(DefaultBodyLimit::max(RESTORE_BODY_LIMIT)),
        )
        .route("/persist", post(persist_backup))
}

/// GET /api/v1/backup - Full snapshot as a JSON download
async fn download_backup(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    let document = manager.require_store()?.export()?;
    Ok(attachment("application/json", &document.filename, document.contents))
}

/// POST /api/v1/backup - Restore a backup into the session
async fn restore_backup(
    State(state): State<AppState>,
    user: SessionUser,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let backup = import_backup(&body)?;

    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    let store = manager.store_mut()?;
    store.import(backup);

    info!(
        user_id = %user.user_id(),
        reports = store.reports().len(),
        "Backup restored in memory"
    );

    Ok(Json(ImportResponse {
        profile: store.profile().clone(),
        report_count: store.reports().len(),
        persisted: false,
    }))
}

/// POST /api/v1/backup/persist - Save the in-memory snapshot remotely
async fn persist_backup(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<PersistResponse>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    let outcome = manager.store_mut()?.persist_snapshot().await?;

    Ok(Json(PersistResponse {
        inserted: outcome.inserted,
        skipped: outcome.skipped,
    }))
}
