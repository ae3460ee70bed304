//! Lab report API routes

use super::attachment;
use crate::analysis::UploadedFile;
use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::services::IngestService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use healthwise_shared::aggregator::{group_by_category, summarize_report};
use healthwise_shared::backup::{export_report, report_filename, report_results_csv};
use healthwise_shared::validation::{content_type_from_name, MAX_UPLOAD_BYTES};
use healthwise_shared::{CategoryGroup, LabReportData, ReportView, ValidationError};

/// Room for multipart framing around a maximum-size file
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Create report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_reports)
                .post(upload_report)
                .delete(clear_reports)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/:id", get(get_report).delete(delete_report))
        .route("/:id/export", get(export_json))
        .route("/:id/export/csv", get(export_csv))
}

/// GET /api/v1/reports - All reports, most recent first
async fn list_reports(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<Vec<LabReportData>>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    Ok(Json(manager.require_store()?.reports().to_vec()))
}

/// A body cut off at the limit is an oversized file, not a malformed form
fn multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::FileTooLarge {
            size: UPLOAD_BODY_LIMIT,
            max: MAX_UPLOAD_BYTES,
        }
        .into()
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| content_type_from_name(&file_name).map(str::to_string))
            .unwrap_or_default();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest("Missing file field".to_string()))
}

/// POST /api/v1/reports - Analyze an uploaded document and store the report
async fn upload_report(
    State(state): State<AppState>,
    user: SessionUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<LabReportData>), ApiError> {
    let file = read_upload(multipart).await?;

    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    let report = IngestService::ingest(
        &mut manager,
        state.analysis.as_ref(),
        &state.classifier,
        file,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// DELETE /api/v1/reports - Delete every report
async fn clear_reports(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    session.lock().await.clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Report {} not found", id))
}

/// GET /api/v1/reports/:id - Report with grouped results; marks it active
async fn get_report(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<ReportView>, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    let report = manager.view_report(&id).ok_or_else(|| not_found(&id))?;

    let groups = group_by_category(&report.results)
        .into_iter()
        .map(|(category, results)| CategoryGroup {
            category,
            results: results.into_iter().cloned().collect(),
        })
        .collect();

    Ok(Json(ReportView {
        summary: summarize_report(report),
        report: report.clone(),
        groups,
    }))
}

/// DELETE /api/v1/reports/:id - Delete one report
async fn delete_report(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let mut manager = session.lock().await;
    if manager.require_store()?.find_report(&id).is_none() {
        return Err(not_found(&id));
    }
    manager.delete_report(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/reports/:id/export - Single report as a JSON download
async fn export_json(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    let report = manager
        .require_store()?
        .find_report(&id)
        .ok_or_else(|| not_found(&id))?;

    let document = export_report(report)?;
    Ok(attachment("application/json", &document.filename, document.contents))
}

/// GET /api/v1/reports/:id/export/csv - Results table as CSV
async fn export_csv(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.active(&user.scope).await;
    let manager = session.lock().await;
    let report = manager
        .require_store()?
        .find_report(&id)
        .ok_or_else(|| not_found(&id))?;

    let csv = report_results_csv(report)?;
    let filename = format!("{}.csv", report_filename(report).trim_end_matches(".json"));
    Ok(attachment("text/csv", &filename, csv))
}
