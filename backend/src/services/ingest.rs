//! Upload ingestion: validation, analysis, metadata defaults, classification

use super::session::SessionManager;
use crate::analysis::{AnalysisService, UploadedFile};
use crate::error::ApiError;
use chrono::{NaiveDate, Utc};
use healthwise_shared::aggregator::derive_abnormalities;
use healthwise_shared::classifier::Classifier;
use healthwise_shared::validation::validate_upload;
use healthwise_shared::LabReportData;
use tracing::info;

/// Lab name the analysis service uses when it found none
const UNKNOWN_LAB: &str = "Unknown Lab";

/// Ingestion service
pub struct IngestService;

impl IngestService {
    /// Analyze an upload and store the resulting report.
    ///
    /// The file is checked before any network call. The stored report
    /// becomes the active one.
    pub async fn ingest(
        session: &mut SessionManager,
        analysis: &dyn AnalysisService,
        classifier: &Classifier,
        file: UploadedFile,
    ) -> Result<LabReportData, ApiError> {
        validate_upload(&file.content_type, file.bytes.len())?;

        let store = session.store_mut()?;
        let patient_name = store.profile().name.clone();
        let existing = store.reports().len();

        info!(file_name = %file.file_name, size = file.bytes.len(), "Analyzing upload");
        let draft = analysis.analyze(file).await?;

        let report = Self::prepare_report(
            draft,
            &patient_name,
            existing,
            Utc::now().date_naive(),
            classifier,
        );

        let saved = session.store_mut()?.add_report(report).await?;
        if let Some(id) = saved.id.as_deref() {
            session.view_report(id);
        }

        info!(
            report_id = ?saved.id,
            results = saved.results.len(),
            abnormal = saved.abnormalities.len(),
            "Report ingested"
        );
        Ok(saved)
    }

    /// Fill in metadata and recompute statuses of a freshly analyzed report.
    ///
    /// `existing` is how many reports the user already has; an unnamed
    /// report is called `Report-<existing + 1>`.
    pub fn prepare_report(
        mut report: LabReportData,
        patient_name: &str,
        existing: usize,
        today: NaiveDate,
        classifier: &Classifier,
    ) -> LabReportData {
        report.id = None;
        report.user_id = None;
        report.upload_date = Some(today.format("%Y-%m-%d").to_string());
        report.patient_name = Some(patient_name.to_string());

        let unnamed = report
            .lab_name
            .as_deref()
            .map(str::trim)
            .map_or(true, |name| name.is_empty() || name == UNKNOWN_LAB);
        if unnamed {
            report.lab_name = Some(format!("Report-{}", existing + 1));
        }

        classifier.apply(&mut report.results);
        report.abnormalities = derive_abnormalities(&report.results);
        report
    }
}
