//! Backup document codec
//!
//! A backup is a complete, self-contained snapshot of one user's profile
//! and report list. Export is pure serialization; import checks only the
//! document shape and never touches any remote store.

use crate::errors::{ExportError, ImportError};
use crate::models::{BackupData, LabReportData, UserProfile, BACKUP_VERSION};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// A serialized document ready to be offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDocument {
    pub filename: String,
    pub contents: String,
}

/// `healthwise_backup_YYYY-MM-DD.json`
pub fn backup_filename(date: NaiveDate) -> String {
    format!("healthwise_backup_{}.json", date.format("%Y-%m-%d"))
}

/// Serialize the full snapshot taken at `at`
pub fn export_backup(
    profile: &UserProfile,
    reports: &[LabReportData],
    at: DateTime<Utc>,
) -> Result<BackupDocument, ExportError> {
    let backup = BackupData {
        version: BACKUP_VERSION.to_string(),
        export_date: at,
        user: profile.clone(),
        reports: reports.to_vec(),
    };

    Ok(BackupDocument {
        filename: backup_filename(at.date_naive()),
        contents: serde_json::to_string_pretty(&backup)?,
    })
}

/// Parse and shape-check a backup document
pub fn import_backup(text: &str) -> Result<BackupData, ImportError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;

    let Some(object) = document.as_object() else {
        return Err(ImportError::InvalidFormat(
            "expected a JSON object".to_string(),
        ));
    };

    match object.get("user") {
        None | Some(Value::Null) => {
            return Err(ImportError::InvalidFormat("missing user".to_string()));
        }
        Some(_) => {}
    }

    if !object.get("reports").is_some_and(Value::is_array) {
        return Err(ImportError::InvalidFormat(
            "reports must be an array".to_string(),
        ));
    }

    serde_json::from_value(document).map_err(|e| ImportError::InvalidFormat(e.to_string()))
}

/// Serialize a single report for download
pub fn export_report(report: &LabReportData) -> Result<BackupDocument, ExportError> {
    Ok(BackupDocument {
        filename: report_filename(report),
        contents: serde_json::to_string_pretty(report)?,
    })
}

/// `<lab name with whitespace as _>_<report date>.json`
pub fn report_filename(report: &LabReportData) -> String {
    let lab = report
        .lab_name
        .as_deref()
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join("_"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "report".to_string());

    let date = report
        .report_date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("date");

    format!("{}_{}.json", lab, date)
}

#[derive(Serialize)]
struct ResultRow<'a> {
    test: &'a str,
    value: String,
    unit: &'a str,
    reference_range: &'a str,
    category: &'static str,
    status: &'static str,
}

/// Results table of one report as CSV
pub fn report_results_csv(report: &LabReportData) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for result in &report.results {
        wtr.serialize(ResultRow {
            test: &result.test_name,
            value: result.value.to_string(),
            unit: &result.unit,
            reference_range: &result.reference_range,
            category: result.category.label(),
            status: result.status.label(),
        })
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}
