//! Report aggregation
//!
//! Read-only views over reports: results grouped by category, derived
//! abnormality lists and the summary counts shown on the dashboard.

use crate::models::{LabReportData, LabResult, ResultStatus, TestCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group results by category.
///
/// Every result lands in exactly one bucket and keeps its relative order.
/// Empty categories are absent from the map.
pub fn group_by_category(results: &[LabResult]) -> BTreeMap<TestCategory, Vec<&LabResult>> {
    let mut groups: BTreeMap<TestCategory, Vec<&LabResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.category).or_default().push(result);
    }
    groups
}

/// Test names of every out-of-range result, in report order
pub fn derive_abnormalities(results: &[LabResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| r.status.is_abnormal())
        .map(|r| r.test_name.clone())
        .collect()
}

/// Number of `Normal` results across all reports
pub fn count_normal(reports: &[LabReportData]) -> usize {
    reports
        .iter()
        .flat_map(|report| report.results.iter())
        .filter(|r| r.status == ResultStatus::Normal)
        .count()
}

/// Per-report counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub normal: usize,
    /// High, Low and Critical together
    pub abnormal: usize,
    pub critical: usize,
    pub unknown: usize,
    /// Number of non-empty categories
    pub categories: usize,
}

/// Counts for a single report
pub fn summarize_report(report: &LabReportData) -> ReportSummary {
    let mut summary = ReportSummary {
        total: report.results.len(),
        categories: group_by_category(&report.results).len(),
        ..Default::default()
    };

    for result in &report.results {
        match result.status {
            ResultStatus::Normal => summary.normal += 1,
            ResultStatus::High | ResultStatus::Low => summary.abnormal += 1,
            ResultStatus::Critical => {
                summary.abnormal += 1;
                summary.critical += 1;
            }
            ResultStatus::Unknown => summary.unknown += 1,
        }
    }

    summary
}

/// Dashboard figures over the whole report list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub report_count: usize,
    pub normal_results: usize,
    pub abnormal_results: usize,
    /// Most recent upload date, `None` without reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_upload_date: Option<String>,
}

/// Dashboard figures; `reports` is expected most recent first
pub fn dashboard(reports: &[LabReportData]) -> DashboardSummary {
    let abnormal_results = reports
        .iter()
        .flat_map(|report| report.results.iter())
        .filter(|r| r.status.is_abnormal())
        .count();

    DashboardSummary {
        report_count: reports.len(),
        normal_results: count_normal(reports),
        abnormal_results,
        latest_upload_date: reports.first().and_then(|r| r.upload_date.clone()),
    }
}
