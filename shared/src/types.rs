//! API request and response types

use crate::aggregator::{DashboardSummary, ReportSummary};
use crate::models::{LabReportData, LabResult, TestCategory, UserProfile};
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

// ============================================================================
// Session
// ============================================================================

/// Lifecycle state and what the store currently holds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub profile: UserProfile,
    pub report_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_report_id: Option<String>,
    /// Profile could not be loaded and the guest profile is shown
    #[serde(default)]
    pub profile_fallback: bool,
    /// Reports could not be loaded and the list starts empty
    #[serde(default)]
    pub reports_fallback: bool,
}

// ============================================================================
// Reports
// ============================================================================

/// Results of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: TestCategory,
    pub results: Vec<LabResult>,
}

/// A report with its grouped results and counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    pub report: LabReportData,
    pub groups: Vec<CategoryGroup>,
    pub summary: ReportSummary,
}

/// Dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub profile: UserProfile,
    pub summary: DashboardSummary,
    /// Most recent reports first
    pub recent_reports: Vec<LabReportData>,
}

// ============================================================================
// Backup
// ============================================================================

/// Outcome of restoring a backup into the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub profile: UserProfile,
    pub report_count: usize,
    /// Imports live in memory until explicitly persisted
    pub persisted: bool,
}

/// Outcome of saving the in-memory snapshot remotely
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistResponse {
    pub inserted: usize,
    pub skipped: usize,
}

// ============================================================================
// Assistant chat
// ============================================================================

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ChatPart { text: text.into() }],
        }
    }
}

/// Chat request from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
    /// Report to discuss; defaults to the active report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

/// Assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
}
