//! Per-session report store
//!
//! Holds the profile and report list of one signed-in user. Every mutation
//! that has a remote counterpart is written to the remote store first and
//! only reflected locally once that write succeeds, so a failed write never
//! changes what the user sees.

use crate::gateway::{PersistenceError, RemoteStore, UserScope};
use healthwise_shared::backup::{export_backup, BackupDocument};
use healthwise_shared::{BackupData, ExportError, LabReportData, UserProfile};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no active session")]
    NoSession,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Which halves of a load fell back to defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Guest profile in use: the row was missing or could not be fetched
    pub profile_fallback: bool,
    /// Empty list in use: reports could not be fetched
    pub reports_fallback: bool,
}

/// Result of saving the in-memory snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub inserted: usize,
    /// Reports whose id already exists remotely
    pub skipped: usize,
}

/// Profile and reports of the active session, most recent report first
pub struct ReportStore {
    remote: Arc<dyn RemoteStore>,
    scope: Option<UserScope>,
    profile: UserProfile,
    reports: Vec<LabReportData>,
}

impl ReportStore {
    /// Empty store holding the guest profile
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            scope: None,
            profile: UserProfile::guest(),
            reports: Vec::new(),
        }
    }

    pub fn scope(&self) -> Option<&UserScope> {
        self.scope.as_ref()
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn reports(&self) -> &[LabReportData] {
        &self.reports
    }

    pub fn find_report(&self, id: &str) -> Option<&LabReportData> {
        self.reports.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// Swap in a fresh token for the same user
    pub fn refresh_scope(&mut self, scope: UserScope) {
        if self.scope.as_ref().map(UserScope::user_id) == Some(scope.user_id()) {
            self.scope = Some(scope);
        }
    }

    fn require_scope(&self) -> Result<UserScope, StoreError> {
        self.scope.clone().ok_or(StoreError::NoSession)
    }

    /// Populate from the remote store for `scope`.
    ///
    /// Profile and reports are fetched concurrently and degrade
    /// independently: a failed profile fetch still shows the reports.
    pub async fn load(&mut self, scope: UserScope) -> LoadOutcome {
        let (profile, reports) = tokio::join!(
            self.remote.fetch_profile(&scope),
            self.remote.list_reports(&scope)
        );

        let mut outcome = LoadOutcome::default();

        self.profile = match profile {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                info!(user_id = %scope.user_id(), "No stored profile, using guest profile");
                outcome.profile_fallback = true;
                UserProfile::guest()
            }
            Err(e) => {
                warn!(user_id = %scope.user_id(), error = %e, "Profile load failed, using guest profile");
                outcome.profile_fallback = true;
                UserProfile::guest()
            }
        };

        self.reports = match reports {
            Ok(reports) => dedupe(reports),
            Err(e) => {
                warn!(user_id = %scope.user_id(), error = %e, "Report load failed, starting empty");
                outcome.reports_fallback = true;
                Vec::new()
            }
        };

        info!(
            user_id = %scope.user_id(),
            reports = self.reports.len(),
            "Session data loaded"
        );
        self.scope = Some(scope);
        outcome
    }

    /// Store a new report and put it at the head of the list.
    ///
    /// With a session the report is inserted remotely first and reflected
    /// with its server id. Without one it stays local, without an id.
    pub async fn add_report(&mut self, draft: LabReportData) -> Result<LabReportData, StoreError> {
        let report = match &self.scope {
            Some(scope) => {
                let saved = self.remote.insert_report(scope, &draft).await?;
                info!(user_id = %scope.user_id(), report_id = ?saved.id, "Report saved");
                saved
            }
            None => LabReportData { id: None, ..draft },
        };

        if let Some(id) = report.id.as_deref() {
            self.reports.retain(|r| r.id.as_deref() != Some(id));
        }
        self.reports.insert(0, report.clone());
        Ok(report)
    }

    /// Delete a report; the remote delete must succeed first
    pub async fn delete_report(&mut self, id: &str) -> Result<(), StoreError> {
        if let Some(scope) = &self.scope {
            self.remote.delete_report(scope, id).await?;
            info!(user_id = %scope.user_id(), report_id = id, "Report deleted");
        }
        self.reports.retain(|r| r.id.as_deref() != Some(id));
        Ok(())
    }

    /// Delete every report of the user
    pub async fn clear_all(&mut self) -> Result<(), StoreError> {
        if let Some(scope) = &self.scope {
            self.remote.delete_all_reports(scope).await?;
            info!(user_id = %scope.user_id(), "All reports deleted");
        }
        self.reports.clear();
        Ok(())
    }

    /// Forget everything held locally. Nothing is deleted remotely.
    pub fn reset(&mut self) {
        self.scope = None;
        self.profile = UserProfile::guest();
        self.reports.clear();
    }

    /// Save the profile remotely, then reflect it
    pub async fn save_profile(&mut self, mut profile: UserProfile) -> Result<(), StoreError> {
        if let Some(scope) = &self.scope {
            self.remote.upsert_profile(scope, &profile).await?;
            profile.id = Some(scope.user_id().to_string());
            info!(user_id = %scope.user_id(), "Profile saved");
        }
        self.profile = profile;
        Ok(())
    }

    /// Replace local state with a restored backup. Nothing is written
    /// remotely until [`persist_snapshot`](Self::persist_snapshot).
    pub fn import(&mut self, backup: BackupData) {
        self.profile = backup.user;
        self.reports = dedupe(backup.reports);
    }

    /// Write the in-memory snapshot to the remote store.
    ///
    /// Upserts the profile, then inserts, oldest first, every report whose
    /// id the store does not already hold. Each server id is reflected as
    /// soon as its insert lands.
    pub async fn persist_snapshot(&mut self) -> Result<PersistOutcome, StoreError> {
        let scope = self.require_scope()?;

        self.remote.upsert_profile(&scope, &self.profile).await?;
        self.profile.id = Some(scope.user_id().to_string());

        let existing: HashSet<String> = self
            .remote
            .list_reports(&scope)
            .await?
            .into_iter()
            .filter_map(|r| r.id)
            .collect();

        let mut outcome = PersistOutcome::default();
        for index in (0..self.reports.len()).rev() {
            let already_stored = self.reports[index]
                .id
                .as_ref()
                .is_some_and(|id| existing.contains(id));
            if already_stored {
                outcome.skipped += 1;
                continue;
            }

            let saved = self.remote.insert_report(&scope, &self.reports[index]).await?;
            self.reports[index] = saved;
            outcome.inserted += 1;
        }

        info!(
            user_id = %scope.user_id(),
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "Snapshot persisted"
        );
        Ok(outcome)
    }

    /// Backup document of the current state
    pub fn export(&self) -> Result<BackupDocument, ExportError> {
        export_backup(&self.profile, &self.reports, Utc::now())
    }
}

/// Keep the first occurrence of every id; reports without an id are kept
fn dedupe(reports: Vec<LabReportData>) -> Vec<LabReportData> {
    let mut seen = HashSet::new();
    reports
        .into_iter()
        .filter(|r| match &r.id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}
