//! In-memory remote store for unit tests

use super::{PersistenceError, RemoteStore, UserScope};
use async_trait::async_trait;
use healthwise_shared::{LabReportData, UserProfile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct FakeRemote {
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
    /// Oldest first, as the store would order by creation time
    reports: Mutex<Vec<(Uuid, LabReportData)>>,
    next_id: AtomicU64,
    pub fail_profile: AtomicBool,
    pub fail_reports: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn seed_profile(&self, user_id: Uuid, profile: UserProfile) {
        self.profiles.lock().unwrap().insert(user_id, profile);
    }

    pub fn seed_report(&self, user_id: Uuid, mut report: LabReportData) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        report.id = Some(id.clone());
        report.user_id = Some(user_id.to_string());
        self.reports.lock().unwrap().push((user_id, report));
        id
    }

    pub fn report_count(&self, user_id: Uuid) -> usize {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .count()
    }

    pub fn stored_profile(&self, user_id: Uuid) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(&user_id).cloned()
    }

    fn rejected() -> PersistenceError {
        PersistenceError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_profile(
        &self,
        scope: &UserScope,
    ) -> Result<Option<UserProfile>, PersistenceError> {
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(self.stored_profile(scope.user_id()))
    }

    async fn upsert_profile(
        &self,
        scope: &UserScope,
        profile: &UserProfile,
    ) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        let mut stored = profile.clone();
        stored.id = Some(scope.user_id().to_string());
        self.seed_profile(scope.user_id(), stored);
        Ok(())
    }

    async fn list_reports(
        &self,
        scope: &UserScope,
    ) -> Result<Vec<LabReportData>, PersistenceError> {
        if self.fail_reports.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == scope.user_id())
            .map(|(_, report)| report.clone())
            .collect())
    }

    async fn insert_report(
        &self,
        scope: &UserScope,
        report: &LabReportData,
    ) -> Result<LabReportData, PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        let mut draft = report.clone();
        draft.id = None;
        let id = self.seed_report(scope.user_id(), draft);
        let reports = self.reports.lock().unwrap();
        let (_, stored) = reports
            .iter()
            .find(|(_, r)| r.id.as_deref() == Some(id.as_str()))
            .unwrap();
        Ok(stored.clone())
    }

    async fn delete_report(
        &self,
        scope: &UserScope,
        report_id: &str,
    ) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        self.reports.lock().unwrap().retain(|(owner, r)| {
            !(*owner == scope.user_id() && r.id.as_deref() == Some(report_id))
        });
        Ok(())
    }

    async fn delete_all_reports(&self, scope: &UserScope) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        self.reports
            .lock()
            .unwrap()
            .retain(|(owner, _)| *owner != scope.user_id());
        Ok(())
    }
}
