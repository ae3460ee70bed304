//! Session lifecycle
//!
//! Reacts to sign-in and sign-out events. A sign-in always starts from a
//! fresh [`ReportStore`], so data of a previous user is never visible to
//! the next one; a sign-out forgets local state without deleting anything
//! remotely.

use super::store::{LoadOutcome, ReportStore, StoreError};
use crate::gateway::{RemoteStore, UserScope};
use healthwise_shared::LabReportData;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Loading,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Loading => "loading",
            SessionState::Authenticated => "authenticated",
        })
    }
}

/// Events from the auth provider
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(UserScope),
    SignedOut,
}

/// Owns the store of one session and the report being viewed
pub struct SessionManager {
    remote: Arc<dyn RemoteStore>,
    state: SessionState,
    store: Option<ReportStore>,
    active_report: Option<String>,
    last_load: LoadOutcome,
}

impl SessionManager {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            state: SessionState::Unauthenticated,
            store: None,
            active_report: None,
            last_load: LoadOutcome::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> Option<&ReportStore> {
        self.store.as_ref()
    }

    /// Outcome of the most recent load
    pub fn last_load(&self) -> LoadOutcome {
        self.last_load
    }

    /// The signed-in user, if any
    pub fn user_id(&self) -> Option<Uuid> {
        self.store
            .as_ref()
            .and_then(ReportStore::scope)
            .map(UserScope::user_id)
    }

    pub fn require_store(&self) -> Result<&ReportStore, StoreError> {
        self.store.as_ref().ok_or(StoreError::NoSession)
    }

    pub fn store_mut(&mut self) -> Result<&mut ReportStore, StoreError> {
        self.store.as_mut().ok_or(StoreError::NoSession)
    }

    /// Apply a session event
    pub async fn handle(&mut self, event: SessionEvent) -> Option<LoadOutcome> {
        match event {
            SessionEvent::SignedIn(scope) => {
                if self.store.is_some() {
                    self.tear_down();
                }

                info!(user_id = %scope.user_id(), "Session started, loading data");
                self.state = SessionState::Loading;

                let mut store = ReportStore::new(self.remote.clone());
                let outcome = store.load(scope).await;

                self.store = Some(store);
                self.last_load = outcome;
                self.state = SessionState::Authenticated;
                Some(outcome)
            }
            SessionEvent::SignedOut => {
                if let Some(user_id) = self.user_id() {
                    info!(user_id = %user_id, "Session ended");
                }
                self.tear_down();
                None
            }
        }
    }

    fn tear_down(&mut self) {
        if let Some(store) = self.store.as_mut() {
            store.reset();
        }
        self.store = None;
        self.active_report = None;
        self.last_load = LoadOutcome::default();
        self.state = SessionState::Unauthenticated;
    }

    /// Report currently being viewed
    pub fn active_report(&self) -> Option<&LabReportData> {
        let id = self.active_report.as_deref()?;
        self.store.as_ref()?.find_report(id)
    }

    pub fn active_report_id(&self) -> Option<&str> {
        self.active_report.as_deref()
    }

    /// Mark a report as viewed and return it
    pub fn view_report(&mut self, id: &str) -> Option<&LabReportData> {
        let store = self.store.as_ref()?;
        let report = store.find_report(id)?;
        self.active_report = Some(id.to_string());
        Some(report)
    }

    /// Delete a report, dropping the view pointer if it pointed there
    pub async fn delete_report(&mut self, id: &str) -> Result<(), StoreError> {
        self.store_mut()?.delete_report(id).await?;
        if self.active_report.as_deref() == Some(id) {
            self.active_report = None;
        }
        Ok(())
    }

    /// Delete all reports and drop the view pointer
    pub async fn clear_all(&mut self) -> Result<(), StoreError> {
        self.store_mut()?.clear_all().await?;
        self.active_report = None;
        Ok(())
    }
}

struct Slot {
    session: Arc<Mutex<SessionManager>>,
    last_seen: Instant,
}

/// Session managers keyed by user, one mutation at a time per user
///
/// Sessions nobody has touched for `idle_timeout` are dropped by
/// [`SessionRegistry::evict_idle`]; the next request of that user loads a
/// fresh one.
#[derive(Clone)]
pub struct SessionRegistry {
    remote: Arc<dyn RemoteStore>,
    idle_timeout: Duration,
    sessions: Arc<RwLock<HashMap<Uuid, Slot>>>,
}

impl SessionRegistry {
    pub fn new(remote: Arc<dyn RemoteStore>, idle_timeout: Duration) -> Self {
        Self {
            remote,
            idle_timeout,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn entry(&self, user_id: Uuid) -> Arc<Mutex<SessionManager>> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.entry(user_id).or_insert_with(|| Slot {
            session: Arc::new(Mutex::new(SessionManager::new(self.remote.clone()))),
            last_seen: Instant::now(),
        });
        slot.last_seen = Instant::now();
        slot.session.clone()
    }

    /// Drop idle sessions no request is holding; returns how many
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| {
            Arc::strong_count(&slot.session) > 1 || slot.last_seen.elapsed() < self.idle_timeout
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Number of live sessions
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start (or restart) the session of `scope`'s user
    pub async fn sign_in(&self, scope: UserScope) -> Arc<Mutex<SessionManager>> {
        let session = self.entry(scope.user_id()).await;
        session.lock().await.handle(SessionEvent::SignedIn(scope)).await;
        session
    }

    /// Session of `scope`'s user, signing in first if it is not active
    pub async fn active(&self, scope: &UserScope) -> Arc<Mutex<SessionManager>> {
        let session = self.entry(scope.user_id()).await;
        {
            let mut manager = session.lock().await;
            if manager.state == SessionState::Authenticated {
                if let Some(store) = manager.store.as_mut() {
                    store.refresh_scope(scope.clone());
                }
            } else {
                manager.handle(SessionEvent::SignedIn(scope.clone())).await;
            }
        }
        session
    }

    /// End the session of `user_id`, if there is one
    pub async fn sign_out(&self, user_id: Uuid) {
        let slot = self.sessions.write().await.remove(&user_id);
        if let Some(Slot { session, .. }) = slot {
            session.lock().await.handle(SessionEvent::SignedOut).await;
        }
    }

    /// Current session of `user_id` without starting one
    pub async fn get(&self, user_id: Uuid) -> Option<Arc<Mutex<SessionManager>>> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .map(|slot| slot.session.clone())
    }
}
