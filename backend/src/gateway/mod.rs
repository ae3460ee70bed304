//! Remote persistence gateway
//!
//! The remote store is the system of record for profiles and reports.
//! Every call is scoped by a [`UserScope`], which the auth layer builds
//! from a verified session token, so a caller can only ever reach its own
//! rows.

pub mod mapping;
mod rest;
#[cfg(test)]
pub(crate) mod testing;

pub use rest::RestGateway;

use async_trait::async_trait;
use healthwise_shared::{LabReportData, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Verified identity of the caller plus the token forwarded to the store
#[derive(Clone)]
pub struct UserScope {
    user_id: Uuid,
    access_token: Arc<SecretString>,
}

impl UserScope {
    /// Build a scope for an already verified session token
    pub fn new(user_id: Uuid, access_token: String) -> Self {
        Self {
            user_id,
            access_token: Arc::new(SecretString::new(access_token)),
        }
    }

    #[inline]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    #[inline]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl fmt::Debug for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserScope")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Remote store failures
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Operations the remote persistence service offers
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The caller's profile row, `None` when it does not exist yet
    async fn fetch_profile(&self, scope: &UserScope)
        -> Result<Option<UserProfile>, PersistenceError>;

    /// Insert or update the caller's profile row
    async fn upsert_profile(
        &self,
        scope: &UserScope,
        profile: &UserProfile,
    ) -> Result<(), PersistenceError>;

    /// The caller's reports, most recent first
    async fn list_reports(&self, scope: &UserScope) -> Result<Vec<LabReportData>, PersistenceError>;

    /// Insert a report and return it as stored, with its server id
    async fn insert_report(
        &self,
        scope: &UserScope,
        report: &LabReportData,
    ) -> Result<LabReportData, PersistenceError>;

    /// Delete one of the caller's reports
    async fn delete_report(&self, scope: &UserScope, report_id: &str)
        -> Result<(), PersistenceError>;

    /// Delete every report of the caller
    async fn delete_all_reports(&self, scope: &UserScope) -> Result<(), PersistenceError>;
}
