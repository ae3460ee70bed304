//! PostgREST-style HTTP implementation of [`RemoteStore`]

use super::mapping::{self, PROFILE_COLUMNS, REPORT_COLUMNS};
use super::{PersistenceError, RemoteStore, UserScope};
use crate::config::PersistenceConfig;
use async_trait::async_trait;
use healthwise_shared::{LabReportData, UserProfile};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the hosted persistence service
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: Arc<SecretString>,
}

impl RestGateway {
    pub fn new(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: Arc::new(SecretString::new(config.api_key.clone())),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder, scope: &UserScope) -> RequestBuilder {
        request
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(scope.access_token())
    }

    async fn check(response: Response) -> Result<Response, PersistenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);

        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(response: Response) -> Result<Vec<Value>, PersistenceError> {
        Self::check(response)
            .await?
            .json::<Vec<Value>>()
            .await
            .map_err(|e| PersistenceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for RestGateway {
    async fn fetch_profile(
        &self,
        scope: &UserScope,
    ) -> Result<Option<UserProfile>, PersistenceError> {
        debug!(user_id = %scope.user_id(), "Fetching profile");

        let request = self
            .client
            .get(self.table_url(PROFILE_COLUMNS.table))
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", scope.user_id())),
            ]);
        let rows = Self::rows(self.authorized(request, scope).send().await?).await?;

        rows.first()
            .map(mapping::profile_from_row)
            .transpose()
            .map_err(|e| PersistenceError::Decode(e.to_string()))
    }

    async fn upsert_profile(
        &self,
        scope: &UserScope,
        profile: &UserProfile,
    ) -> Result<(), PersistenceError> {
        debug!(user_id = %scope.user_id(), "Upserting profile");

        let row = mapping::profile_to_row(profile, scope.user_id())
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;
        let request = self
            .client
            .post(self.table_url(PROFILE_COLUMNS.table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);

        Self::check(self.authorized(request, scope).send().await?).await?;
        Ok(())
    }

    async fn list_reports(
        &self,
        scope: &UserScope,
    ) -> Result<Vec<LabReportData>, PersistenceError> {
        debug!(user_id = %scope.user_id(), "Listing reports");

        let request = self
            .client
            .get(self.table_url(REPORT_COLUMNS.table))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", scope.user_id())),
                ("order", "created_at.desc".to_string()),
            ]);
        let rows = Self::rows(self.authorized(request, scope).send().await?).await?;

        // One unreadable row must not hide the rest of the history
        Ok(rows
            .iter()
            .filter_map(|row| match mapping::report_from_row(row) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(user_id = %scope.user_id(), error = %e, "Skipping unreadable report row");
                    None
                }
            })
            .collect())
    }

    async fn insert_report(
        &self,
        scope: &UserScope,
        report: &LabReportData,
    ) -> Result<LabReportData, PersistenceError> {
        debug!(user_id = %scope.user_id(), "Inserting report");

        let row = mapping::report_to_row(report, scope.user_id())
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;
        let request = self
            .client
            .post(self.table_url(REPORT_COLUMNS.table))
            .header("Prefer", "return=representation")
            .json(&row);
        let rows = Self::rows(self.authorized(request, scope).send().await?).await?;

        let stored = rows
            .first()
            .ok_or_else(|| PersistenceError::Decode("insert returned no rows".to_string()))?;
        let mut saved =
            mapping::report_from_row(stored).map_err(|e| PersistenceError::Decode(e.to_string()))?;
        if saved.id.is_none() {
            return Err(PersistenceError::Decode(
                "inserted report has no id".to_string(),
            ));
        }

        // Not a column; carry it over from the draft
        saved.patient_name = report.patient_name.clone();
        Ok(saved)
    }

    async fn delete_report(
        &self,
        scope: &UserScope,
        report_id: &str,
    ) -> Result<(), PersistenceError> {
        debug!(user_id = %scope.user_id(), report_id, "Deleting report");

        let request = self
            .client
            .delete(self.table_url(REPORT_COLUMNS.table))
            .query(&[
                ("id", format!("eq.{}", report_id)),
                ("user_id", format!("eq.{}", scope.user_id())),
            ]);

        Self::check(self.authorized(request, scope).send().await?).await?;
        Ok(())
    }

    async fn delete_all_reports(&self, scope: &UserScope) -> Result<(), PersistenceError> {
        debug!(user_id = %scope.user_id(), "Deleting all reports");

        let request = self
            .client
            .delete(self.table_url(REPORT_COLUMNS.table))
            .query(&[("user_id", format!("eq.{}", scope.user_id()))]);

        Self::check(self.authorized(request, scope).send().await?).await?;
        Ok(())
    }
}
