//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Clients, the token verifier and the classifier are built once at
//! startup. Every field is an `Arc` or already cheap to clone; the only
//! mutable part is the per-user session registry.

use crate::analysis::{AnalysisService, HttpAnalysisClient};
use crate::auth::SessionVerifier;
use crate::config::AppConfig;
use crate::gateway::{RemoteStore, RestGateway};
use crate::services::SessionRegistry;
use anyhow::Result;
use healthwise_shared::classifier::{Classifier, CriticalRules};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Active sessions, one per signed-in user
    pub sessions: SessionRegistry,
    /// Remote persistence gateway
    pub remote: Arc<dyn RemoteStore>,
    /// Document analysis and assistant client
    pub analysis: Arc<dyn AnalysisService>,
    /// Result classifier with the configured critical rules
    pub classifier: Arc<Classifier>,
    verifier: SessionVerifier,
}

impl AppState {
    /// Build the HTTP clients from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let remote = Arc::new(RestGateway::new(&config.persistence)?);
        let analysis = Arc::new(HttpAnalysisClient::new(&config.analysis)?);
        Ok(Self::with_services(config, remote, analysis))
    }

    /// Assemble state around existing service implementations
    pub fn with_services(
        config: AppConfig,
        remote: Arc<dyn RemoteStore>,
        analysis: Arc<dyn AnalysisService>,
    ) -> Self {
        let verifier = SessionVerifier::new(&config.auth.jwt_secret, &config.auth.audience);
        let classifier = Classifier::new(CriticalRules::new(
            config.classifier.critical_rules.clone(),
        ));

        Self {
            sessions: SessionRegistry::new(
                remote.clone(),
                Duration::from_secs(config.session.idle_timeout_secs),
            ),
            config: Arc::new(config),
            remote,
            analysis,
            classifier: Arc::new(classifier),
            verifier,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the token verifier
    #[inline]
    pub fn verifier(&self) -> &SessionVerifier {
        &self.verifier
    }
}
