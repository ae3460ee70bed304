//! Document analysis and assistant client
//!
//! The analysis service turns an uploaded lab document into a populated
//! report and answers questions about a report. Both are consumed as
//! black boxes over HTTP.

use crate::config::AnalysisConfig;
use async_trait::async_trait;
use healthwise_shared::{ChatTurn, LabReportData};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Shown when an upload cannot be analyzed, whatever the cause
pub const ANALYSIS_FAILURE_MESSAGE: &str =
    "Failed to analyze document. Please ensure the backend server is running and the API key is valid.";

/// Assistant reply when the chat service cannot be reached
pub const CHAT_APOLOGY: &str =
    "I'm sorry, I'm having trouble connecting to the server right now.";

/// An uploaded document, already read into memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis service error: {0}")]
    Service(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Analysis and chat operations
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Extract a report from a document
    async fn analyze(&self, file: UploadedFile) -> Result<LabReportData, AnalysisError>;

    /// Answer a message given the conversation so far and an optional report
    async fn chat(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&LabReportData>,
    ) -> Result<String, AnalysisError>;
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    history: &'a [ChatTurn],
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a LabReportData>,
}

#[derive(Deserialize)]
struct ChatPayloadReply {
    text: String,
}

#[derive(Deserialize)]
struct ServiceError {
    error: String,
}

/// HTTP client for the analysis service
#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn service_error(response: reqwest::Response) -> AnalysisError {
        let status = response.status();
        match response.json::<ServiceError>().await {
            Ok(body) => AnalysisError::Service(body.error),
            Err(_) => AnalysisError::Service(format!("status {}", status)),
        }
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, file: UploadedFile) -> Result<LabReportData, AnalysisError> {
        debug!(file_name = %file.file_name, size = file.bytes.len(), "Submitting document for analysis");

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        response
            .json::<LabReportData>()
            .await
            .map_err(|e| AnalysisError::Decode(e.to_string()))
    }

    async fn chat(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&LabReportData>,
    ) -> Result<String, AnalysisError> {
        debug!(turns = history.len(), with_context = context.is_some(), "Sending chat message");

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&ChatPayload {
                history,
                message,
                context,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let reply = response
            .json::<ChatPayloadReply>()
            .await
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        Ok(reply.text)
    }
}
