//! Assistant chat about a report

use super::session::SessionManager;
use crate::analysis::{AnalysisService, CHAT_APOLOGY};
use crate::error::ApiError;
use healthwise_shared::{ChatReply, ChatRequest, LabReportData, ValidationError};
use tracing::warn;

/// Longest message forwarded to the assistant, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Chat service
pub struct ChatService;

impl ChatService {
    /// Reject empty or oversized messages
    pub fn validate(request: &ChatRequest) -> Result<(), ValidationError> {
        let length = request.message.trim().chars().count();
        if length == 0 {
            return Err(ValidationError::field("message", "Message cannot be empty"));
        }
        if length > MAX_MESSAGE_CHARS {
            return Err(ValidationError::field(
                "message",
                format!("Message must be at most {} characters", MAX_MESSAGE_CHARS),
            ));
        }
        Ok(())
    }

    /// Report to discuss: the named one, else the one being viewed
    pub fn context(
        session: &SessionManager,
        report_id: Option<&str>,
    ) -> Result<Option<LabReportData>, ApiError> {
        match report_id {
            Some(id) => session
                .store()
                .and_then(|store| store.find_report(id))
                .cloned()
                .map(Some)
                .ok_or_else(|| ApiError::NotFound(format!("Report {} not found", id))),
            None => Ok(session.active_report().cloned()),
        }
    }

    /// Ask the assistant; any failure becomes an apology
    pub async fn reply(
        analysis: &dyn AnalysisService,
        request: &ChatRequest,
        context: Option<&LabReportData>,
    ) -> ChatReply {
        let text = match analysis
            .chat(&request.history, request.message.trim(), context)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Chat request failed, replying with apology");
                CHAT_APOLOGY.to_string()
            }
        };
        ChatReply { text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::FakeAnalysis;
    use crate::gateway::testing::FakeRemote;
    use crate::gateway::UserScope;
    use crate::services::session::SessionEvent;
    use healthwise_shared::{ChatRole, ChatTurn};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            history: vec![ChatTurn::new(ChatRole::User, "hi"), ChatTurn::new(ChatRole::Model, "hello")],
            message: message.to_string(),
            report_id: None,
        }
    }

    #[test]
    fn test_validate_message_length() {
        assert!(ChatService::validate(&request("What is LDL?")).is_ok());
        assert!(ChatService::validate(&request("   ")).is_err());
        assert!(ChatService::validate(&request(&"a".repeat(MAX_MESSAGE_CHARS + 1))).is_err());
    }

    #[tokio::test]
    async fn test_reply_passes_through() {
        let analysis = FakeAnalysis {
            reply: Mutex::new(Some("LDL is cholesterol.".to_string())),
            ..Default::default()
        };
        let reply = ChatService::reply(&analysis, &request("What is LDL?"), None).await;
        assert_eq!(reply.text, "LDL is cholesterol.");
    }

    #[tokio::test]
    async fn test_failure_degrades_to_apology() {
        let analysis = FakeAnalysis::default();
        let reply = ChatService::reply(&analysis, &request("What is LDL?"), None).await;
        assert_eq!(reply.text, CHAT_APOLOGY);
        assert_eq!(analysis.calls(), 1);
    }

    #[tokio::test]
    async fn test_context_prefers_named_report() {
        let remote = Arc::new(FakeRemote::new());
        let scope = UserScope::new(Uuid::new_v4(), "token".into());
        let first = remote.seed_report(
            scope.user_id(),
            LabReportData {
                lab_name: Some("First".to_string()),
                ..Default::default()
            },
        );
        let second = remote.seed_report(
            scope.user_id(),
            LabReportData {
                lab_name: Some("Second".to_string()),
                ..Default::default()
            },
        );

        let mut manager = SessionManager::new(remote);
        manager.handle(SessionEvent::SignedIn(scope)).await;
        assert!(ChatService::context(&manager, None).unwrap().is_none());

        manager.view_report(&first);
        let active = ChatService::context(&manager, None).unwrap().unwrap();
        assert_eq!(active.lab_name.as_deref(), Some("First"));

        let named = ChatService::context(&manager, Some(&second)).unwrap().unwrap();
        assert_eq!(named.lab_name.as_deref(), Some("Second"));

        assert!(matches!(
            ChatService::context(&manager, Some("missing")),
            Err(ApiError::NotFound(_))
        ));
    }
}
