//! Assistant chat API route

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::services::ChatService;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use healthwise_shared::{ChatReply, ChatRequest};

/// Create chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/", post(send_message))
}

/// POST /api/v1/chat - Ask the assistant about a report
async fn send_message(
    State(state): State<AppState>,
    user: SessionUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    ChatService::validate(&request)?;

    let context = {
        let session = state.sessions.active(&user.scope).await;
        let manager = session.lock().await;
        ChatService::context(&manager, request.report_id.as_deref())?
    };

    let reply = ChatService::reply(state.analysis.as_ref(), &request, context.as_ref()).await;
    Ok(Json(reply))
}
