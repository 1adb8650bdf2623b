//! Chat turn endpoint.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use shopchat_core::{ConversationId, MessageId, UserId};

use crate::error::AppError;
use crate::services::TurnOutcome;
use crate::state::AppState;

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(send_message))
}

/// Request to run one chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: UserId,
    pub message: String,
    /// Omit to start a new conversation.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

/// Result of a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: ConversationId,
    pub user_message: String,
    pub ai_response: String,
    pub message_id: MessageId,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            conversation_id: outcome.conversation_id,
            user_message: outcome.user_message,
            ai_response: outcome.reply,
            message_id: outcome.assistant_message_id,
        }
    }
}

/// Send a message and get the assistant's reply.
///
/// POST /api/chat
///
/// # Errors
///
/// 404 for an unknown user or an unknown/foreign conversation, 400 for an
/// empty message, 500 if storage fails.
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let outcome = state
        .chat()
        .handle_turn(request.user_id, &request.message, request.conversation_id)
        .await?;

    Ok(Json(outcome.into()))
}
