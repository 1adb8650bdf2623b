//! Conversation history endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use shopchat_core::{ConversationId, MessageSender};

use crate::error::AppError;
use crate::models::{Conversation, Message};
use crate::state::AppState;

/// Build the conversations router.
pub fn router() -> Router<AppState> {
    Router::new().route("/conversations/{id}/messages", get(list_messages))
}

/// Response for a conversation.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.as_i32(),
            user_id: conversation.user_id.as_i32(),
            title: conversation.title,
            start_time: conversation.start_time.to_rfc3339(),
            end_time: conversation.end_time.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response for a chat message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i32,
    pub conversation_id: i32,
    pub sender: MessageSender,
    pub content: String,
    pub timestamp: String,
}

impl From<Message> for MessageResponse {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id.as_i32(),
            conversation_id: msg.conversation_id.as_i32(),
            sender: msg.sender,
            content: msg.content,
            timestamp: msg.timestamp.to_rfc3339(),
        }
    }
}

/// All messages of a conversation, oldest first.
///
/// GET /conversations/{id}/messages
async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = state
        .chat()
        .list_messages(ConversationId::new(id))
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}
