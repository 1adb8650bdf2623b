//! Conversation and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopchat_core::{ConversationId, MessageId, MessageSender, UserId};

/// A conversation between one customer and the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID.
    pub id: ConversationId,
    /// Customer who owns this conversation. Never changes after creation.
    pub user_id: UserId,
    /// When the conversation was created.
    pub start_time: DateTime<Utc>,
    /// When the conversation was closed, if ever.
    pub end_time: Option<DateTime<Utc>>,
    /// Optional title (derived from the first message).
    pub title: Option<String>,
}

impl Conversation {
    /// Whether `user_id` owns this conversation.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// A message in a conversation. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// Conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// Who wrote the message.
    pub sender: MessageSender,
    /// Message text.
    pub content: String,
    /// When the message was stored.
    pub timestamp: DateTime<Utc>,
}
