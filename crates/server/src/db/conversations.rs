//! Database operations for conversations and their messages.
//!
//! Messages are append-only: this repository has no update or delete for them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopchat_core::{ConversationId, MessageId, MessageSender, UserId};

use super::RepositoryError;
use crate::models::{Conversation, Message};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` conversation queries.
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: i32,
    user_id: i32,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    title: Option<String>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: ConversationId::new(row.id),
            user_id: UserId::new(row.user_id),
            start_time: row.start_time,
            end_time: row.end_time,
            title: row.title,
        }
    }
}

/// Internal row type for `PostgreSQL` message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    conversation_id: i32,
    sender: MessageSender,
    content: String,
    timestamp: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::new(row.id),
            conversation_id: ConversationId::new(row.conversation_id),
            sender: row.sender,
            content: row.content,
            timestamp: row.timestamp,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for conversation database operations.
pub struct ConversationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConversationRepository<'a> {
    /// Create a new conversation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new conversation owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_conversation(
        &self,
        user_id: UserId,
    ) -> Result<Conversation, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r"
            INSERT INTO conversations (user_id)
            VALUES ($1)
            RETURNING id, user_id, start_time, end_time, title
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a conversation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r"
            SELECT id, user_id, start_time, end_time, title
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a user's conversations, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r"
            SELECT id, user_id, start_time, end_time, title
            FROM conversations
            WHERE user_id = $1
            ORDER BY start_time DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set a conversation's title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the conversation doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_title(&self, id: ConversationId, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE conversations
            SET title = $1
            WHERE id = $2
            ",
        )
        .bind(title)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Append a message to a conversation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_message(
        &self,
        conversation_id: ConversationId,
        sender: MessageSender,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r"
            INSERT INTO messages (conversation_id, sender, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender, content, timestamp
            ",
        )
        .bind(conversation_id)
        .bind(sender)
        .bind(content)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get all messages for a conversation, oldest first.
    ///
    /// Ties on `timestamp` are broken by insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"
            SELECT id, conversation_id, sender, content, timestamp
            FROM messages
            WHERE conversation_id = $1
            ORDER BY timestamp ASC, id ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
