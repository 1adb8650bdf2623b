//! Collaborator seams between the turn orchestrator and storage.
//!
//! The orchestrator and the HTTP layer only see these traits. [`PgStore`]
//! implements all of them over a shared `PgPool` by delegating to the
//! repositories; tests substitute in-memory implementations.

use async_trait::async_trait;
use sqlx::PgPool;

use shopchat_core::{ConversationId, MessageSender, OrderId, UserId};

use super::{
    CatalogRepository, ConversationRepository, ProductQuery, RepositoryError, UserRepository,
};
use crate::models::{Conversation, Message, OrderSummary, ProductSummary, User};

/// Read access to customer accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// List users ordered by ID.
    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, RepositoryError>;
}

/// Durable, append-only conversation history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation owned by `user_id`.
    async fn create_conversation(&self, user_id: UserId) -> Result<Conversation, RepositoryError>;

    /// Look up a conversation by ID.
    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// List a user's conversations, most recent first.
    async fn list_conversations(&self, user_id: UserId)
    -> Result<Vec<Conversation>, RepositoryError>;

    /// Set a conversation's title.
    async fn set_title(&self, id: ConversationId, title: &str) -> Result<(), RepositoryError>;

    /// Append a message to a conversation.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender: MessageSender,
        content: &str,
    ) -> Result<Message, RepositoryError>;

    /// All messages of a conversation, oldest first.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Read-only product and order lookups used by the assistant's tools.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Find a single product.
    async fn find_product(
        &self,
        query: &ProductQuery,
    ) -> Result<Option<ProductSummary>, RepositoryError>;

    /// Find an order, only if it belongs to `user_id`.
    async fn find_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderSummary>, RepositoryError>;
}

/// `PostgreSQL`-backed implementation of every storage seam.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_user(id).await
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list_users(skip, limit).await
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn create_conversation(&self, user_id: UserId) -> Result<Conversation, RepositoryError> {
        ConversationRepository::new(&self.pool)
            .create_conversation(user_id)
            .await
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        ConversationRepository::new(&self.pool)
            .get_conversation(id)
            .await
    }

    async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        ConversationRepository::new(&self.pool)
            .list_conversations(user_id)
            .await
    }

    async fn set_title(&self, id: ConversationId, title: &str) -> Result<(), RepositoryError> {
        ConversationRepository::new(&self.pool)
            .update_title(id, title)
            .await
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender: MessageSender,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        ConversationRepository::new(&self.pool)
            .add_message(conversation_id, sender, content)
            .await
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        ConversationRepository::new(&self.pool)
            .get_messages(conversation_id)
            .await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogLookup for PgStore {
    async fn find_product(
        &self,
        query: &ProductQuery,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let product = CatalogRepository::new(&self.pool).find_product(query).await?;
        Ok(product.map(Into::into))
    }

    async fn find_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .find_order(order_id, user_id)
            .await
    }
}
