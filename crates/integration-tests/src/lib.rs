//! Integration test support for the shopchat assistant.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopchat-integration-tests
//! ```
//!
//! The scenarios run the real turn orchestrator and axum router against the
//! in-memory collaborators below, so no database or API key is needed:
//!
//! - [`InMemoryStore`] - users, catalog, orders and conversation history
//! - [`ScriptedCompletion`] - replays queued model replies and records every call

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use shopchat_core::{ConversationId, MessageId, MessageSender, OrderId, ProductId, UserId};
use shopchat_server::completion::{
    CompletionClient, CompletionError, PromptTurn, SamplingParams,
};
use shopchat_server::db::{
    CatalogLookup, ConversationStore, ProductQuery, RepositoryError, UserDirectory, page_bounds,
};
use shopchat_server::models::{
    Conversation, LineItemSummary, Message, OrderSummary, ProductSummary, User,
};
use shopchat_server::services::ChatConfig;
use shopchat_server::state::AppState;

// =============================================================================
// Fixtures
// =============================================================================

/// A customer with only the fields the assistant reads.
#[must_use]
pub fn user(id: i32, first_name: &str) -> User {
    User {
        id: UserId::new(id),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("user{id}@example.com"),
        age: None,
        gender: None,
        state: None,
        street_address: None,
        postal_code: None,
        city: None,
        country: None,
        latitude: None,
        longitude: None,
        traffic_source: None,
        created_at: None,
    }
}

/// A catalog product priced in whole cents.
#[must_use]
pub fn product(id: i32, name: &str, price_cents: i64) -> ProductSummary {
    ProductSummary {
        product_id: ProductId::new(id),
        name: name.to_string(),
        category: Some("Outerwear & Coats".to_string()),
        brand: Some("Acme".to_string()),
        price: Decimal::new(price_cents, 2),
        department: Some("Women".to_string()),
        sku: None,
    }
}

/// An order with one line item.
#[must_use]
pub fn order(id: i32, status: &str, item_name: &str) -> OrderSummary {
    OrderSummary {
        order_id: OrderId::new(id),
        status: status.to_string(),
        created_at: Some(Utc::now()),
        shipped_at: None,
        delivered_at: None,
        returned_at: None,
        num_of_item: 1,
        items: vec![LineItemSummary {
            product_name: item_name.to_string(),
            status: status.to_string(),
            sale_price: Decimal::new(5999, 2),
        }],
    }
}

/// Application state over the given collaborators with default sampling.
#[must_use]
pub fn app_state(store: &Arc<InMemoryStore>, completion: &Arc<ScriptedCompletion>) -> AppState {
    AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        completion.clone(),
        ChatConfig::default(),
    )
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    products: Vec<ProductSummary>,
    orders: Vec<(UserId, OrderSummary)>,
    conversations: BTreeMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    next_conversation_id: i32,
    next_message_id: i32,
    product_lookups: Vec<ProductQuery>,
    order_lookups: Vec<(OrderId, UserId)>,
    catalog_down: bool,
    store_down: bool,
}

/// Users, catalog and conversation history held in memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a customer.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.state.get_mut().users.insert(user.id, user);
        self
    }

    /// Add a catalog product.
    #[must_use]
    pub fn with_product(mut self, product: ProductSummary) -> Self {
        self.state.get_mut().products.push(product);
        self
    }

    /// Add an order owned by `owner`.
    #[must_use]
    pub fn with_order(mut self, owner: UserId, order: OrderSummary) -> Self {
        self.state.get_mut().orders.push((owner, order));
        self
    }

    /// Make every catalog lookup fail.
    pub async fn set_catalog_down(&self, down: bool) {
        self.state.lock().await.catalog_down = down;
    }

    /// Make every conversation store call fail.
    pub async fn set_store_down(&self, down: bool) {
        self.state.lock().await.store_down = down;
    }

    /// Messages of one conversation, oldest first.
    pub async fn messages(&self, conversation_id: ConversationId) -> Vec<Message> {
        self.state
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    /// Total number of stored messages across all conversations.
    pub async fn message_count(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    /// Number of conversations created.
    pub async fn conversation_count(&self) -> usize {
        self.state.lock().await.conversations.len()
    }

    /// A stored conversation.
    pub async fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.state.lock().await.conversations.get(&id).cloned()
    }

    /// Every product lookup made so far.
    pub async fn product_lookups(&self) -> Vec<ProductQuery> {
        self.state.lock().await.product_lookups.clone()
    }

    /// Every order lookup made so far, as `(order, caller)`.
    pub async fn order_lookups(&self) -> Vec<(OrderId, UserId)> {
        self.state.lock().await.order_lookups.clone()
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::DataCorruption("store unavailable".to_string())
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let (skip, limit) = page_bounds(skip, limit);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn create_conversation(&self, user_id: UserId) -> Result<Conversation, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.store_down {
            return Err(unavailable());
        }
        state.next_conversation_id += 1;
        let conversation = Conversation {
            id: ConversationId::new(state.next_conversation_id),
            user_id,
            start_time: Utc::now(),
            end_time: None,
            title: None,
        };
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let state = self.state.lock().await;
        if state.store_down {
            return Err(unavailable());
        }
        Ok(state.conversations.get(&id).cloned())
    }

    async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().await;
        // Newest first; ids increase with creation order
        Ok(state
            .conversations
            .values()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_title(&self, id: ConversationId, title: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.title = Some(title.to_string());
        Ok(())
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender: MessageSender,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.store_down {
            return Err(unavailable());
        }
        if !state.conversations.contains_key(&conversation_id) {
            return Err(RepositoryError::NotFound);
        }
        state.next_message_id += 1;
        let message = Message {
            id: MessageId::new(state.next_message_id),
            conversation_id,
            sender,
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self.messages(conversation_id).await)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.state.lock().await.store_down {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogLookup for InMemoryStore {
    async fn find_product(
        &self,
        query: &ProductQuery,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let mut state = self.state.lock().await;
        state.product_lookups.push(query.clone());
        if state.catalog_down {
            return Err(unavailable());
        }

        let found = match query {
            ProductQuery::ById(id) => state.products.iter().find(|p| p.product_id == *id),
            ProductQuery::ByName(name) => {
                let needle = name.to_lowercase();
                state
                    .products
                    .iter()
                    .filter(|p| p.name.to_lowercase().contains(&needle))
                    .min_by_key(|p| p.product_id)
            }
        };
        Ok(found.cloned())
    }

    async fn find_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        let mut state = self.state.lock().await;
        state.order_lookups.push((order_id, user_id));
        if state.catalog_down {
            return Err(unavailable());
        }

        Ok(state
            .orders
            .iter()
            .find(|(owner, order)| *owner == user_id && order.order_id == order_id)
            .map(|(_, order)| order.clone()))
    }
}

// =============================================================================
// Scripted completion
// =============================================================================

/// One recorded completion call.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub turns: Vec<PromptTurn>,
    pub params: SamplingParams,
}

/// Completion client that replays queued replies in order.
///
/// When the queue runs dry every further call fails.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<CompletionCall>>,
}

impl ScriptedCompletion {
    /// A client with no queued replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(text.into()));
        self
    }

    /// Queue a failed call.
    #[must_use]
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Err(reason.into()));
        self
    }

    /// Every call made so far.
    pub async fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        turns: &[PromptTurn],
        params: SamplingParams,
    ) -> Result<String, CompletionError> {
        self.calls.lock().await.push(CompletionCall {
            turns: turns.to_vec(),
            params,
        });

        match self.replies.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(CompletionError::Other(reason)),
            None => Err(CompletionError::Other("no scripted reply left".to_string())),
        }
    }
}
