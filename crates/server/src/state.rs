//! Application state shared across handlers.

use std::sync::Arc;

use crate::completion::CompletionClient;
use crate::db::{CatalogLookup, ConversationStore, UserDirectory};
use crate::services::{ChatConfig, ChatService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The collaborators are trait
/// objects so the same router serves `PostgreSQL` in production and
/// in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    users: Arc<dyn UserDirectory>,
    conversations: Arc<dyn ConversationStore>,
    catalog: Arc<dyn CatalogLookup>,
    completion: Arc<dyn CompletionClient>,
    chat_config: ChatConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        conversations: Arc<dyn ConversationStore>,
        catalog: Arc<dyn CatalogLookup>,
        completion: Arc<dyn CompletionClient>,
        chat_config: ChatConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                users,
                conversations,
                catalog,
                completion,
                chat_config,
            }),
        }
    }

    /// Get a reference to the conversation store.
    #[must_use]
    pub fn conversations(&self) -> &dyn ConversationStore {
        self.inner.conversations.as_ref()
    }

    /// Build a chat service over the shared collaborators.
    #[must_use]
    pub fn chat(&self) -> ChatService<'_> {
        ChatService::new(
            self.inner.users.as_ref(),
            self.inner.conversations.as_ref(),
            self.inner.catalog.as_ref(),
            self.inner.completion.as_ref(),
            self.inner.chat_config,
        )
    }
}
