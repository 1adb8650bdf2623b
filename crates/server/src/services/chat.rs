//! Turn orchestration for customer chat.
//!
//! One turn is:
//! 1. Resolve the user and the conversation (creating one if needed)
//! 2. Save the user message
//! 3. Ask the model, which either answers or requests a tool call
//! 4. Run the tool and ask the model again with the result
//! 5. Save the assistant reply
//!
//! Identity and storage failures are returned to the caller. Anything that
//! goes wrong in steps 3-4 is replaced by [`FALLBACK_REPLY`], which is saved
//! like any other reply.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use shopchat_core::{ConversationId, MessageId, MessageSender, UserId};

use crate::completion::{CompletionClient, CompletionError, SamplingParams};
use crate::db::{CatalogLookup, ConversationStore, RepositoryError, UserDirectory};
use crate::models::{Conversation, Message, User};
use crate::tools::{Directive, DirectiveError, ToolExecutor, parse_reply};

use super::prompt::{PromptParams, build_prompt, with_tool_result};

/// Reply saved and returned when the completion pipeline fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Errors that can occur in the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// The user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// The conversation does not exist or belongs to someone else.
    #[error("conversation not found")]
    ConversationNotFound,

    /// The message is empty or whitespace only.
    #[error("message is empty")]
    EmptyMessage,
}

/// Failures inside the completion pipeline. Never leave the service.
#[derive(Debug, Error)]
enum PipelineError {
    #[error("failed to render prompt: {0}")]
    Prompt(#[from] askama::Error),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("malformed tool call: {0}")]
    Directive(#[from] DirectiveError),

    #[error("tool lookup failed: {0}")]
    Lookup(#[from] RepositoryError),

    #[error("failed to serialize tool output: {0}")]
    ToolOutput(#[from] serde_json::Error),
}

/// Sampling settings for the two completion passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatConfig {
    /// Pass 1: intent and parameter extraction.
    pub tool_pass: SamplingParams,
    /// Pass 2: final phrasing. Runs at a temperature at least as high as pass 1.
    pub reply_pass: SamplingParams,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            tool_pass: SamplingParams {
                temperature: 0.1,
                max_tokens: 512,
            },
            reply_pass: SamplingParams {
                temperature: 0.7,
                max_tokens: 1024,
            },
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub user_message: String,
    pub reply: String,
    pub assistant_message_id: MessageId,
}

/// Chat service for orchestrating customer conversations.
pub struct ChatService<'a> {
    users: &'a dyn UserDirectory,
    conversations: &'a dyn ConversationStore,
    catalog: &'a dyn CatalogLookup,
    completion: &'a dyn CompletionClient,
    config: ChatConfig,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub fn new(
        users: &'a dyn UserDirectory,
        conversations: &'a dyn ConversationStore,
        catalog: &'a dyn CatalogLookup,
        completion: &'a dyn CompletionClient,
        config: ChatConfig,
    ) -> Self {
        Self {
            users,
            conversations,
            catalog,
            completion,
            config,
        }
    }

    /// Handle one chat turn.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `ConversationNotFound` or `EmptyMessage` before
    /// anything is written, and `Database` if saving or loading messages fails.
    /// Completion failures are not errors; they produce [`FALLBACK_REPLY`].
    #[instrument(skip(self, message_text), fields(user_id = %user_id, conversation_id = ?conversation_id))]
    pub async fn handle_turn(
        &self,
        user_id: UserId,
        message_text: &str,
        conversation_id: Option<ConversationId>,
    ) -> Result<TurnOutcome, ChatError> {
        if message_text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let user = self.require_user(user_id).await?;

        let (conversation, is_new) = match conversation_id {
            Some(id) => (self.owned_conversation(id, user_id).await?, false),
            None => (self.conversations.create_conversation(user_id).await?, true),
        };

        let user_message = self
            .conversations
            .append_message(conversation.id, MessageSender::User, message_text)
            .await?;

        if is_new {
            self.assign_title(&conversation, message_text).await;
        }

        let history = self.conversations.list_messages(conversation.id).await?;

        let reply = match self.complete_turn(&user, &history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Completion pipeline failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };

        let assistant_message = self
            .conversations
            .append_message(conversation.id, MessageSender::Assistant, &reply)
            .await?;

        info!(
            conversation_id = %conversation.id,
            new_conversation = is_new,
            "Chat turn completed"
        );

        Ok(TurnOutcome {
            conversation_id: conversation.id,
            user_message: user_message.content,
            reply,
            assistant_message_id: assistant_message.id,
        })
    }

    /// List users, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>, ChatError> {
        Ok(self.users.list_users(skip, limit).await?)
    }

    /// List a user's conversations, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, ChatError> {
        self.require_user(user_id).await?;
        Ok(self.conversations.list_conversations(user_id).await?)
    }

    /// All messages of a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if the conversation does not exist.
    pub async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        if self
            .conversations
            .get_conversation(conversation_id)
            .await?
            .is_none()
        {
            return Err(ChatError::ConversationNotFound);
        }
        Ok(self.conversations.list_messages(conversation_id).await?)
    }

    async fn require_user(&self, user_id: UserId) -> Result<User, ChatError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(ChatError::UserNotFound)
    }

    async fn owned_conversation(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .conversations
            .get_conversation(id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;

        if !conversation.is_owned_by(user_id) {
            warn!(owner = %conversation.user_id, "Conversation belongs to another user");
            return Err(ChatError::ConversationNotFound);
        }

        Ok(conversation)
    }

    async fn assign_title(&self, conversation: &Conversation, first_message: &str) {
        let title = generate_title(first_message);
        if let Err(e) = self.conversations.set_title(conversation.id, &title).await {
            warn!(error = %e, "Failed to set conversation title");
        }
    }

    /// The two-pass completion protocol.
    async fn complete_turn(&self, user: &User, history: &[Message]) -> Result<String, PipelineError> {
        let params = PromptParams {
            first_name: user.greeting_name().to_string(),
            today: Utc::now().date_naive(),
        };
        let turns = build_prompt(&params, history)?;

        let first = self.completion.complete(&turns, self.config.tool_pass).await?;

        let call = match parse_reply(&first)? {
            Directive::Reply(text) => {
                debug!("No tool call requested");
                return Ok(text);
            }
            Directive::ToolCall(call) => call,
        };

        let output = ToolExecutor::new(self.catalog, user.id)
            .execute(&call)
            .await?;
        let rendered = output.render(call.function_name())?;

        debug!(
            function = call.function_name(),
            found = !output.is_not_found(),
            "Running reply pass with tool result"
        );

        let turns = with_tool_result(turns, rendered);
        Ok(self
            .completion
            .complete(&turns, self.config.reply_pass)
            .await?)
    }
}

/// Generate a conversation title from the first user message.
fn generate_title(message: &str) -> String {
    const MAX_TITLE_LENGTH: usize = 50;

    let trimmed = message.trim();
    if trimmed.chars().count() <= MAX_TITLE_LENGTH {
        return trimmed.to_string();
    }

    let truncated: String = trimmed.chars().take(MAX_TITLE_LENGTH).collect();
    truncated.rfind(' ').map_or_else(
        || format!("{truncated}..."),
        |space_idx| format!("{}...", &truncated[..space_idx]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_title_short() {
        let title = generate_title("Where is my order?");
        assert_eq!(title, "Where is my order?");
    }

    #[test]
    fn test_generate_title_long() {
        let message = "I bought a jacket last week and I would like to know when it is going to arrive";
        let title = generate_title(message);
        assert!(title.chars().count() <= 53);
        assert!(title.ends_with("..."));
        assert_eq!(title, "I bought a jacket last week and I would like to...");
    }

    #[test]
    fn test_generate_title_trims_whitespace() {
        let title = generate_title("  Hello world  ");
        assert_eq!(title, "Hello world");
    }

    #[test]
    fn test_generate_title_multibyte() {
        let message = "é".repeat(60);
        let title = generate_title(&message);
        assert_eq!(title, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn test_default_config_orders_temperatures() {
        let config = ChatConfig::default();
        assert!(config.reply_pass.temperature >= config.tool_pass.temperature);
    }
}
