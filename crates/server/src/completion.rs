//! Provider-neutral completion seam.
//!
//! The orchestrator builds a list of role-tagged [`PromptTurn`]s and hands it
//! to a [`CompletionClient`] together with per-pass [`SamplingParams`]. The
//! client returns the model's reply as plain text. Clients never retry and
//! never stream.

use async_trait::async_trait;
use thiserror::Error;

use crate::claude::ClaudeError;

/// Role of a prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptRole {
    /// Fixed instructions for the model.
    System,
    /// Customer text.
    User,
    /// Earlier assistant replies.
    Assistant,
    /// Output of a local tool, injected for the second pass only.
    Tool,
}

/// One role-tagged entry in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub content: String,
}

impl PromptTurn {
    /// Create a turn.
    #[must_use]
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Errors a completion client can report.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The Claude API call failed.
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    /// The model answered without any text.
    #[error("completion returned no text")]
    EmptyReply,

    /// Any other provider failure.
    #[error("completion failed: {0}")]
    Other(String),
}

/// Opaque text completion: prompt in, reply text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `turns` with the given sampling parameters.
    async fn complete(
        &self,
        turns: &[PromptTurn],
        params: SamplingParams,
    ) -> Result<String, CompletionError>;
}
