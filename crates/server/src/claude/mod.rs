//! Claude API integration for the shopping assistant.
//!
//! A thin, non-streaming client for the Anthropic Messages API. The
//! orchestrator talks to it only through [`crate::completion::CompletionClient`].

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::{ApiError, ApiErrorResponse, ClaudeError};
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, StopReason, Usage};
