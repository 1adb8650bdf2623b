//! Business logic services.
//!
//! # Services
//!
//! - `chat` - Turn orchestration: prompt, tool call, reply, persistence
//! - `prompt` - System prompt rendering and prompt assembly

pub mod chat;
pub mod prompt;

pub use chat::{ChatConfig, ChatError, ChatService, FALLBACK_REPLY, TurnOutcome};
pub use prompt::{PromptParams, build_prompt, render_system_prompt, with_tool_result};
