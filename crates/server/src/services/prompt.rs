//! Prompt assembly for the two completion passes.

use askama::Template;
use chrono::NaiveDate;

use shopchat_core::MessageSender;

use crate::completion::{PromptRole, PromptTurn};
use crate::models::Message;

/// System prompt template for the shopping assistant.
#[derive(Template)]
#[template(path = "prompt/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    first_name: &'a str,
    today: String,
}

/// Values substituted into the system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptParams {
    pub first_name: String,
    pub today: NaiveDate,
}

/// Render the system prompt.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_system_prompt(params: &PromptParams) -> Result<String, askama::Error> {
    SystemPromptTemplate {
        first_name: &params.first_name,
        today: params.today.format("%Y-%m-%d").to_string(),
    }
    .render()
}

/// Build the pass-1 prompt: the system prompt followed by the whole history.
///
/// # Errors
///
/// Returns an error if the system prompt fails to render.
pub fn build_prompt(
    params: &PromptParams,
    history: &[Message],
) -> Result<Vec<PromptTurn>, askama::Error> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(PromptTurn::new(
        PromptRole::System,
        render_system_prompt(params)?,
    ));

    turns.extend(history.iter().map(|message| {
        let role = match message.sender {
            MessageSender::User => PromptRole::User,
            MessageSender::Assistant => PromptRole::Assistant,
        };
        PromptTurn::new(role, message.content.clone())
    }));

    Ok(turns)
}

/// Extend a pass-1 prompt with a tool result for pass 2.
#[must_use]
pub fn with_tool_result(mut turns: Vec<PromptTurn>, rendered_output: String) -> Vec<PromptTurn> {
    turns.push(PromptTurn::new(PromptRole::Tool, rendered_output));
    turns
}
