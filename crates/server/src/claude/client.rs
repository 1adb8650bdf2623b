//! Claude API client for chat completions.
//!
//! Implements [`CompletionClient`] over the Anthropic Messages API. Provider
//! specifics stay in here: system turns become the `system` field, tool turns
//! travel as user text, and consecutive same-role turns are merged because
//! the API requires strict user/assistant alternation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::completion::{CompletionClient, CompletionError, PromptRole, PromptTurn, SamplingParams};
use crate::config::ClaudeConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Prefix marking tool output inside a user message.
const TOOL_RESULT_PREFIX: &str = "[tool result]";

/// Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    api_url: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Config` if the API key contains invalid header
    /// characters or the HTTP client cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ClaudeError::Config("API key is not a valid header value".to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClaudeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                api_url: config.api_url.to_string(),
            }),
        })
    }

    /// Send a chat request and return the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, request), fields(model = %self.inner.model, messages = request.messages.len()))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClaudeError> {
        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(request)
            .send()
            .await?;

        let parsed = Self::handle_response(response).await?;

        debug!(
            response_id = %parsed.id,
            response_model = %parsed.model,
            stop_reason = ?parsed.stop_reason,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Claude response received"
        );

        Ok(parsed)
    }

    /// Build the wire request for a list of prompt turns.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::EmptyPrompt` if there is no user or assistant turn.
    pub fn build_request(
        &self,
        turns: &[PromptTurn],
        params: SamplingParams,
    ) -> Result<ChatRequest, ClaudeError> {
        let (system, messages) = to_wire_messages(turns);
        if messages.is_empty() {
            return Err(ClaudeError::EmptyPrompt);
        }

        Ok(ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: params.max_tokens,
            messages,
            system,
            temperature: params.temperature,
        })
    }

    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, ClaudeError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(Self::handle_error_status(status, response).await)
        }
    }

    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ClaudeError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ClaudeError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ClaudeError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
                |_| ClaudeError::Api {
                    error_type: format!("http_{}", status.as_u16()),
                    message: body.clone(),
                },
                |api_error| ClaudeError::Api {
                    error_type: api_error.error.error_type,
                    message: api_error.error.message,
                },
            ),
            Err(e) => ClaudeError::Http(e),
        }
    }
}

#[async_trait]
impl CompletionClient for ClaudeClient {
    async fn complete(
        &self,
        turns: &[PromptTurn],
        params: SamplingParams,
    ) -> Result<String, CompletionError> {
        let request = self.build_request(turns, params)?;
        let response = self.chat(&request).await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(CompletionError::EmptyReply);
        }
        Ok(text)
    }
}

/// Split prompt turns into the `system` field and alternating messages.
fn to_wire_messages(turns: &[PromptTurn]) -> (Option<String>, Vec<Message>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut messages: Vec<Message> = Vec::new();

    for turn in turns {
        let (role, content) = match turn.role {
            PromptRole::System => {
                system_parts.push(&turn.content);
                continue;
            }
            PromptRole::User => ("user", turn.content.clone()),
            PromptRole::Assistant => ("assistant", turn.content.clone()),
            PromptRole::Tool => ("user", format!("{TOOL_RESULT_PREFIX}\n{}", turn.content)),
        };

        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&content);
            }
            _ => messages.push(Message {
                role: role.to_string(),
                content,
            }),
        }
    }

    // The API rejects conversations that open with an assistant turn.
    if messages.first().is_some_and(|m| m.role == "assistant") {
        messages.insert(
            0,
            Message {
                role: "user".to_string(),
                content: "(conversation resumed)".to_string(),
            },
        );
    }

    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, messages)
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> ClaudeConfig {
        ClaudeConfig {
            api_key: SecretString::from("sk-ant-test-key"),
            model: "claude-sonnet-4-20250514".to_string(),
            api_url: url::Url::parse("https://api.anthropic.com/v1/messages").expect("url"),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_to_wire_messages_extracts_system() {
        let turns = vec![
            PromptTurn::new(PromptRole::System, "Be helpful."),
            PromptTurn::new(PromptRole::User, "hi"),
            PromptTurn::new(PromptRole::Assistant, "Hello!"),
            PromptTurn::new(PromptRole::User, "where is my order?"),
        ];

        let (system, messages) = to_wire_messages(&turns);
        assert_eq!(system.as_deref(), Some("Be helpful."));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content, "where is my order?");
    }

    #[test]
    fn test_to_wire_messages_merges_tool_turn_into_user() {
        let turns = vec![
            PromptTurn::new(PromptRole::User, "status of order 5?"),
            PromptTurn::new(PromptRole::Tool, "{\"result\":null}"),
        ];

        let (system, messages) = to_wire_messages(&turns);
        assert!(system.is_none());
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].content,
            "status of order 5?\n\n[tool result]\n{\"result\":null}"
        );
    }

    #[test]
    fn test_to_wire_messages_prepends_user_when_assistant_first() {
        let turns = vec![
            PromptTurn::new(PromptRole::Assistant, "Welcome back."),
            PromptTurn::new(PromptRole::User, "thanks"),
        ];

        let (_, messages) = to_wire_messages(&turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_build_request_carries_sampling() {
        let client = ClaudeClient::new(&test_config()).expect("client");
        let request = client
            .build_request(
                &[PromptTurn::new(PromptRole::User, "hi")],
                SamplingParams {
                    temperature: 0.7,
                    max_tokens: 1024,
                },
            )
            .expect("request");

        assert_eq!(request.max_tokens, 1024);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_build_request_rejects_system_only_prompt() {
        let client = ClaudeClient::new(&test_config()).expect("client");
        let result = client.build_request(
            &[PromptTurn::new(PromptRole::System, "rules")],
            SamplingParams {
                temperature: 0.1,
                max_tokens: 64,
            },
        );
        assert!(matches!(result, Err(ClaudeError::EmptyPrompt)));
    }

    #[test]
    fn test_claude_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<ClaudeClient>();
    }

    #[test]
    fn test_claude_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClaudeClient>();
    }
}
