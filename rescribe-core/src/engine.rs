//! Generation engine — provider abstraction and adapters.
//!
//! Defines the `GenerationEngine` trait for model-agnostic text generation,
//! an OpenAI-compatible implementation, and a queued mock engine that
//! exercises the workflow's control paths without network access.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::types::{GenerationContent, GenerationResponse, Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the search capability the engine may request.
pub const SEARCH_CAPABILITY: &str = "web_search";

/// Trait for generation engines.
///
/// Given an ordered prompt, returns text or an explicit capability call.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Perform a single generation and return the response.
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResponse, GenerationError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible engine
// ---------------------------------------------------------------------------

/// Generation engine for OpenAI-compatible chat completion endpoints.
pub struct OpenAiCompatibleEngine {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleEngine {
    /// Create a new engine from configuration.
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env`.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            GenerationError::AuthFailed {
                provider: format!("OpenAI-compatible: env var '{}' not set", config.api_key_env),
            }
        })?;
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .map_err(|e| GenerationError::Unavailable {
                    message: format!("Failed to create HTTP client: {e}"),
                })?,
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Convert internal messages to OpenAI JSON format.
    fn messages_to_json(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({ "role": role, "content": msg.content })
            })
            .collect()
    }

    /// The search capability advertised to the model as a callable tool.
    fn capability_definitions() -> Vec<Value> {
        vec![json!({
            "type": "function",
            "function": {
                "name": SEARCH_CAPABILITY,
                "description": "Search the web for information on a query.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "The search query" }
                    },
                    "required": ["query"]
                }
            }
        })]
    }

    /// Parse an OpenAI-format response body into a GenerationResponse.
    fn parse_response(body: &Value, model: &str) -> Result<GenerationResponse, GenerationError> {
        let message = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "No message in response".to_string(),
            })?;

        // An explicit capability call takes precedence over text content.
        if let Some(call) = message
            .get("tool_calls")
            .and_then(|tc| tc.as_array())
            .and_then(|calls| calls.first())
        {
            let func = call
                .get("function")
                .ok_or_else(|| GenerationError::ResponseParse {
                    message: "Tool call without function".to_string(),
                })?;
            let name = func
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();
            let arguments: Value = func
                .get("arguments")
                .and_then(|a| a.as_str())
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_else(|| json!({}));
            debug!(capability = %name, "Generation engine requested capability call");
            return Ok(GenerationResponse {
                content: GenerationContent::capability_call(name, arguments),
                model: model.to_string(),
            });
        }

        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(GenerationResponse {
            content: GenerationContent::text(text),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl GenerationEngine for OpenAiCompatibleEngine {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResponse, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": Self::messages_to_json(messages),
            "temperature": self.temperature,
            "tools": Self::capability_definitions(),
        });

        debug!(model = %self.model, message_count = messages.len(), "Sending generation request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::ApiRequest {
                message: format!("Request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Generation request rejected");
            return Err(GenerationError::ApiRequest {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::ResponseParse {
                message: format!("Invalid JSON response: {e}"),
            })?;

        Self::parse_response(&body, &self.model)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Mock engine
// ---------------------------------------------------------------------------

/// A mock generation engine for tests and keyless runs.
///
/// Responses are queued at construction or via `queue_response`; multi-turn
/// behavior is scripted per-instance rather than through process-global
/// state. An exhausted queue returns a fixed fallback text.
pub struct MockGenerationEngine {
    model: String,
    responses: Mutex<VecDeque<GenerationResponse>>,
}

impl MockGenerationEngine {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Create an engine pre-loaded with the given responses, in order.
    pub fn with_responses(responses: impl IntoIterator<Item = GenerationResponse>) -> Self {
        let engine = Self::new();
        for response in responses {
            engine.queue_response(response);
        }
        engine
    }

    /// Queue a response to be returned by the next `generate` call.
    pub fn queue_response(&self, response: GenerationResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Number of queued responses remaining.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Create a simple text response.
    pub fn text_response(text: &str) -> GenerationResponse {
        GenerationResponse {
            content: GenerationContent::text(text),
            model: "mock-model".to_string(),
        }
    }

    /// Create a capability-call response.
    pub fn capability_call_response(name: &str, arguments: Value) -> GenerationResponse {
        GenerationResponse {
            content: GenerationContent::capability_call(name, arguments),
            model: "mock-model".to_string(),
        }
    }
}

impl Default for MockGenerationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationEngine for MockGenerationEngine {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerationResponse, GenerationError> {
        let mut responses = self.responses.lock().unwrap();
        Ok(responses.pop_front().unwrap_or_else(|| {
            Self::text_response("Mock engine: no queued responses available.")
        }))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_mock_returns_queued_responses_in_order() {
        let engine = MockGenerationEngine::with_responses([
            MockGenerationEngine::text_response("first"),
            MockGenerationEngine::text_response("second"),
        ]);
        let messages = [Message::user("hi")];
        assert_eq!(engine.generate(&messages).await.unwrap().text(), "first");
        assert_eq!(engine.generate(&messages).await.unwrap().text(), "second");
        assert_eq!(engine.remaining(), 0);
    }

    #[tokio::test]
    async fn test_mock_fallback_when_exhausted() {
        let engine = MockGenerationEngine::new();
        let response = engine.generate(&[Message::user("hi")]).await.unwrap();
        assert!(response.text().contains("no queued responses"));
    }

    #[test]
    fn test_parse_response_text() {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": "hello there" } }]
        });
        let response = OpenAiCompatibleEngine::parse_response(&body, "gpt-4o").unwrap();
        assert_eq!(response.text(), "hello there");
    }

    #[test]
    fn test_parse_response_capability_call() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "web_search",
                            "arguments": "{\"query\": \"abc\"}"
                        }
                    }]
                }
            }]
        });
        let response = OpenAiCompatibleEngine::parse_response(&body, "gpt-4o").unwrap();
        match response.content {
            GenerationContent::CapabilityCall { name, arguments } => {
                assert_eq!(name, "web_search");
                assert_eq!(arguments["query"], "abc");
            }
            GenerationContent::Text { .. } => panic!("expected capability call"),
        }
    }

    #[test]
    fn test_parse_response_empty_content_is_error() {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": "" } }]
        });
        let err = OpenAiCompatibleEngine::parse_response(&body, "gpt-4o").unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }
}
