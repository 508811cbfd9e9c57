//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` for the Anthropic Messages API, including
//! native tool calling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use rag_core::{
    error::{AgentError, Result},
    message::{ContentBlock, Message, Role},
    provider::{
        Completion, GenerationOptions, GenerationRequest, LlmProvider, StopReason, TokenUsage,
        ToolChoice,
    },
    tool::{ToolCall, ToolDefinition},
};

/// Anthropic API version header value
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    api_key: Secret<String>,

    /// Default model when the request does not name one
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// Retries on rate limiting or server errors
    pub max_retries: u32,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Read `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL` and `ANTHROPIC_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Reject missing or placeholder keys; warn on an unexpected key format
    pub fn validate(&self) -> Result<()> {
        let key = self.api_key.expose_secret().trim();

        if key.is_empty() {
            return Err(AgentError::Config(
                "Anthropic API key not found. Set ANTHROPIC_API_KEY in your environment or .env file".into(),
            ));
        }
        if key.to_lowercase().contains("your") || key == "test-api-key" {
            return Err(AgentError::Config(
                "Anthropic API key is a placeholder. Replace it with a real key".into(),
            ));
        }
        if !key.starts_with("sk-ant-") {
            tracing::warn!("Anthropic API key does not start with 'sk-ant-'; verify it is correct");
        }
        Ok(())
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config = AnthropicConfig::from_env()?;
        config.validate()?;
        Self::new(config)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the Messages API request body
    fn build_request<'a>(
        &'a self,
        request: &'a GenerationRequest,
        options: &'a GenerationOptions,
    ) -> ApiRequest<'a> {
        let model = if options.model.is_empty() {
            &self.config.model
        } else {
            &options.model
        };

        let tools = request
            .tools
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(convert_tool).collect());

        ApiRequest {
            model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: (!request.system.is_empty()).then_some(request.system.as_str()),
            messages: request.messages.iter().map(convert_message).collect(),
            tool_choice: tools.as_ref().and(request.tool_choice).map(convert_tool_choice),
            tools,
        }
    }

    async fn send(&self, body: &ApiRequest<'_>) -> Result<Completion> {
        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("failed to parse response: {e}")))?;

        Ok(parsed.into_completion())
    }

    fn transport_error(&self, e: &reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::ProviderUnavailable(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs()
            ))
        } else if e.is_connect() {
            AgentError::ProviderUnavailable(format!("connection failed: {e}"))
        } else {
            AgentError::Provider(e.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("/v1/models"))
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => Ok(true),
            Ok(r) => {
                tracing::warn!(status = %r.status(), "Anthropic health check failed");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = self.build_request(request, options);
        let mut attempt = 0;

        loop {
            match self.send(&body).await {
                Ok(completion) => {
                    tracing::debug!(
                        model = %completion.model,
                        stop_reason = ?completion.stop_reason,
                        "Anthropic completion"
                    );
                    return Ok(completion);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 << attempt);
                    tracing::warn!(error = %e, attempt, ?delay, "Retrying Anthropic request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, body: &str) -> AgentError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned());

    match status.as_u16() {
        401 => AgentError::Auth(detail),
        429 => AgentError::RateLimited(detail),
        500..=599 => AgentError::ProviderUnavailable(format!("server error {status}: {detail}")),
        _ => AgentError::Provider(format!("unexpected status {status}: {detail}")),
    }
}

fn convert_message(message: &Message) -> ApiMessage {
    let role = match message.role {
        Role::Assistant => "assistant",
        Role::User | Role::Tool => "user",
    };
    ApiMessage {
        role,
        content: message.content.iter().map(convert_block).collect(),
    }
}

fn convert_block(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::ToolUse(call) => json!({
            "type": "tool_use",
            "id": call.id,
            "name": call.name,
            "input": call.input,
        }),
        ContentBlock::ToolResult(result) => json!({
            "type": "tool_result",
            "tool_use_id": result.invocation_id,
            "content": result.content,
            "is_error": result.is_error,
        }),
    }
}

fn convert_tool(definition: &ToolDefinition) -> Value {
    json!({
        "name": definition.name,
        "description": definition.description,
        "input_schema": definition.input_schema(),
    })
}

fn convert_tool_choice(choice: ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!({ "type": "auto" }),
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ApiContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

/// Loosely typed so a malformed tool-use block still parses
#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl ApiResponse {
    fn into_completion(self) -> Completion {
        let stop_reason = match self.stop_reason.as_deref() {
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };

        let content = self
            .content
            .into_iter()
            .filter_map(|block| match block.block_type.as_str() {
                "text" => Some(ContentBlock::text(block.text.unwrap_or_default())),
                "tool_use" => Some(ContentBlock::ToolUse(ToolCall {
                    id: block.id.unwrap_or_default(),
                    name: block.name.unwrap_or_default(),
                    input: block.input.unwrap_or(Value::Null),
                })),
                other => {
                    tracing::debug!(block_type = other, "Ignoring content block");
                    None
                }
            })
            .collect();

        Completion {
            content,
            stop_reason,
            model: self.model,
            usage: self.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}
