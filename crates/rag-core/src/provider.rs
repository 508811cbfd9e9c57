//! LLM Provider Strategy Pattern
//!
//! Defines the generation boundary the orchestrator talks to. Any backend
//! that can accept a system prompt, a transcript and optional tool
//! definitions, and answer with text and/or tool-call blocks, fits.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag_core::provider::{GenerationOptions, GenerationRequest, LlmProvider};
//!
//! let provider = AnthropicProvider::new(config)?;
//! let completion = provider.complete(&request, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{ContentBlock, Message, text_of};
use crate::tool::{ToolCall, ToolDefinition};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 { 0.0 }
const fn default_max_tokens() -> u32 { 800 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// How the model may choose among advertised tools
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides whether to call a tool
    Auto,
}

/// A single generation request
#[derive(Clone, Debug, Default)]
pub struct GenerationRequest {
    /// System prompt
    pub system: String,

    /// Ordered transcript
    pub messages: Vec<Message>,

    /// Tools available to the model; `None` forces a text-only answer
    pub tools: Option<Vec<ToolDefinition>>,

    /// Tool-choice policy, only meaningful alongside `tools`
    pub tool_choice: Option<ToolChoice>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system: system.into(),
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Attach tool definitions with the automatic tool-choice policy
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some(ToolChoice::Auto);
        self
    }

    /// Whether any tool definitions are attached
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Why the model stopped generating
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Text and tool-call blocks, in model order
    pub content: Vec<ContentBlock>,

    /// Stop condition
    pub stop_reason: StopReason,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// A plain text completion
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
            model: String::new(),
            usage: None,
        }
    }

    /// A completion requesting the given tool calls
    pub fn tool_use(calls: Vec<ToolCall>) -> Self {
        Self {
            content: calls.into_iter().map(ContentBlock::ToolUse).collect(),
            stop_reason: StopReason::ToolUse,
            model: String::new(),
            usage: None,
        }
    }

    /// Whether the model stopped to call tools
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// Concatenated text blocks
    pub fn text_content(&self) -> String {
        text_of(&self.content)
    }

    /// Requested tool calls, in order
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(call) => Some(call),
            _ => None,
        })
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new generation backends.
/// The orchestrator works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs and health reporting
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion
    async fn complete(
        &self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> Result<Completion>;
}
