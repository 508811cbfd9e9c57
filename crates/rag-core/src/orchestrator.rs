//! Generation Orchestrator
//!
//! Drives the multi-round conversation with the model for one query:
//!
//! ```text
//! AWAITING_MODEL ──text──────────────▶ done
//!       │
//!       └─tool_use─▶ EXECUTING_TOOLS ──▶ AWAITING_MODEL   (round += 1)
//!
//! round == max_rounds ──▶ FORCED_FINAL_CALL (no tools) ──▶ done
//! ```
//!
//! Provider failures on round 0 propagate; later failures degrade to a fixed
//! fallback answer. Tool failures never leave this module: they become
//! tool-result text the model can react to.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Message, Transcript};
use crate::provider::{Completion, GenerationOptions, GenerationRequest, LlmProvider};
use crate::tool::{ToolCall, ToolDefinition, ToolRegistry, ToolResult};

/// Default number of tool rounds per query
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Returned when a provider call fails after tool progress was made
pub const ERROR_FALLBACK: &str = "An error occurred while processing your request.";

/// Returned when the forced final call fails
pub const FINAL_FALLBACK: &str =
    "I was unable to complete your request due to technical issues.";

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an assistant for course materials and educational content, with access to a search tool over the course catalog.

Search tool usage:
- Search only for questions about specific course content or detailed course materials
- Answer general knowledge questions from your own knowledge, without searching
- At most 2 sequential searches per query; use the second only when the first is not enough
- For multi-part questions, search each part separately, then combine the results
- For comparisons, search each subject separately, then compare
- If a search returns nothing relevant, say so plainly; do not invent an answer

Response protocol:
- Give the final answer only
- Do not describe the search process, your reasoning, or the question type
- Do not say "based on the search results"

Answers must be brief, educational, clear, and include an example when it helps understanding."#;

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Fixed instructions sent as the system prompt
    pub system_prompt: String,

    /// Tool rounds before the forced tool-free call
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Answer used when a later round's provider call fails
    pub error_fallback: String,

    /// Answer used when the forced final call fails
    pub final_fallback: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            generation: GenerationOptions::default(),
            error_fallback: ERROR_FALLBACK.into(),
            final_fallback: FINAL_FALLBACK.into(),
        }
    }
}

/// Per-query loop state, discarded when `generate` returns
#[derive(Debug)]
struct RoundState {
    round_index: usize,
    max_rounds: usize,
    transcript: Transcript,
}

impl RoundState {
    fn new(query: &str, max_rounds: usize) -> Self {
        Self {
            round_index: 0,
            max_rounds,
            transcript: Transcript::from_query(query),
        }
    }

    const fn has_budget(&self) -> bool {
        self.round_index < self.max_rounds
    }
}

/// Drives tool-mediated generation for single queries
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(provider: Arc<dyn LlmProvider>, config: OrchestratorConfig) -> Self {
        Self { provider, config }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, OrchestratorConfig::default())
    }

    /// System prompt, with session history appended when present
    pub fn build_system_prompt(&self, history: Option<&str>) -> String {
        match history.filter(|h| !h.trim().is_empty()) {
            Some(history) => format!(
                "{}\n\nPrevious conversation:\n{history}",
                self.config.system_prompt
            ),
            None => self.config.system_prompt.clone(),
        }
    }

    /// Answer `query`, letting the model call tools for up to `max_rounds` rounds.
    ///
    /// # Errors
    ///
    /// Only a provider failure on the very first request is returned; every
    /// later failure degrades to a fallback answer.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        executor: Option<&ToolRegistry>,
    ) -> Result<String> {
        let system = self.build_system_prompt(history);
        let tools = tools.filter(|t| !t.is_empty());
        let mut state = RoundState::new(query, self.config.max_rounds);

        while state.has_budget() {
            let mut request =
                GenerationRequest::new(system.clone(), state.transcript.messages().to_vec());
            if let Some(tools) = tools {
                request = request.with_tools(tools.to_vec());
            }

            tracing::debug!(
                round = state.round_index,
                messages = request.messages.len(),
                tools = request.has_tools(),
                "Requesting generation"
            );

            let completion = match self
                .provider
                .complete(&request, &self.config.generation)
                .await
            {
                Ok(completion) => completion,
                Err(e) if state.round_index == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        round = state.round_index,
                        error = %e,
                        "Generation failed after tool progress; returning fallback"
                    );
                    return Ok(self.config.error_fallback.clone());
                }
            };

            if !completion.wants_tools() {
                return Ok(completion.text_content());
            }

            let Some(executor) = executor else {
                tracing::warn!("Model requested tools but no executor was supplied");
                return Ok(String::new());
            };

            Self::execute_round(&mut state, completion, executor).await;
            state.round_index += 1;
        }

        tracing::debug!(rounds = state.round_index, "Round budget exhausted; forcing final answer");
        self.final_answer(system, state.transcript).await
    }

    /// Record the model's tool-call turn and one result per requested call
    async fn execute_round(state: &mut RoundState, completion: Completion, executor: &ToolRegistry) {
        let calls: Vec<ToolCall> = completion.tool_calls().cloned().collect();
        state.transcript.push(Message::assistant(completion.content));

        tracing::debug!(round = state.round_index, tool_count = calls.len(), "Executing tool calls");

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            results.push(Self::invoke(executor, call).await);
        }

        if !results.is_empty() {
            state.transcript.push(Message::tool_results(results));
        }
    }

    /// Run one tool call; failures become result text
    async fn invoke(executor: &ToolRegistry, call: &ToolCall) -> ToolResult {
        let Some(arguments) = call.arguments() else {
            tracing::warn!(call_id = %call.id, "Malformed tool call");
            return ToolResult::failure(&call.id, &AgentError::MalformedToolCall);
        };

        match executor.execute(&call.name, arguments).await {
            Ok(content) => {
                tracing::debug!(tool = %call.name, call_id = %call.id, "Tool execution complete");
                ToolResult::new(&call.id, content)
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool execution failed");
                ToolResult::failure(&call.id, &e)
            }
        }
    }

    /// One last request without tools, so the model must answer in text
    async fn final_answer(&self, system: String, transcript: Transcript) -> Result<String> {
        let request = GenerationRequest::new(system, transcript.into());

        match self.provider.complete(&request, &self.config.generation).await {
            Ok(completion) => Ok(completion.text_content()),
            Err(e) => {
                tracing::warn!(error = %e, "Final generation failed; returning fallback");
                Ok(self.config.final_fallback.clone())
            }
        }
    }

    /// Get configuration
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

/// Builder for Orchestrator configuration
#[derive(Default)]
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = max;
        self
    }

    #[must_use]
    pub const fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Orchestrator::new(provider, self.config))
    }
}
