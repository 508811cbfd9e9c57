//! Test doubles shared by the orchestrator and assistant tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::provider::{Completion, GenerationOptions, GenerationRequest, LlmProvider};
use crate::tool::{Citation, ParameterSchema, Tool, ToolArguments, ToolCall, ToolDefinition};

/// Provider that replays a fixed script and records every request
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<Completion>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        request: &GenerationRequest,
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
    }
}

/// A `search_course_content` tool call
pub fn search_call(id: &str, query: &str) -> ToolCall {
    ToolCall::new(id, "search_course_content", serde_json::json!({ "query": query }))
}

/// Tool stub that records its invocations and citations
pub struct StubTool {
    name: &'static str,
    outcome: std::result::Result<String, String>,
    citations: Vec<Citation>,
    sources: Mutex<Vec<Citation>>,
    calls: Mutex<Vec<ToolArguments>>,
}

impl StubTool {
    pub fn ok(name: &'static str, output: &str) -> Self {
        Self {
            name,
            outcome: Ok(output.into()),
            citations: Vec::new(),
            sources: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &'static str, error: &str) -> Self {
        Self {
            outcome: Err(error.into()),
            ..Self::ok(name, "")
        }
    }

    /// Citations recorded on every successful execution
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Pre-seed citation state as if an earlier query had run
    pub fn with_stale_sources(self, sources: Vec<Citation>) -> Self {
        *self.sources.lock().unwrap() = sources;
        self
    }

    pub fn calls(&self) -> Vec<ToolArguments> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.into(),
            description: "Stub".into(),
            parameters: vec![ParameterSchema::new("query", "string", "Query").required()],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String> {
        self.calls.lock().unwrap().push(arguments.clone());
        match &self.outcome {
            Ok(output) => {
                *self.sources.lock().unwrap() = self.citations.clone();
                Ok(output.clone())
            }
            Err(error) => Err(AgentError::ToolExecution(error.clone())),
        }
    }

    fn last_sources(&self) -> Vec<Citation> {
        self.sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.sources.lock().unwrap().clear();
    }
}
