//! Tool System
//!
//! Named, schema-described capabilities the model may invoke mid-conversation.
//! Tools are registered once per query context and dispatched by name from
//! the orchestration loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Arguments supplied by the model for one invocation
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation token assigned by the provider
    #[serde(default)]
    pub id: String,

    /// Tool identifier
    #[serde(default)]
    pub name: String,

    /// Raw arguments; a JSON object when well formed
    #[serde(default)]
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Arguments as an object, or `None` when the call is malformed
    pub fn arguments(&self) -> Option<&ToolArguments> {
        if self.name.is_empty() {
            return None;
        }
        self.input.as_object()
    }
}

/// Result fed back to the model for one invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Echo of the originating `ToolCall::id`
    pub invocation_id: String,

    /// Text payload consumed by the model on the next round
    pub content: String,

    /// Whether the invocation failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn new(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(invocation_id: impl Into<String>, error: &AgentError) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: format!("Tool execution failed: {error}"),
            is_error: true,
        }
    }
}

/// Provenance of retrieved content, surfaced to the end user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Human-readable label, e.g. "Course X - Lesson 3"
    pub display: String,

    /// Lesson-specific URL when one is known
    pub link: Option<String>,
}

impl Citation {
    pub fn new(display: impl Into<String>, link: Option<String>) -> Self {
        Self {
            display: display.into(),
            link,
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, integer, number, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Tool definition advertised to the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool identifier
    pub name: String,

    /// Guides the model's tool choice
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolDefinition {
    /// JSON-Schema object describing the tool's input
    pub fn input_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.param_type,
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
///
/// Citation state lives inside the tool instance, so a tool must not be
/// shared by two queries running at the same time.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's definition for LLM tool calling
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: &ToolArguments) -> Result<String>;

    /// Validate arguments before execution
    fn validate(&self, arguments: &ToolArguments) -> Result<()> {
        let definition = self.definition();

        for param in &definition.parameters {
            if param.required && !arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }

    /// Citations recorded by the most recent execution
    fn last_sources(&self) -> Vec<Citation> {
        Vec::new()
    }

    /// Forget recorded citations
    fn reset_sources(&self) {}
}

/// Registry for available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;

        if name.is_empty() {
            return Err(AgentError::Config("Tool must have a 'name'".into()));
        }
        if self.index.contains_key(&name) {
            return Err(AgentError::Config(format!(
                "Tool '{name}' is already registered"
            )));
        }

        tracing::debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Execute a tool by name.
    ///
    /// An unknown name is not an error: the sentinel text goes back to the
    /// model so it can adapt.
    pub async fn execute(&self, name: &str, arguments: &ToolArguments) -> Result<String> {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = %name, "Model requested unknown tool");
            return Ok(format!("Tool '{name}' not found"));
        };

        tool.validate(arguments)?;
        tool.execute(arguments).await
    }

    /// All tool definitions, in registration order
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Citations from every tool, in registration order
    pub fn collect_citations(&self) -> Vec<Citation> {
        self.tools.iter().flat_map(|t| t.last_sources()).collect()
    }

    /// Clear citations on every tool
    pub fn reset_citations(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }

    /// Get tool names
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.definition().name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
