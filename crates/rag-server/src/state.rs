//! Application State

use std::sync::Arc;

use course_search::{SearchBackend, tools::CourseSearchTool};
use rag_core::{Assistant, HistoryStore, LlmProvider, Orchestrator, Result, ToolRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider, kept for health reporting
    pub provider: Arc<dyn LlmProvider>,

    /// Orchestrator shared by every query
    pub orchestrator: Orchestrator,

    /// Course content index
    pub backend: Arc<dyn SearchBackend>,

    /// Session history
    pub history: Arc<dyn HistoryStore>,
}

impl AppState {
    /// A fresh assistant for one request.
    ///
    /// Tools carry per-query citation state, so each request gets its own
    /// registry over the shared backend.
    pub fn assistant(&self) -> Result<Assistant> {
        let mut tools = ToolRegistry::new();
        tools.register(CourseSearchTool::new(self.backend.clone()))?;
        Ok(Assistant::new(
            self.orchestrator.clone(),
            tools,
            self.history.clone(),
        ))
    }
}
