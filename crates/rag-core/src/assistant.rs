//! Query Facade
//!
//! Single entry point for a user query: history lookup, orchestration,
//! citation hand-off and history update.
//!
//! Tools keep citation state per instance, so an `Assistant` serves one
//! query at a time. Build one per in-flight request (the provider, backend
//! and history store are all cheap to share) or serialize access to it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::session::{HistoryStore, SessionId};
use crate::tool::{Citation, ToolRegistry};

/// Answer plus the sources that backed it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
}

/// Combines orchestration, tools and session history
pub struct Assistant {
    orchestrator: Orchestrator,
    tools: ToolRegistry,
    history: Arc<dyn HistoryStore>,
}

impl Assistant {
    pub fn new(
        orchestrator: Orchestrator,
        tools: ToolRegistry,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            orchestrator,
            tools,
            history,
        }
    }

    /// Answer `text`, optionally in the context of a session.
    ///
    /// Citations are collected and reset on every path, so nothing leaks
    /// into a later query.
    ///
    /// # Errors
    ///
    /// Propagates a provider failure on the first generation request.
    pub async fn query(&self, text: &str, session_id: Option<&SessionId>) -> Result<QueryResponse> {
        self.tools.reset_citations();

        let history = session_id.and_then(|id| match self.history.get_history(id) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "History lookup failed; continuing without it");
                None
            }
        });

        let definitions = self.tools.get_tool_definitions();
        let outcome = self
            .orchestrator
            .generate(text, history.as_deref(), Some(&definitions), Some(&self.tools))
            .await;

        let sources = self.tools.collect_citations();
        self.tools.reset_citations();

        let answer = outcome?;

        if let Some(id) = session_id {
            if let Err(e) = self.history.append(id, text, &answer) {
                tracing::warn!(session = %id, error = %e, "Failed to record exchange");
            }
        }

        tracing::info!(sources = sources.len(), "Query answered");
        Ok(QueryResponse { answer, sources })
    }

    /// Get the tool registry
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::provider::Completion;
    use crate::session::MemoryHistoryStore;
    use crate::testing::{ScriptedProvider, StubTool, search_call};

    fn lesson_citations() -> Vec<Citation> {
        vec![
            Citation::new(
                "Advanced Python Programming - Lesson 3",
                Some("https://example.com/lesson3".into()),
            ),
            Citation::new(
                "Advanced Python Programming - Lesson 3",
                Some("https://example.com/lesson3".into()),
            ),
        ]
    }

    fn assistant(
        provider: &Arc<ScriptedProvider>,
        tool: &Arc<StubTool>,
        history: &Arc<MemoryHistoryStore>,
    ) -> Assistant {
        let mut registry = ToolRegistry::new();
        registry.register_arc(tool.clone()).unwrap();
        Assistant::new(
            Orchestrator::with_defaults(provider.clone()),
            registry,
            history.clone(),
        )
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text(
            "Python is a general-purpose language.",
        ))]));
        let tool = Arc::new(StubTool::ok("search_course_content", "unused"));
        let history = Arc::new(MemoryHistoryStore::default());

        let response = assistant(&provider, &tool, &history)
            .query("What is Python?", None)
            .await
            .unwrap();

        assert_eq!(response.answer, "Python is a general-purpose language.");
        assert!(response.sources.is_empty());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_retrieval_round_returns_citations() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::tool_use(vec![search_call("toolu_1", "decorators")])),
            Ok(Completion::text("Decorators modify functions.")),
        ]));
        let tool = Arc::new(
            StubTool::ok("search_course_content", "two documents").with_citations(lesson_citations()),
        );
        let history = Arc::new(MemoryHistoryStore::default());
        let assistant = assistant(&provider, &tool, &history);

        let response = assistant.query("What are decorators?", None).await.unwrap();

        assert_eq!(response.answer, "Decorators modify functions.");
        assert_eq!(response.sources, lesson_citations());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(tool.calls().len(), 1);
        assert!(assistant.tools().collect_citations().is_empty());
    }

    #[tokio::test]
    async fn test_max_rounds_exhaustion() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::tool_use(vec![search_call("a", "closures")])),
            Ok(Completion::tool_use(vec![search_call("b", "decorators")])),
            Ok(Completion::text("Both explained.")),
        ]));
        let tool = Arc::new(StubTool::ok("search_course_content", "content"));
        let history = Arc::new(MemoryHistoryStore::default());

        let response = assistant(&provider, &tool, &history)
            .query("Compare closures and decorators", None)
            .await
            .unwrap();

        assert_eq!(response.answer, "Both explained.");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(tool.calls().len(), 2);
        assert!(provider.requests()[2].tools.is_none());
    }

    #[tokio::test]
    async fn test_first_round_failure_propagates_and_resets_citations() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::ProviderUnavailable(
            "down".into(),
        ))]));
        let tool = Arc::new(
            StubTool::ok("search_course_content", "content")
                .with_stale_sources(vec![Citation::new("Stale", None)]),
        );
        let history = Arc::new(MemoryHistoryStore::default());
        let session = SessionId::from_string("s1");
        let assistant = assistant(&provider, &tool, &history);

        let err = assistant.query("q", Some(&session)).await.unwrap_err();

        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert!(tool.calls().is_empty());
        assert!(assistant.tools().collect_citations().is_empty());
        assert!(history.get_history(&session).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_citations_not_reported() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("General answer."))]));
        let tool = Arc::new(
            StubTool::ok("search_course_content", "content")
                .with_stale_sources(vec![Citation::new("Stale", None)]),
        );
        let history = Arc::new(MemoryHistoryStore::default());

        let response = assistant(&provider, &tool, &history)
            .query("What is 2 + 2?", None)
            .await
            .unwrap();

        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_session_history_threaded_through() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::text("Decorators wrap functions.")),
            Ok(Completion::text("@functools.wraps is one.")),
        ]));
        let tool = Arc::new(StubTool::ok("search_course_content", "content"));
        let history = Arc::new(MemoryHistoryStore::default());
        let session = history.create_session().unwrap();
        let assistant = assistant(&provider, &tool, &history);

        assistant.query("What are decorators?", Some(&session)).await.unwrap();
        assistant.query("Give me an example", Some(&session)).await.unwrap();

        let requests = provider.requests();
        assert!(!requests[0].system.contains("Previous conversation:"));
        assert!(requests[1].system.contains(
            "Previous conversation:\nUser: What are decorators?\nAssistant: Decorators wrap functions."
        ));

        let stored = history.get_history(&session).unwrap().unwrap();
        assert!(stored.contains("Give me an example"));
    }
}
