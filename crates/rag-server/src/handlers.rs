//! HTTP Handlers

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use course_search::CourseAnalytics;
use rag_core::{AgentError, Citation, SessionId};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub courses: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: &AgentError) -> ApiError {
    let code = match e {
        AgentError::Provider(_) => "PROVIDER_ERROR",
        AgentError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
        AgentError::RateLimited(_) => "RATE_LIMITED",
        AgentError::Auth(_) => "AUTH_ERROR",
        AgentError::Session(_) => "SESSION_ERROR",
        AgentError::Config(_) => "CONFIG_ERROR",
        _ => "QUERY_ERROR",
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Router
// ============================================================================

/// API routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/query", post(query_handler))
        .route("/api/courses", get(course_stats))
        .route("/api/session/{session_id}", delete(clear_session))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_owned(),
        provider_connected,
        courses: state.backend.course_count().await,
    })
}

/// Answer a question about the course materials
pub async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let session_id = match payload.session_id {
        Some(id) => SessionId::from_string(id),
        None => state.history.create_session().map_err(|e| api_error(&e))?,
    };

    let assistant = state.assistant().map_err(|e| api_error(&e))?;
    let response = assistant
        .query(&payload.query, Some(&session_id))
        .await
        .map_err(|e| {
            tracing::error!(session = %session_id, "Query failed: {}", e);
            api_error(&e)
        })?;

    Ok(Json(QueryResponse {
        answer: response.answer,
        sources: response.sources,
        session_id: session_id.to_string(),
    }))
}

/// Course catalog summary
pub async fn course_stats(State(state): State<AppState>) -> Json<CourseAnalytics> {
    Json(state.backend.analytics().await)
}

/// Forget a session's history
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::from_string(session_id);
    state.history.clear(&id).map_err(|e| api_error(&e))?;
    tracing::debug!(session = %id, "Cleared session");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use course_search::{Course, CourseChunk, InMemoryCourseIndex, Lesson};
    use rag_core::{
        Completion, GenerationOptions, GenerationRequest, HistoryStore, LlmProvider,
        MemoryHistoryStore, Orchestrator, Result, ToolCall,
    };

    struct QueuedProvider {
        responses: Mutex<VecDeque<Result<Completion>>>,
    }

    impl QueuedProvider {
        fn new(responses: Vec<Result<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for QueuedProvider {
        fn name(&self) -> &str {
            "queued"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _request: &GenerationRequest, _options: &GenerationOptions) -> Result<Completion> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Provider("no response queued".into())))
        }
    }

    fn catalog() -> InMemoryCourseIndex {
        let mut index = InMemoryCourseIndex::new(5);
        let course = Course {
            title: "Advanced Python Programming".into(),
            instructor: None,
            course_link: None,
            lessons: vec![Lesson {
                lesson_number: 3,
                title: "Decorators".into(),
                lesson_link: Some("https://example.com/lesson3".into()),
            }],
        };
        let chunks = vec![CourseChunk {
            content: "Python decorators wrap functions.".into(),
            course_title: course.title.clone(),
            lesson_number: Some(3),
            chunk_index: 0,
        }];
        index.add_course(course, chunks).unwrap();
        index
    }

    fn state(provider: Arc<QueuedProvider>, history: Arc<MemoryHistoryStore>) -> AppState {
        AppState {
            provider: provider.clone(),
            orchestrator: Orchestrator::with_defaults(provider),
            backend: Arc::new(catalog()),
            history,
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_query(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_with_retrieval_returns_sources_and_session() {
        let provider = QueuedProvider::new(vec![
            Ok(Completion::tool_use(vec![ToolCall::new(
                "toolu_1",
                "search_course_content",
                serde_json::json!({"query": "decorators", "course_name": "python"}),
            )])),
            Ok(Completion::text("Decorators wrap functions.")),
        ]);
        let history = Arc::new(MemoryHistoryStore::default());
        let app = router(state(provider, history.clone()));

        let response = app
            .oneshot(post_query(serde_json::json!({"query": "What are decorators?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["answer"], "Decorators wrap functions.");
        assert_eq!(body["sources"][0]["display"], "Advanced Python Programming - Lesson 3");
        assert_eq!(body["sources"][0]["link"], "https://example.com/lesson3");

        let session = SessionId::from_string(body["session_id"].as_str().unwrap());
        assert!(history.get_history(&session).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_query_keeps_given_session() {
        let provider = QueuedProvider::new(vec![Ok(Completion::text("Hello."))]);
        let app = router(state(provider, Arc::new(MemoryHistoryStore::default())));

        let response = app
            .oneshot(post_query(serde_json::json!({"query": "hi", "session_id": "session_7"})))
            .await
            .unwrap();

        assert_eq!(json_body(response).await["session_id"], "session_7");
    }

    #[tokio::test]
    async fn test_provider_failure_is_500() {
        let provider = QueuedProvider::new(vec![Err(AgentError::ProviderUnavailable("down".into()))]);
        let app = router(state(provider, Arc::new(MemoryHistoryStore::default())));

        let response = app
            .oneshot(post_query(serde_json::json!({"query": "anything"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_course_stats() {
        let provider = QueuedProvider::new(Vec::new());
        let app = router(state(provider, Arc::new(MemoryHistoryStore::default())));

        let response = app
            .oneshot(Request::get("/api/courses").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["total_courses"], 1);
        assert_eq!(body["course_titles"][0], "Advanced Python Programming");
    }

    #[tokio::test]
    async fn test_clear_session() {
        let provider = QueuedProvider::new(Vec::new());
        let history = Arc::new(MemoryHistoryStore::default());
        let session = SessionId::from_string("s1");
        history.append(&session, "q", "a").unwrap();
        let app = router(state(provider, history.clone()));

        let response = app
            .oneshot(Request::delete("/api/session/s1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(history.get_history(&session).unwrap().is_none());
    }
}
