//! Course Materials Assistant HTTP Server
//!
//! Axum-based server answering questions about course materials through a
//! tool-calling Claude model.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_search::{InMemoryCourseIndex, SearchBackend};
use rag_core::{LlmProvider, MemoryHistoryStore, OrchestratorBuilder};
use rag_runtime::AnthropicProvider;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first; RUST_LOG may come from .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - queries will fail", provider.name());
        }
    }

    // Load course catalog
    let index = match &config.courses_path {
        Some(path) => InMemoryCourseIndex::load(path, config.max_results).await?,
        None => {
            tracing::warn!("⚠ COURSES_PATH not set - starting with an empty catalog");
            InMemoryCourseIndex::new(config.max_results)
        }
    };
    let backend: Arc<dyn SearchBackend> = Arc::new(index);
    for title in backend.course_titles().await {
        tracing::info!("  • {}", title);
    }

    let mut builder = OrchestratorBuilder::new()
        .provider(provider.clone())
        .max_rounds(config.max_rounds);
    if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
        builder = builder.model(model);
    }
    let orchestrator = builder.build()?;

    // Build application state
    let state = AppState {
        provider,
        orchestrator,
        backend,
        history: Arc::new(MemoryHistoryStore::new(config.max_history)),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = handlers::router(state);
    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 course assistant running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                - Health check");
    tracing::info!("  POST   /api/query             - Ask a question");
    tracing::info!("  GET    /api/courses           - Course catalog summary");
    tracing::info!("  DELETE /api/session/{{id}}      - Clear a session");

    axum::serve(listener, app).await?;

    Ok(())
}
