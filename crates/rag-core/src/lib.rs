//! # rag-core
//!
//! Tool-mediated, multi-round LLM orchestration for course question answering.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Assistant                                │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │ Orchestrator │  │    Tool      │  │   LlmProvider          │  │
//! │  │ (round loop) │──│   Registry   │  │   (Strategy)           │  │
//! │  └──────┬───────┘  └──────────────┘  └────────────────────────┘  │
//! │         └──────────────────────────────────────┘                 │
//! │  ┌──────────────┐                                                │
//! │  │ HistoryStore │  session-scoped text history                   │
//! │  └──────────────┘                                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the orchestrator independent of any single
//! generation API; the `Tool` trait keeps it independent of the retrieval
//! backend.

pub mod assistant;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use assistant::{Assistant, QueryResponse};
pub use error::{AgentError, Result};
pub use message::{ContentBlock, Message, Role};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorConfig};
pub use provider::{Completion, GenerationOptions, GenerationRequest, LlmProvider, StopReason};
pub use session::{HistoryStore, MemoryHistoryStore, SessionId};
pub use tool::{
    Citation, ParameterSchema, Tool, ToolArguments, ToolCall, ToolDefinition, ToolRegistry,
    ToolResult,
};
