//! # rag-runtime
//!
//! Generation providers for the course assistant.
//!
//! ## Providers
//!
//! - **Anthropic** (default): Claude Messages API with native tool calling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag_runtime::anthropic::{AnthropicConfig, AnthropicProvider};
//!
//! let config = AnthropicConfig::from_env()?;
//! config.validate()?;
//! let orchestrator = OrchestratorBuilder::new()
//!     .provider(Arc::new(AnthropicProvider::new(config)?))
//!     .build()?;
//! ```

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};

// Re-export core types for convenience
pub use rag_core::{AgentError, Completion, GenerationOptions, GenerationRequest, LlmProvider, Result};
