//! # course-search
//!
//! Course content retrieval for the course assistant: a search backend
//! contract, an in-memory catalog index, and the `search_course_content`
//! tool the model calls.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  tool_use   ┌──────────────────┐  search   ┌───────────────┐
//! │   LLM    │ ──────────▶ │ CourseSearchTool │ ────────▶ │ SearchBackend │
//! └──────────┘             └──────────────────┘           └───────────────┘
//!      ▲                      │ formatted text                  │
//!      └──────────────────────┘ + citations ◀───────────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod model;
pub mod svckit;

pub use backend::{DEFAULT_MAX_RESULTS, InMemoryCourseIndex, SearchBackend};
pub use error::{Result, SearchError};
pub use model::{Course, CourseAnalytics, CourseChunk, Lesson, SearchFilter, SearchResults};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::CourseSearchTool;
}
