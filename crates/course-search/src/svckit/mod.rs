//! Service Kit - Agent Tools
//!
//! Tools that implement `rag_core::Tool` on top of a search backend.

mod course_search;

pub use course_search::CourseSearchTool;
