//! Retrieval Backends
//!
//! The search contract the course search tool consumes, plus an in-memory
//! implementation.

mod memory;

pub use memory::{DEFAULT_MAX_RESULTS, InMemoryCourseIndex};

use async_trait::async_trait;

use crate::model::{CourseAnalytics, SearchFilter, SearchResults};

/// Retrieval backend trait (Strategy pattern)
///
/// Implement this for each index: vector store, keyword index, remote service.
/// Failures are reported through `SearchResults::error`, not as `Err`, so the
/// tool can hand them to the model as text.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search course content.
    ///
    /// A course name is resolved to the canonical course title by the
    /// backend. `limit` falls back to the backend's configured maximum.
    async fn search(&self, query: &str, filter: &SearchFilter, limit: Option<usize>) -> SearchResults;

    /// Link to a specific lesson, if known
    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Option<String>;

    /// Titles of every course in the catalog
    async fn course_titles(&self) -> Vec<String>;

    /// Number of courses in the catalog
    async fn course_count(&self) -> usize {
        self.course_titles().await.len()
    }

    /// Catalog summary
    async fn analytics(&self) -> CourseAnalytics {
        let course_titles = self.course_titles().await;
        CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        }
    }

    /// Backend name
    fn name(&self) -> &str;
}
