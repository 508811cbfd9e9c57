//! Domain Models
//!
//! Course catalog and retrieval result types.

use serde::{Deserialize, Serialize};

/// Metadata attached to one retrieved chunk
pub type ChunkMetadata = serde_json::Map<String, serde_json::Value>;

/// A lesson within a course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: i64,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// A course in the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique, canonical course identifier
    pub title: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn lesson(&self, lesson_number: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == lesson_number)
    }
}

/// A searchable segment of course text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<i64>,
    pub chunk_index: usize,
}

impl CourseChunk {
    /// Metadata as surfaced in `SearchResults`
    pub fn metadata(&self) -> ChunkMetadata {
        let mut metadata = ChunkMetadata::new();
        metadata.insert("course_title".into(), self.course_title.clone().into());
        if let Some(n) = self.lesson_number {
            metadata.insert("lesson_number".into(), n.into());
        }
        metadata.insert("chunk_index".into(), self.chunk_index.into());
        metadata
    }
}

/// Optional restrictions applied to a search
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Course name as given by the model; resolved by the backend
    pub course_name: Option<String>,
    pub lesson_number: Option<i64>,
}

impl SearchFilter {
    pub fn new(course_name: Option<&str>, lesson_number: Option<i64>) -> Self {
        Self {
            course_name: course_name.map(str::to_owned),
            lesson_number,
        }
    }

    /// "No content" message naming whichever filters were supplied
    pub fn no_content_message(&self) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = &self.course_name {
            message.push_str(&format!(" in course '{course}'"));
        }
        if let Some(lesson) = self.lesson_number {
            message.push_str(&format!(" in lesson {lesson}"));
        }
        message.push('.');
        message
    }
}

/// Outcome of a backend search.
///
/// `documents`, `metadata` and `distances` correlate by index. A set
/// `error` means the search failed, whatever the documents say.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResults {
    pub const fn new(
        documents: Vec<String>,
        metadata: Vec<ChunkMetadata>,
        distances: Vec<f32>,
    ) -> Self {
        Self {
            documents,
            metadata,
            distances,
            error: None,
        }
    }

    /// No documents, no error
    pub fn empty() -> Self {
        Self::default()
    }

    /// A failed search
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True only for a successful search that found nothing
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.error.is_none()
    }

    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Catalog summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_results_creation() {
        let results = SearchResults::new(
            vec!["doc1".into(), "doc2".into()],
            vec![ChunkMetadata::new(), ChunkMetadata::new()],
            vec![0.1, 0.2],
        );
        assert_eq!(results.len(), 2);
        assert!(results.error.is_none());
        assert!(!results.is_empty());
    }

    #[test]
    fn test_error_is_not_empty() {
        let results = SearchResults::failed("Database connection failed");
        assert!(results.is_error());
        assert!(!results.is_empty());
        assert!(results.documents.is_empty());

        assert!(SearchResults::empty().is_empty());
    }

    #[test]
    fn test_no_content_messages() {
        assert_eq!(
            SearchFilter::new(None, None).no_content_message(),
            "No relevant content found."
        );
        assert_eq!(
            SearchFilter::new(Some("missing"), None).no_content_message(),
            "No relevant content found in course 'missing'."
        );
        assert_eq!(
            SearchFilter::new(None, Some(99)).no_content_message(),
            "No relevant content found in lesson 99."
        );
        assert_eq!(
            SearchFilter::new(Some("python"), Some(3)).no_content_message(),
            "No relevant content found in course 'python' in lesson 3."
        );
    }

    #[test]
    fn test_chunk_metadata() {
        let chunk = CourseChunk {
            content: "text".into(),
            course_title: "Advanced Python Programming".into(),
            lesson_number: Some(3),
            chunk_index: 7,
        };
        let metadata = chunk.metadata();
        assert_eq!(metadata["course_title"], "Advanced Python Programming");
        assert_eq!(metadata["lesson_number"], 3);
        assert_eq!(metadata["chunk_index"], 7);
    }
}
