//! In-Memory Course Index
//!
//! Holds a course catalog and its chunks in memory. Ranking is plain
//! query-term overlap; good enough for demos, tests and small catalogs.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::SearchBackend;
use crate::error::{Result, SearchError};
use crate::model::{Course, CourseChunk, SearchFilter, SearchResults};

/// Default number of chunks returned per search
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// One course as stored in a catalog file
#[derive(Debug, Deserialize)]
struct CourseDocument {
    #[serde(flatten)]
    course: Course,
    #[serde(default)]
    chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    #[serde(default)]
    lesson_number: Option<i64>,
    content: String,
}

/// In-memory course index
#[derive(Debug, Default)]
pub struct InMemoryCourseIndex {
    courses: Vec<Course>,
    chunks: Vec<CourseChunk>,
    max_results: usize,
}

impl InMemoryCourseIndex {
    pub fn new(max_results: usize) -> Self {
        Self {
            courses: Vec::new(),
            chunks: Vec::new(),
            max_results,
        }
    }

    /// Add a course and its chunks; titles must be unique
    pub fn add_course(&mut self, course: Course, chunks: Vec<CourseChunk>) -> Result<()> {
        if course.title.trim().is_empty() {
            return Err(SearchError::Catalog("course title is empty".into()));
        }
        if self.courses.iter().any(|c| c.title == course.title) {
            return Err(SearchError::Catalog(format!(
                "course '{}' already indexed",
                course.title
            )));
        }

        tracing::debug!(course = %course.title, chunks = chunks.len(), "Indexed course");
        self.courses.push(course);
        self.chunks.extend(chunks);
        Ok(())
    }

    /// Build from a JSON array of courses, each with inline `chunks`
    pub fn from_json_str(json: &str, max_results: usize) -> Result<Self> {
        let documents: Vec<CourseDocument> = serde_json::from_str(json)?;
        let mut index = Self::new(max_results);

        for document in documents {
            let title = document.course.title.clone();
            let chunks = document
                .chunks
                .into_iter()
                .enumerate()
                .map(|(chunk_index, record)| CourseChunk {
                    content: record.content,
                    course_title: title.clone(),
                    lesson_number: record.lesson_number,
                    chunk_index,
                })
                .collect();

            if let Err(e) = index.add_course(document.course, chunks) {
                tracing::warn!(course = %title, error = %e, "Skipping course");
            }
        }

        Ok(index)
    }

    /// Load a catalog file
    pub async fn load(path: impl AsRef<Path>, max_results: usize) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let index = Self::from_json_str(&json, max_results)?;
        tracing::info!(
            path = %path.as_ref().display(),
            courses = index.courses.len(),
            chunks = index.chunks.len(),
            "Loaded course catalog"
        );
        Ok(index)
    }

    /// Map a loosely written course name onto a catalog title
    pub fn resolve_course_name(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(course) = self.courses.iter().find(|c| c.title.to_lowercase() == needle) {
            return Some(&course.title);
        }
        if let Some(course) = self
            .courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&needle))
        {
            return Some(&course.title);
        }

        let wanted: HashSet<String> = tokenize(&needle).into_iter().collect();
        self.courses
            .iter()
            .map(|c| (overlap(&wanted, &c.title), c))
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score)
            .map(|(_, c)| c.title.as_str())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl SearchBackend for InMemoryCourseIndex {
    #[allow(clippy::cast_precision_loss)]
    async fn search(&self, query: &str, filter: &SearchFilter, limit: Option<usize>) -> SearchResults {
        let course_title = match &filter.course_name {
            Some(name) => match self.resolve_course_name(name) {
                Some(title) => Some(title),
                None => return SearchResults::failed(format!("No course found matching '{name}'")),
            },
            None => None,
        };

        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return SearchResults::empty();
        }

        let mut scored: Vec<(usize, &CourseChunk)> = self
            .chunks
            .iter()
            .filter(|c| course_title.is_none_or(|t| c.course_title == t))
            .filter(|c| filter.lesson_number.is_none_or(|n| c.lesson_number == Some(n)))
            .map(|c| (overlap(&terms, &c.content), c))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit.unwrap_or(self.max_results));

        let mut results = SearchResults::empty();
        for (score, chunk) in scored {
            results.documents.push(chunk.content.clone());
            results.metadata.push(chunk.metadata());
            results.distances.push(1.0 - score as f32 / terms.len() as f32);
        }

        tracing::debug!(query = %query, hits = results.len(), "In-memory search");
        results
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Option<String> {
        self.courses
            .iter()
            .find(|c| c.title == course_title)?
            .lesson(lesson_number)?
            .lesson_link
            .clone()
    }

    async fn course_titles(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.title.clone()).collect()
    }

    fn name(&self) -> &str {
        "InMemoryCourseIndex"
    }
}

/// Lowercase alphanumeric tokens
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Number of `terms` present in `text`
fn overlap(terms: &HashSet<String>, text: &str) -> usize {
    let tokens: HashSet<String> = tokenize(text).into_iter().collect();
    terms.intersection(&tokens).count()
}
