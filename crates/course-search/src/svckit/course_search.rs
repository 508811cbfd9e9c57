//! Course Search Tool
//!
//! Lets the model search course content, optionally narrowed to a course
//! and lesson, and records where each returned excerpt came from.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use rag_core::{Citation, ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolDefinition};

use crate::backend::SearchBackend;
use crate::model::{SearchFilter, SearchResults};

/// Name the model uses to call this tool
pub const TOOL_NAME: &str = "search_course_content";

/// Tool for searching course materials
pub struct CourseSearchTool {
    backend: Arc<dyn SearchBackend>,
    last_sources: Mutex<Vec<Citation>>,
}

impl CourseSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Render results as labelled blocks and collect their citations
    async fn format_results(&self, results: &SearchResults) -> (String, Vec<Citation>) {
        let mut blocks = Vec::with_capacity(results.len());
        let mut sources = Vec::with_capacity(results.len());

        for (document, metadata) in results.documents.iter().zip(&results.metadata) {
            let course_title = metadata
                .get("course_title")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let lesson_number = metadata.get("lesson_number").and_then(serde_json::Value::as_i64);

            let mut label = course_title.to_owned();
            if let Some(n) = lesson_number {
                label.push_str(&format!(" - Lesson {n}"));
            }

            let link = match lesson_number {
                Some(n) => self.backend.lesson_link(course_title, n).await,
                None => None,
            };

            blocks.push(format!("[{label}]\n{document}"));
            sources.push(Citation::new(label, link));
        }

        (blocks.join("\n\n"), sources)
    }

    fn store_sources(&self, sources: Vec<Citation>) {
        *self.last_sources.lock().unwrap_or_else(PoisonError::into_inner) = sources;
    }
}

/// Integer argument given either as a number or a numeric string
fn integer_arg(arguments: &ToolArguments, key: &str) -> Option<i64> {
    match arguments.get(key)? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME.into(),
            description: "Search course materials with smart course name matching and lesson filtering".into(),
            parameters: vec![
                ParameterSchema::new("query", "string", "What to search for in the course content").required(),
                ParameterSchema::new(
                    "course_name",
                    "string",
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                ),
                ParameterSchema::new(
                    "lesson_number",
                    "integer",
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
            ],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<String> {
        let query = arguments.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        let course_name = arguments
            .get("course_name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let filter = SearchFilter::new(course_name, integer_arg(arguments, "lesson_number"));

        tracing::debug!(query = %query, ?filter, backend = self.backend.name(), "Searching course content");
        let results = self.backend.search(query, &filter, None).await;

        if let Some(error) = &results.error {
            return Ok(error.clone());
        }
        if results.is_empty() {
            return Ok(filter.no_content_message());
        }

        let (formatted, sources) = self.format_results(&results).await;
        self.store_sources(sources);
        Ok(formatted)
    }

    fn last_sources(&self) -> Vec<Citation> {
        self.last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset_sources(&self) {
        self.store_sources(Vec::new());
    }
}
