//! Transcript Messages
//!
//! Role-tagged messages exchanged with the generation provider during a
//! single top-level query. Nothing here outlives one orchestrator run.

use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolResult};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool results fed back to the model
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// One block of message content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },
    /// A tool invocation requested by the model
    ToolUse(ToolCall),
    /// The outcome of a tool invocation
    ToolResult(ToolResult),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single message in a transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a new message
    pub const fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Create a user message with a single text block
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant message from the model's content blocks
    pub const fn assistant(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Group tool results into a single tool-role message
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::new(
            Role::Tool,
            results.into_iter().map(ContentBlock::ToolResult).collect(),
        )
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        text_of(&self.content)
    }
}

/// Join the text blocks of a content list
pub fn text_of(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Ordered message log for one top-level query
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with the user's query
    pub fn from_query(query: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::user(query));
        transcript
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Transcript> for Vec<Message> {
    fn from(transcript: Transcript) -> Self {
        transcript.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
    }

    #[test]
    fn test_text_skips_tool_blocks() {
        let msg = Message::assistant(vec![
            ContentBlock::text("Let me look. "),
            ContentBlock::ToolUse(ToolCall::new("call_1", "search_course_content", serde_json::json!({}))),
            ContentBlock::text("Done."),
        ]);
        assert_eq!(msg.text(), "Let me look. Done.");
    }

    #[test]
    fn test_tool_results_grouped() {
        let msg = Message::tool_results(vec![
            ToolResult::new("a", "first"),
            ToolResult::new("b", "second"),
        ]);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.content.len(), 2);
    }

    #[test]
    fn test_transcript() {
        let mut transcript = Transcript::from_query("What is a closure?");
        transcript.push(Message::assistant(vec![ContentBlock::text("A function.")]));

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().map(|m| m.role), Some(Role::Assistant));
    }

    #[test]
    fn test_content_block_wire_tag() {
        let json = serde_json::to_value(ContentBlock::text("hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hi");
    }
}
