//! Session History
//!
//! Cross-query conversation history, keyed by session and bounded to the
//! most recent exchanges. Distinct from the per-query transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Role;

/// Default number of exchanges kept per session
pub const DEFAULT_MAX_HISTORY: usize = 2;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One remembered message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_owned(),
            timestamp: Utc::now(),
        }
    }

    fn label(&self) -> &'static str {
        match self.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }
}

/// History store trait
pub trait HistoryStore: Send + Sync {
    /// Start a new, empty session
    fn create_session(&self) -> Result<SessionId>;

    /// Flattened prior exchanges, or `None` when there are none
    fn get_history(&self, id: &SessionId) -> Result<Option<String>>;

    /// Record one user/assistant exchange
    fn append(&self, id: &SessionId, user_text: &str, assistant_text: &str) -> Result<()>;

    /// Forget a session
    fn clear(&self, id: &SessionId) -> Result<()>;
}

/// In-memory history store
pub struct MemoryHistoryStore {
    sessions: RwLock<HashMap<SessionId, Vec<HistoryEntry>>>,
    max_history: usize,
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl MemoryHistoryStore {
    /// Keep at most `max_history` exchanges per session
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Number of live sessions
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SessionId, Vec<HistoryEntry>>>> {
        self.sessions
            .read()
            .map_err(|_| AgentError::Session("history lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SessionId, Vec<HistoryEntry>>>> {
        self.sessions
            .write()
            .map_err(|_| AgentError::Session("history lock poisoned".into()))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn create_session(&self) -> Result<SessionId> {
        let id = SessionId::new();
        self.write()?.insert(id.clone(), Vec::new());
        tracing::debug!(session = %id, "Created session");
        Ok(id)
    }

    fn get_history(&self, id: &SessionId) -> Result<Option<String>> {
        let sessions = self.read()?;
        let Some(entries) = sessions.get(id).filter(|e| !e.is_empty()) else {
            return Ok(None);
        };

        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("{}: {}", e.label(), e.content))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn append(&self, id: &SessionId, user_text: &str, assistant_text: &str) -> Result<()> {
        let mut sessions = self.write()?;
        let entries = sessions.entry(id.clone()).or_default();
        entries.push(HistoryEntry::new(Role::User, user_text));
        entries.push(HistoryEntry::new(Role::Assistant, assistant_text));

        let keep = self.max_history * 2;
        if entries.len() > keep {
            let excess = entries.len() - keep;
            entries.drain(..excess);
        }
        Ok(())
    }

    fn clear(&self, id: &SessionId) -> Result<()> {
        self.write()?.remove(id);
        Ok(())
    }
}
