//! Conversation state and the session store.
//!
//! A `ConversationState` is an append-only message log plus the mutable
//! search context used to resolve follow-up questions ("tell me more about
//! that item"). The `SessionStore` owns states by session id and is handed
//! around as an injected service; all mutation goes through single locked
//! operations so a cancelled turn can never leave partial state behind.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::intent::Category;
use crate::result::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Thinking,
}

/// Single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl StoredMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            artifact: None,
            sources: None,
        }
    }
}

/// Context carried between turns for follow-up resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchContext {
    pub game: Option<String>,
    pub category: Option<Category>,
    pub version: Option<String>,
    pub last_items: Vec<String>,
}

impl SearchContext {
    /// Render the context for embedding in a classification prompt.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(game) = &self.game {
            parts.push(format!("Current game: {game}"));
        }
        if let Some(category) = &self.category {
            parts.push(format!("Category: {category}"));
        }
        if let Some(version) = &self.version {
            parts.push(format!("Version/patch: {version}"));
        }
        if !self.last_items.is_empty() {
            let items = self.last_items.iter().take(5).cloned().collect::<Vec<_>>();
            parts.push(format!("Items mentioned: {}", items.join(", ")));
        }
        if parts.is_empty() {
            "No prior context".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Full conversation state: history plus search context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<StoredMessage>,
    pub search_context: SearchContext,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(StoredMessage::new(MessageRole::User, content));
    }

    pub fn add_assistant(
        &mut self,
        content: impl Into<String>,
        artifact: Option<Artifact>,
        sources: Option<Vec<Source>>,
    ) {
        let mut message = StoredMessage::new(MessageRole::Assistant, content);
        message.artifact = artifact;
        message.sources = sources;
        self.messages.push(message);
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> &[StoredMessage] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn context_summary(&self) -> String {
        self.search_context.summary()
    }

    /// Overwrite context fields that the finished turn established;
    /// absent values leave the previous context in place.
    pub fn update_context(
        &mut self,
        game: Option<&str>,
        category: Option<Category>,
        version: Option<&str>,
        items: &[String],
    ) {
        if let Some(game) = game {
            if !game.is_empty() {
                self.search_context.game = Some(game.to_string());
            }
        }
        if let Some(category) = category {
            self.search_context.category = Some(category);
        }
        if let Some(version) = version {
            if !version.is_empty() {
                self.search_context.version = Some(version.to_string());
            }
        }
        if !items.is_empty() {
            self.search_context.last_items = items.to_vec();
        }
    }
}

/// Session-keyed conversation states. Created once at process start and
/// injected wherever turns are run.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure against a session's state, creating it on first use.
    /// The closure runs under the store lock; keep it short and never
    /// await inside.
    pub fn with_state<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ConversationState) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock().unwrap();
        let state = sessions.entry(session_id.to_string()).or_default();
        f(state)
    }

    pub fn append_user(&self, session_id: &str, content: &str) {
        self.with_state(session_id, |state| state.add_user(content));
    }

    /// Snapshot of the follow-up context, default for unknown sessions.
    pub fn snapshot_context(&self, session_id: &str) -> SearchContext {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(session_id)
            .map(|state| state.search_context.clone())
            .unwrap_or_default()
    }

    /// Recent history for a session; empty for unknown sessions.
    pub fn history(&self, session_id: &str, limit: usize) -> Vec<StoredMessage> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(session_id)
            .map(|state| state.recent(limit).to_vec())
            .unwrap_or_default()
    }

    /// Drop a session. Clearing a nonexistent session is a no-op.
    pub fn clear(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }
}
