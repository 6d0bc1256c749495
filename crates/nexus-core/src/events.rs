use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::result::Source;

/// One event in the ordered per-turn stream consumed by the client:
/// zero or more `thinking`, exactly one `response` or `error`, then `done`.
/// Thinking events are advisory and droppable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Thinking {
        content: String,
    },
    Response {
        content: String,
        artifact: Artifact,
        sources: Vec<Source>,
    },
    Error {
        content: String,
    },
    Done,
}

impl TurnEvent {
    pub fn thinking(content: impl Into<String>) -> Self {
        Self::Thinking {
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }

    /// Terminal events settle the turn; `done` only closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Response { .. } | TurnEvent::Error { .. })
    }
}
