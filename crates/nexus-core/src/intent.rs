use serde::{Deserialize, Serialize};

/// Sentinel game value: the query is outside the assistant's domain and
/// must short-circuit to a canned rejection.
pub const REJECT: &str = "REJECT";

/// Sentinel game value: the message continues the previous turn and should
/// inherit its game/category/version from the conversation context.
pub const FOLLOW_UP: &str = "FOLLOW_UP";

/// Routing category for a classified message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    #[default]
    Build,
    Guide,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::News => write!(f, "news"),
            Category::Build => write!(f, "build"),
            Category::Guide => write!(f, "guide"),
        }
    }
}

/// Structured classification of one user turn. Produced once by the
/// orchestrator and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub game: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub search_query: String,
    pub language: String,
    pub confidence: f64,
    pub is_followup: bool,
}

impl Intent {
    pub fn is_reject(&self) -> bool {
        self.game.eq_ignore_ascii_case(REJECT)
    }
}
