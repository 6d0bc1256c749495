//! nexus-core: Core types and traits for nexus
//!
//! This crate provides the foundational pieces of the gaming-assistant
//! retrieval backend: the error taxonomy, the language-model client
//! boundary with its centralized retry policy, intent and artifact
//! schemas, the shared response cache, conversation state, and the
//! search/scrape collaborator traits.

pub mod artifact;
pub mod cache;
pub mod decode;
pub mod error;
pub mod events;
pub mod intent;
pub mod llm;
pub mod result;
pub mod scrape;
pub mod search;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use artifact::{
    Artifact, ArtifactBody, ArtifactKind, BuildData, BuildItemData, DealQuote, DealView,
    GuideData, GuideStepData, GuideStepView, LoreData, MarathonData, PlaytimeHours, PriceData,
    SkillData, SpoilerLevel, TableData, TimeData, WorthView,
};
pub use cache::{cache_key, ResultCache, DEFAULT_TTL};
pub use decode::decode_json;
pub use error::Error;
pub use events::TurnEvent;
pub use intent::{Category, Intent, FOLLOW_UP, REJECT};
pub use llm::{ChatRole, ChatTurn, LlmClient, OutputFormat, RetryPolicy};
pub use result::{AgentResult, Source};
pub use scrape::{ContentExtractor, ScrapedContent};
pub use search::{SearchGateway, SearchKind, SearchResult};
pub use session::{ConversationState, MessageRole, SearchContext, SessionStore, StoredMessage};

pub type Result<T> = std::result::Result<T, Error>;
