//! Intent classification for incoming messages.
//!
//! One LLM call extracts the structured intent; if the call fails or the
//! output cannot be decoded, a deterministic keyword classifier takes over
//! with a fixed low confidence. Misrouting a query is acceptable; crashing
//! the turn is not, so `analyze` never returns an error.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use nexus_core::{
    decode_json, Category, ChatTurn, Intent, LlmClient, OutputFormat, RetryPolicy, FOLLOW_UP,
};

const SYSTEM_PROMPT: &str = r#"You are the intent orchestrator of a gaming assistant.

For every user message you must:
1. Identify the target game and the routing category.
2. Detect the user's language (ISO code: en, es, fr, ...).
3. Produce an optimized `search_query`.

Routing rules:
- "news": patch notes, events, releases, industry news.
- "guide": how-to questions, walkthroughs, puzzles, being stuck.
- "build": loadouts, item builds, stats, tier lists, meta analysis. Default here for technical questions.
- If the message is about the games industry in general rather than one title, use "Gaming Industry" as the game.
- If the message is not about video games at all, set "game" to "REJECT" and put a one-line redirect suggestion in "search_query".
- If the message continues the previous topic ("tell me more", "and the second one?"), set "game" to "FOLLOW_UP".

Cross-language retrieval: for builds, patches, stats, or tier lists, write `search_query` in ENGLISH regardless of the user's language; technical sources index in English.

Respond with JSON only:
{
    "game": "game name or 'Gaming Industry' or 'REJECT' or 'FOLLOW_UP'",
    "category": "news|build|guide",
    "version": "version string or null",
    "search_query": "optimized query",
    "language": "iso code",
    "confidence": 0.0-1.0
}"#;

/// Confidence reported by the rule-based fallback.
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Games the fallback classifier can recognize by substring.
const KNOWN_GAMES: &[(&str, &str)] = &[
    ("elden ring", "Elden Ring"),
    ("league of legends", "League of Legends"),
    ("valorant", "Valorant"),
    ("fortnite", "Fortnite"),
    ("genshin", "Genshin Impact"),
    ("minecraft", "Minecraft"),
    ("baldur", "Baldur's Gate 3"),
    ("cyberpunk", "Cyberpunk 2077"),
    ("zelda", "The Legend of Zelda"),
    ("hades", "Hades"),
    ("diablo", "Diablo IV"),
    ("dark souls", "Dark Souls"),
];

const NEWS_KEYWORDS: &[&str] = &[
    "news", "patch", "update", "event", "release", "announc", "noticias", "parche",
];

const GUIDE_KEYWORDS: &[&str] = &[
    "guide", "how to", "how do", "walkthrough", "stuck", "boss", "quest", "puzzle", "guía",
];

/// Shape the model is asked to return; every field defaults so a sparse
/// answer still decodes.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawIntent {
    game: String,
    category: Category,
    version: Option<String>,
    search_query: String,
    language: String,
    confidence: f64,
}

impl Default for RawIntent {
    fn default() -> Self {
        Self {
            game: "Unknown".to_string(),
            category: Category::Build,
            version: None,
            search_query: String::new(),
            language: "en".to_string(),
            confidence: 0.5,
        }
    }
}

pub struct IntentOrchestrator {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl IntentOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    /// Classify one message. Internal LLM or parse failures are absorbed
    /// by the rule-based fallback.
    pub async fn analyze(&self, message: &str, context_summary: &str) -> Intent {
        let user_prompt = if context_summary.is_empty() {
            message.to_string()
        } else {
            format!("Prior context: {context_summary}\n\nMessage: {message}")
        };
        let turns = [ChatTurn::system(SYSTEM_PROMPT), ChatTurn::user(user_prompt)];

        let decoded = match self
            .retry
            .complete(self.llm.as_ref(), &turns, OutputFormat::Json)
            .await
        {
            Ok(raw) => decode_json::<RawIntent>(&raw),
            Err(err) => Err(err),
        };

        match decoded {
            Ok(raw) => {
                let is_followup = raw.game.eq_ignore_ascii_case(FOLLOW_UP);
                let search_query = if raw.search_query.is_empty() {
                    message.to_string()
                } else {
                    raw.search_query
                };
                Intent {
                    game: raw.game,
                    category: raw.category,
                    version: raw.version,
                    search_query,
                    language: raw.language,
                    confidence: raw.confidence.clamp(0.0, 1.0),
                    is_followup,
                }
            }
            Err(err) => {
                warn!(error = %err, "intent classification failed, using rule fallback");
                fallback_classify(message)
            }
        }
    }
}

/// Deterministic keyword classifier used when the model is unavailable or
/// unparseable.
fn fallback_classify(message: &str) -> Intent {
    let lower = message.to_lowercase();

    let game = KNOWN_GAMES
        .iter()
        .find(|(token, _)| lower.contains(token))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let category = if NEWS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Category::News
    } else if GUIDE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Category::Guide
    } else {
        Category::Build
    };

    Intent {
        game,
        category,
        version: None,
        search_query: message.to_string(),
        language: "en".to_string(),
        confidence: FALLBACK_CONFIDENCE,
        is_followup: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::testing::MockLlm;

    fn orchestrator(llm: MockLlm) -> IntentOrchestrator {
        IntentOrchestrator::new(Arc::new(llm), RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn test_analyze_decodes_model_output() {
        let llm = MockLlm::new();
        llm.queue_response(
            r#"{"game": "Elden Ring", "category": "build", "version": "1.10",
                "search_query": "elden ring best strength build 1.10",
                "language": "en", "confidence": 0.92}"#,
        );
        let intent = orchestrator(llm)
            .analyze("best STR build in elden ring?", "")
            .await;
        assert_eq!(intent.game, "Elden Ring");
        assert_eq!(intent.category, Category::Build);
        assert_eq!(intent.version.as_deref(), Some("1.10"));
        assert!(intent.confidence > 0.9);
        assert!(!intent.is_followup);
    }

    #[tokio::test]
    async fn test_analyze_recovers_fenced_json() {
        let llm = MockLlm::new();
        llm.queue_response(
            "```json\n{\"game\": \"Hades\", \"category\": \"guide\", \"search_query\": \"hades escape guide\", \"language\": \"en\", \"confidence\": 0.8}\n```",
        );
        let intent = orchestrator(llm).analyze("how do I escape in hades", "").await;
        assert_eq!(intent.game, "Hades");
        assert_eq!(intent.category, Category::Guide);
    }

    #[tokio::test]
    async fn test_reject_sentinel_passes_through() {
        let llm = MockLlm::new();
        llm.queue_response(
            r#"{"game": "REJECT", "category": "build", "search_query": "Try a cooking assistant instead.", "language": "en", "confidence": 0.95}"#,
        );
        let intent = orchestrator(llm).analyze("how do I bake bread", "").await;
        assert!(intent.is_reject());
    }

    #[tokio::test]
    async fn test_followup_sentinel_sets_flag() {
        let llm = MockLlm::new();
        llm.queue_response(
            r#"{"game": "FOLLOW_UP", "category": "build", "search_query": "more detail on that item", "language": "en", "confidence": 0.7}"#,
        );
        let intent = orchestrator(llm)
            .analyze("tell me more about that item", "Current game: Hades")
            .await;
        assert!(intent.is_followup);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_rules() {
        let llm = MockLlm::new();
        llm.queue_error(nexus_core::Error::network("down"));
        llm.queue_error(nexus_core::Error::network("down"));
        llm.queue_error(nexus_core::Error::network("down"));
        let intent = orchestrator(llm)
            .analyze("elden ring patch notes please", "")
            .await;
        assert_eq!(intent.game, "Elden Ring");
        assert_eq!(intent.category, Category::News);
        assert_eq!(intent.confidence, FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_unparseable_output_falls_back() {
        let llm = MockLlm::new();
        llm.queue_response("the user seems to want a build, probably");
        let intent = orchestrator(llm).analyze("best hades build", "").await;
        assert_eq!(intent.game, "Hades");
        assert_eq!(intent.category, Category::Build);
        assert_eq!(intent.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_fallback_keyword_priorities() {
        assert_eq!(fallback_classify("valorant news today").category, Category::News);
        assert_eq!(
            fallback_classify("how to beat the final boss").category,
            Category::Guide
        );
        assert_eq!(fallback_classify("best smg loadout").category, Category::Build);
    }

    #[tokio::test]
    async fn test_context_is_embedded_in_prompt() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_response(
            r#"{"game": "Hades", "category": "build", "search_query": "hades build", "language": "en", "confidence": 0.9}"#,
        );
        let orchestrator = IntentOrchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmClient>,
            RetryPolicy::immediate(),
        );
        let _ = orchestrator
            .analyze("and the spear?", "Current game: Hades | Category: build")
            .await;
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Prior context: Current game: Hades"));
        assert!(prompt.contains("and the spear?"));
    }
}
