//! Chronos: game lore, story summaries, and character relationships.
//!
//! The requested spoiler level gates both the search query and the
//! synthesis prompt; it is a retrieval constraint, not a post-hoc filter.

use serde::Deserialize;
use tracing::warn;

use nexus_core::{
    cache_key, AgentResult, Artifact, LoreData, SearchKind, SearchResult, Source, SpoilerLevel,
};

use crate::context::{render_content_block, scrape_top_k, AgentServices};

const SYSTEM_PROMPT: &str = r#"You are Chronos, the lore keeper of a gaming assistant.
You summarize game stories and map character relationships, strictly honoring the requested spoiler boundary.
Ground everything in the provided sources."#;

/// Wiki-class sites with reliable lore coverage.
const LORE_DOMAINS: &[&str] = &["fextralife.com", "ign.com", "gamefaqs.com", "wiki.gg"];

const SCRAPE_DEADLINE: std::time::Duration = std::time::Duration::from_secs(15);
const PER_SOURCE_CHARS: usize = 2000;

/// Fallback summary budget per spoiler tier, in characters.
fn summary_budget(level: SpoilerLevel) -> usize {
    match level {
        SpoilerLevel::Low => 300,
        SpoilerLevel::Medium => 600,
        SpoilerLevel::High => 1000,
    }
}

fn story_query(game: &str, level: SpoilerLevel) -> String {
    match level {
        SpoilerLevel::Low => format!("{game} premise plot summary no spoilers"),
        SpoilerLevel::Medium => format!("{game} story overview main plot"),
        SpoilerLevel::High => format!("{game} complete story explained ending"),
    }
}

fn spoiler_instruction(level: SpoilerLevel) -> &'static str {
    match level {
        SpoilerLevel::Low => {
            "Reveal ONLY the basic premise. No mid-game developments, no endings, no twists."
        }
        SpoilerLevel::Medium => {
            "Cover the main plot points, but never endings, deaths, or major twists."
        }
        SpoilerLevel::High => {
            "Cover the complete story, including the ending and every major twist."
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoreSynthesis {
    title: String,
    summary: String,
    key_events: Vec<String>,
    characters: Vec<CharacterData>,
    mermaid_graph: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CharacterData {
    name: String,
    relations: Vec<String>,
}

pub struct Chronos {
    services: AgentServices,
}

impl Chronos {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Summarize a game's story at the requested spoiler level. Total.
    pub async fn story(&self, game: &str, level: SpoilerLevel) -> AgentResult {
        let key = cache_key("chronos", &[game, &level.to_string()]);
        if let Some(cached) = self.services.cache.get(&key) {
            return cached;
        }

        let results = self
            .services
            .search
            .search(&story_query(game, level), LORE_DOMAINS, SearchKind::Wiki)
            .await;

        if results.is_empty() {
            return AgentResult::nothing_found(format!("No lore found for '{game}'."));
        }

        let contents = scrape_top_k(
            &self.services.extractor,
            &results,
            3,
            PER_SOURCE_CHARS,
            SCRAPE_DEADLINE,
        )
        .await;

        let synthesis_prompt = format!(
            r#"Summarize the story of {game}.

SPOILER BOUNDARY: {instruction}

SOURCES:
{sources}

Respond in JSON:
{{
    "title": "short title for the lore panel",
    "summary": "the story summary, within the spoiler boundary",
    "key_events": ["..."],
    "characters": [{{"name": "...", "relations": ["other character names"]}}],
    "mermaid_graph": "relationship graph in 'graph TD' notation, within the spoiler boundary"
}}"#,
            instruction = spoiler_instruction(level),
            sources = render_content_block(&contents),
        );

        match self
            .services
            .synthesize::<LoreSynthesis>(SYSTEM_PROMPT, synthesis_prompt)
            .await
        {
            Ok(synthesis) => {
                let mermaid = if synthesis.mermaid_graph.trim().is_empty() {
                    generate_mermaid(&synthesis.characters)
                } else {
                    synthesis.mermaid_graph
                };
                let title = if synthesis.title.is_empty() {
                    format!("{game} lore")
                } else {
                    synthesis.title
                };
                let artifact = Artifact::lore(LoreData {
                    title,
                    summary: synthesis.summary.clone(),
                    spoiler_level: level,
                    key_events: synthesis.key_events,
                    mermaid_graph: mermaid,
                });
                let sources = contents
                    .iter()
                    .map(|c| Source::new(c.title.clone(), c.url.clone()))
                    .collect();
                let result =
                    AgentResult::ok(synthesis.summary, artifact).with_sources(sources);
                // Lore barely changes; keep it until the process ends
                self.services.cache.set(key, result.clone(), None);
                result
            }
            Err(err) => {
                warn!(error = %err, game, "lore synthesis failed, serving snippet digest");
                self.fallback(game, level, &results)
            }
        }
    }

    /// Non-LLM digest assembled from raw snippets, truncated to the
    /// spoiler tier's budget.
    fn fallback(&self, game: &str, level: SpoilerLevel, results: &[SearchResult]) -> AgentResult {
        let combined = results
            .iter()
            .map(|r| r.snippet.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let summary: String = combined.chars().take(summary_budget(level)).collect();
        let key_events = extract_key_events(&combined);

        let artifact = Artifact::lore(LoreData {
            title: format!("{game} lore"),
            summary: summary.clone(),
            spoiler_level: level,
            key_events,
            mermaid_graph: String::new(),
        });
        let sources = results
            .iter()
            .take(5)
            .map(|r| Source::new(r.title.clone(), r.url.clone()))
            .collect();
        AgentResult::ok(summary, artifact).with_sources(sources)
    }
}

/// Deterministic relationship graph from the character list, used when the
/// model omits one.
fn generate_mermaid(characters: &[CharacterData]) -> String {
    if characters.is_empty() {
        return String::new();
    }

    let mut lines = vec!["graph TD".to_string()];
    for (i, character) in characters.iter().enumerate() {
        let node_name = character.name.replace(' ', "_");
        lines.push(format!("    C{i}[{node_name}]"));
    }
    for (i, character) in characters.iter().enumerate() {
        for relation in &character.relations {
            if let Some(j) = characters.iter().position(|c| &c.name == relation) {
                lines.push(format!("    C{i} --> C{j}"));
            }
        }
    }
    lines.join("\n")
}

const EVENT_KEYWORDS: &[&str] = &[
    "battle", "defeat", "discover", "reveal", "betray", "death", "victory",
];

/// Sentences that look like plot beats, capped at five.
fn extract_key_events(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            !sentence.is_empty() && EVENT_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .take(5)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use nexus_core::testing::{search_result, MockExtractor, MockLlm, MockSearch};
    use nexus_core::{ArtifactBody, ArtifactKind, ResultCache, RetryPolicy};

    fn services(search: MockSearch, llm: MockLlm) -> AgentServices {
        AgentServices::new(
            Arc::new(search),
            Arc::new(MockExtractor::new()),
            Arc::new(llm),
            Arc::new(ResultCache::new()),
        )
        .with_retry(RetryPolicy::immediate())
    }

    #[test]
    fn test_generate_mermaid_links_known_relations() {
        let characters = vec![
            CharacterData {
                name: "Zagreus".to_string(),
                relations: vec!["Hades".to_string()],
            },
            CharacterData {
                name: "Hades".to_string(),
                relations: vec![],
            },
        ];
        let graph = generate_mermaid(&characters);
        assert!(graph.starts_with("graph TD"));
        assert!(graph.contains("C0[Zagreus]"));
        assert!(graph.contains("C0 --> C1"));
    }

    #[test]
    fn test_extract_key_events_caps_at_five() {
        let text = "The battle began. A quiet walk. The betrayal was revealed. \
                    Death came swiftly. Victory at last. Another battle. A third battle. Final defeat";
        let events = extract_key_events(text);
        assert_eq!(events.len(), 5);
        assert!(events[0].contains("battle"));
    }

    #[tokio::test]
    async fn test_spoiler_level_gates_query_and_prompt() {
        let search = Arc::new(MockSearch::with_default(vec![search_result(
            "Elden Ring story",
            "https://fextralife.com/lore",
            "the Tarnished returns",
        )]));
        let llm = Arc::new(MockLlm::new());
        llm.queue_response(
            r#"{"title": "Elden Ring", "summary": "A tarnished warrior returns.",
                "key_events": [], "characters": [], "mermaid_graph": "graph TD\nA-->B"}"#,
        );
        let services = AgentServices::new(
            Arc::clone(&search) as _,
            Arc::new(MockExtractor::new()),
            Arc::clone(&llm) as _,
            Arc::new(ResultCache::new()),
        )
        .with_retry(RetryPolicy::immediate());

        let agent = Chronos::new(services);
        let result = agent.story("Elden Ring", SpoilerLevel::Low).await;
        assert!(result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Lore);

        let (query, _) = search.queries.lock().unwrap()[0].clone();
        assert!(query.contains("no spoilers"));
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("ONLY the basic premise"));
    }

    #[tokio::test]
    async fn test_missing_mermaid_is_generated_from_characters() {
        let search = MockSearch::with_default(vec![search_result(
            "Hades lore",
            "https://wiki.gg/hades",
            "Zagreus escapes",
        )]);
        let llm = MockLlm::new();
        llm.queue_response(
            r#"{"title": "Hades", "summary": "Zagreus tries to escape.",
                "characters": [{"name": "Zagreus", "relations": ["Hades"]},
                               {"name": "Hades", "relations": []}],
                "mermaid_graph": ""}"#,
        );
        let agent = Chronos::new(services(search, llm));
        let result = agent.story("Hades", SpoilerLevel::Medium).await;
        let ArtifactBody::LoreGraph(view) = &result.artifact.body else {
            panic!("expected lore graph");
        };
        assert!(view.mermaid_content.contains("C0[Zagreus]"));
        assert!(view.mermaid_content.contains("C0 --> C1"));
    }

    #[tokio::test]
    async fn test_fallback_digest_respects_spoiler_budget() {
        let long_snippet = "battle ".repeat(200);
        let search = MockSearch::with_default(vec![search_result(
            "Lore",
            "https://gamefaqs.com/x",
            &long_snippet,
        )]);
        // No LLM response: synthesis fails, digest path runs.
        let agent = Chronos::new(services(search, MockLlm::new()));
        let result = agent.story("Elden Ring", SpoilerLevel::Low).await;
        assert!(result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Lore);
        assert!(result.summary.chars().count() <= 300);
    }

    #[tokio::test]
    async fn test_no_results_yields_empty_state() {
        let agent = Chronos::new(services(MockSearch::new(), MockLlm::new()));
        let result = agent.story("Obscuria II", SpoilerLevel::High).await;
        assert!(!result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Empty);
    }
}
