//! NewsScout: breaking news, patches, and gaming events.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use nexus_core::{
    cache_key, AgentResult, Artifact, SearchKind, Source, TableData,
};

use crate::context::{consolidate, render_content_block, scrape_top_k, AgentServices, Topic};

const SYSTEM_PROMPT: &str = r#"You are NewsScout, an agent specialized exclusively in video-game industry news.

Rules:
1. Total context: terms like "news", "events" or "patches" always refer to video games.
2. Never answer from prior knowledge; every claim must come from the provided sources.
3. Freshness filter: if information is older than six months and the game is a live service, warn about it.
4. Attribution: every key item keeps its source URL.
5. Keep the chat summary short; details belong in the table.

Tone: technical and efficient."#;

/// News is volatile; cache entries expire quickly.
const NEWS_TTL: Duration = Duration::from_secs(300);
const SCRAPE_DEADLINE: Duration = Duration::from_secs(20);
const SCRAPE_TOP_K: usize = 5;
const PER_SOURCE_CHARS: usize = 2500;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsSynthesis {
    summary: String,
    news_items: Vec<NewsItemData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct NewsItemData {
    title: String,
    date: String,
    description: String,
    url: String,
    source_lang: String,
    importance: String,
}

pub struct NewsScout {
    services: AgentServices,
}

impl NewsScout {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Search and summarize recent news. Total: every failure path
    /// degrades to a renderable result.
    pub async fn search(&self, topic: &Topic) -> AgentResult {
        let key = cache_key(
            "news",
            &[
                &topic.game,
                &topic.query,
                topic.version_or_none(),
                &topic.language,
            ],
        );
        if let Some(cached) = self.services.cache.get(&key) {
            return cached;
        }

        let mut base_query = format!("{} {}", topic.game, topic.query);
        if let Some(version) = &topic.version {
            base_query.push(' ');
            base_query.push_str(version);
        }

        // Cross-language retrieval: non-English users get their local
        // outlets and the global (English) sources in parallel.
        let results = if topic.language != "en" {
            let local = self
                .services
                .search
                .search(&base_query, &[], SearchKind::LocalNews);
            let global_query = format!("{} news update", topic.game);
            let global = self
                .services
                .search
                .search(&global_query, &[], SearchKind::GlobalNews);
            let (local, global) = futures::join!(local, global);
            consolidate(vec![local, global])
        } else {
            let global = self
                .services
                .search
                .search(&base_query, &[], SearchKind::GlobalNews)
                .await;
            consolidate(vec![global])
        };

        if results.is_empty() {
            return AgentResult::nothing_found(format!(
                "I couldn't find recent news about {}. Try being more specific.",
                topic.game
            ));
        }

        let contents = scrape_top_k(
            &self.services.extractor,
            &results,
            SCRAPE_TOP_K,
            PER_SOURCE_CHARS,
            SCRAPE_DEADLINE,
        )
        .await;

        let synthesis_prompt = format!(
            r#"Analyze these news sources about {game}. The user's language is "{language}".

SOURCES:
{sources}

Your task:
1. Synthesize the most important news.
2. If a source is in a different language than the user's, translate the description but keep technical terms (nerf, buff, tier).
3. Clearly mark rumors and leaks as such.

Respond in JSON:
{{
    "summary": "executive summary in {language}",
    "news_items": [
        {{
            "title": "...",
            "date": "approximate date",
            "description": "...",
            "url": "source url",
            "source_lang": "en|es|...",
            "importance": "high|medium|low"
        }}
    ]
}}"#,
            game = topic.game,
            language = topic.language,
            sources = render_content_block(&contents),
        );

        match self
            .services
            .synthesize::<NewsSynthesis>(SYSTEM_PROMPT, synthesis_prompt)
            .await
        {
            Ok(synthesis) => {
                let rows = synthesis
                    .news_items
                    .iter()
                    .map(|item| {
                        let mut row = serde_json::to_value(item)
                            .unwrap_or(serde_json::Value::Null);
                        if let Some(obj) = row.as_object_mut() {
                            // Flag items whose source language differs from
                            // the user's so the client can badge them.
                            let foreign =
                                !item.source_lang.is_empty() && item.source_lang != topic.language;
                            obj.insert("foreign_language".to_string(), foreign.into());
                        }
                        row
                    })
                    .collect();
                let artifact = Artifact::table(TableData {
                    title: format!("{} news", topic.game),
                    items: rows,
                });
                let sources = synthesis
                    .news_items
                    .iter()
                    .filter(|item| !item.url.is_empty())
                    .map(|item| Source::new(item.title.clone(), item.url.clone()))
                    .collect();
                let result = AgentResult::ok(synthesis.summary, artifact).with_sources(sources);
                self.services.cache.set(key, result.clone(), Some(NEWS_TTL));
                result
            }
            Err(err) => {
                warn!(error = %err, game = %topic.game, "news synthesis failed, serving raw results");
                self.fallback(topic, &results)
            }
        }
    }

    /// Low-fidelity result built straight from the search hits.
    fn fallback(&self, topic: &Topic, results: &[nexus_core::SearchResult]) -> AgentResult {
        let top: Vec<_> = results.iter().take(SCRAPE_TOP_K).collect();
        let rows = top
            .iter()
            .map(|r| {
                serde_json::json!({
                    "title": r.title,
                    "url": r.url,
                    "description": r.snippet,
                })
            })
            .collect();
        let artifact = Artifact::table(TableData {
            title: format!("{} news", topic.game),
            items: rows,
        });
        let sources = top
            .iter()
            .map(|r| Source::new(r.title.clone(), r.url.clone()))
            .collect();
        AgentResult::ok(
            format!("I found {} news articles about {}.", results.len(), topic.game),
            artifact,
        )
        .with_sources(sources)
    }
}
