//! Shared services and pipeline steps for the retrieval agents.
//!
//! Every agent runs the same skeleton: cache probe, domain-scoped search,
//! consolidation, bounded concurrent scraping, JSON synthesis, artifact
//! formatting, cache store. The steps that are identical across agents
//! live here; the agents contribute query construction, prompts, and
//! artifact variants.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

use nexus_core::{
    decode_json, ChatTurn, ContentExtractor, Error, Intent, LlmClient, OutputFormat, ResultCache,
    RetryPolicy, ScrapedContent, SearchGateway, SearchResult,
};

/// Injected collaborators handed to every agent at construction.
#[derive(Clone)]
pub struct AgentServices {
    pub search: Arc<dyn SearchGateway>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub llm: Arc<dyn LlmClient>,
    pub cache: Arc<ResultCache>,
    pub retry: RetryPolicy,
}

impl AgentServices {
    pub fn new(
        search: Arc<dyn SearchGateway>,
        extractor: Arc<dyn ContentExtractor>,
        llm: Arc<dyn LlmClient>,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            search,
            extractor,
            llm,
            cache,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One synthesis call: retried completion in JSON mode, then lenient
    /// decoding into the agent's schema.
    pub async fn synthesize<T: DeserializeOwned>(
        &self,
        system_prompt: &str,
        user_prompt: String,
    ) -> Result<T, Error> {
        let turns = [ChatTurn::system(system_prompt), ChatTurn::user(user_prompt)];
        let raw = self
            .retry
            .complete(self.llm.as_ref(), &turns, OutputFormat::Json)
            .await?;
        decode_json(&raw)
    }
}

/// Topic the graph hands to the routed agents.
#[derive(Debug, Clone)]
pub struct Topic {
    pub game: String,
    pub query: String,
    pub version: Option<String>,
    pub language: String,
}

impl Topic {
    pub fn from_intent(intent: &Intent) -> Self {
        Self {
            game: intent.game.clone(),
            query: intent.search_query.clone(),
            version: intent.version.clone(),
            language: intent.language.clone(),
        }
    }

    pub fn version_or_none(&self) -> &str {
        self.version.as_deref().unwrap_or("none")
    }
}

/// Merge result lists, deduplicating by URL and preserving order.
pub fn consolidate(lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for result in list {
            if seen.insert(result.url.clone()) {
                merged.push(result);
            }
        }
    }
    merged
}

/// Fetch the top-`k` results concurrently, keeping whatever completes
/// before the deadline. Empty scrapes are dropped; each kept text is
/// truncated to `per_source_cap` characters. Results arrive in completion
/// order, which is acceptable downstream.
pub async fn scrape_top_k(
    extractor: &Arc<dyn ContentExtractor>,
    results: &[SearchResult],
    k: usize,
    per_source_cap: usize,
    overall: Duration,
) -> Vec<ScrapedContent> {
    let deadline = Instant::now() + overall;
    let mut pending: FuturesUnordered<_> = results
        .iter()
        .take(k)
        .map(|result| {
            let extractor = Arc::clone(extractor);
            let title = result.title.clone();
            let url = result.url.clone();
            async move {
                let text = extractor.scrape(&url).await;
                ScrapedContent { title, url, text }
            }
        })
        .collect();

    let mut contents = Vec::new();
    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some(mut content)) => {
                if content.text.is_empty() {
                    continue;
                }
                content.text = truncate_chars(&content.text, per_source_cap);
                contents.push(content);
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    collected = contents.len(),
                    in_flight = pending.len(),
                    "scrape deadline elapsed, dropping in-flight fetches"
                );
                break;
            }
        }
    }
    contents
}

/// Render scraped sources for embedding in a synthesis prompt.
pub fn render_content_block(contents: &[ScrapedContent]) -> String {
    contents
        .iter()
        .map(|content| format!("### {} ({})\n{}", content.title, content.url, content.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
