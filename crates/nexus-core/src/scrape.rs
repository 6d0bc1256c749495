use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Length-capped main-content text pulled from one source page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub title: String,
    pub url: String,
    pub text: String,
}

/// Fetches a URL and extracts main-content text. An empty string means
/// "nothing usable here" and the caller drops the source; extraction
/// failures are never surfaced as errors.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn scrape(&self, url: &str) -> String;
}
