use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Search-query flavor; gateways map each kind to a domain allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    LocalNews,
    GlobalNews,
    Wiki,
    Forum,
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchKind::LocalNews => write!(f, "local_news"),
            SearchKind::GlobalNews => write!(f, "global_news"),
            SearchKind::Wiki => write!(f, "wiki"),
            SearchKind::Forum => write!(f, "forum"),
        }
    }
}

/// A ranked web-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub relevance_score: f64,
}

/// Ranked, filtered web search. Must never fail: a gateway that cannot
/// search returns an empty list and the caller degrades gracefully.
/// `domain_hints` adds caller-specific `site:` domains on top of the
/// kind's allow-list (store fronts, lore wikis, playtime databases).
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(
        &self,
        query: &str,
        domain_hints: &[&str],
        kind: SearchKind,
    ) -> Vec<SearchResult>;
}
