//! Test doubles shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Error;
use crate::llm::{ChatTurn, LlmClient, OutputFormat};
use crate::scrape::ContentExtractor;
use crate::search::{SearchGateway, SearchKind, SearchResult};

/// A mock LLM that returns pre-queued responses or errors in FIFO order
/// and captures every request for assertion.
pub struct MockLlm {
    responses: Mutex<Vec<Result<String, Error>>>,
    /// Captured (turns, format) pairs.
    pub calls: Mutex<Vec<(Vec<ChatTurn>, OutputFormat)>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response (FIFO: first queued = first returned).
    pub fn queue_response(&self, content: impl Into<String>) {
        self.responses.lock().unwrap().insert(0, Ok(content.into()));
    }

    /// Queue an error for the next call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All prompt text of the last captured request, joined.
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(turns, _)| {
            turns
                .iter()
                .map(|t| t.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, turns: &[ChatTurn], format: OutputFormat) -> Result<String, Error> {
        self.calls.lock().unwrap().push((turns.to_vec(), format));
        match self.responses.lock().unwrap().pop() {
            Some(result) => result,
            None => Err(Error::Unknown("no mock response queued".to_string())),
        }
    }
}

/// A mock search gateway: queued result lists are consumed per call (FIFO),
/// then a default list is served. Records every query.
pub struct MockSearch {
    queued: Mutex<Vec<Vec<SearchResult>>>,
    default: Mutex<Vec<SearchResult>>,
    /// Captured (query, kind) pairs.
    pub queries: Mutex<Vec<(String, SearchKind)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
            default: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Serve these results for every call without a queued list.
    pub fn with_default(results: Vec<SearchResult>) -> Self {
        let mock = Self::new();
        *mock.default.lock().unwrap() = results;
        mock
    }

    /// Queue a result list for one call (FIFO).
    pub fn queue_results(&self, results: Vec<SearchResult>) {
        self.queued.lock().unwrap().insert(0, results);
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchGateway for MockSearch {
    async fn search(
        &self,
        query: &str,
        _domain_hints: &[&str],
        kind: SearchKind,
    ) -> Vec<SearchResult> {
        self.queries.lock().unwrap().push((query.to_string(), kind));
        match self.queued.lock().unwrap().pop() {
            Some(results) => results,
            None => self.default.lock().unwrap().clone(),
        }
    }
}

/// A mock content extractor backed by a url -> text map; unknown URLs
/// yield an empty string, matching the real extractor's contract.
pub struct MockExtractor {
    pages: Mutex<HashMap<String, String>>,
    /// Captured URLs in scrape order.
    pub scraped: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            scraped: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, url: impl Into<String>, text: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.into(), text.into());
    }

    pub fn call_count(&self) -> usize {
        self.scraped.lock().unwrap().len()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for MockExtractor {
    async fn scrape(&self, url: &str) -> String {
        self.scraped.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default()
    }
}

/// Shorthand for a search hit in tests.
pub fn search_result(title: &str, url: &str, snippet: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
        relevance_score: 1.0,
    }
}
