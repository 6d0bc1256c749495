//! Main-content extraction from gaming sites.
//!
//! Known sites get dedicated content selectors; everything else falls
//! through a generic selector chain and finally the document body. The
//! extractor never errors: any fetch or parse failure yields an empty
//! string and the caller drops the source.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use nexus_core::ContentExtractor;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Content selectors for sites we scrape often.
const SITE_SELECTORS: &[(&str, &[&str])] = &[
    ("fextralife.com", &["div.wiki-content", "div#wiki-content-block", "article"]),
    ("fandom.com", &["div.mw-parser-output", "div.page-content", "article"]),
    ("mobafire.com", &["div.guide-content", "div.build-wrapper", "main"]),
    ("reddit.com", &["div.Post", "shreddit-post", "article"]),
    ("u.gg", &["div.champion-stats", "div.build-content", "main"]),
];

const DEFAULT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "div.content",
    "div.post-content",
    "div.entry-content",
];

/// Boilerplate containers whose text is never content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript",
];

pub struct PageExtractor {
    client: Client,
    max_length: usize,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(7))
                .build()
                .unwrap_or_default(),
            max_length: 5000,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

#[async_trait]
impl ContentExtractor for PageExtractor {
    async fn scrape(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "scrape request failed");
                return String::new();
            }
        };

        if !response.status().is_success() {
            debug!(url, status = response.status().as_u16(), "scrape skipped");
            return String::new();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "scrape body unreadable");
                return String::new();
            }
        };

        extract_main_content(&html, url, self.max_length)
    }
}

/// Pick the best content container for `url` and return its cleaned text.
pub(crate) fn extract_main_content(html: &str, url: &str, max_length: usize) -> String {
    let document = Html::parse_document(html);

    let mut candidates: Vec<&str> = Vec::new();
    for (domain, selectors) in SITE_SELECTORS {
        if url.contains(domain) {
            candidates.extend(selectors.iter().copied());
            break;
        }
    }
    candidates.extend(DEFAULT_SELECTORS.iter().copied());
    candidates.push("body");

    for selector_str in candidates {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&extract_text(&element));
            if !text.is_empty() {
                return truncate_chars(&text, max_length);
            }
        }
    }

    String::new()
}

/// Collect text descendants, skipping anything inside boilerplate tags.
fn extract_text(element: &ElementRef) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        // Drop text living under script/style/nav/etc.
        let mut skipped = false;
        let mut current = node.parent();
        while let Some(parent) = current {
            if let Some(el) = parent.value().as_element() {
                if SKIP_TAGS.contains(&el.name()) {
                    skipped = true;
                    break;
                }
            }
            current = parent.parent();
        }
        if skipped {
            continue;
        }

        let trimmed = fragment.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }

    text
}

/// Collapse runs of whitespace; allow at most two consecutive newlines.
fn clean_text(text: &str) -> String {
    let mut result = String::new();
    let mut prev_was_space = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_space = true;
        } else if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_space = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max).collect();
    truncated.push_str("...");
    truncated
}
