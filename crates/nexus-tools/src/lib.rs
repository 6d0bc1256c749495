//! nexus-tools: Web retrieval tools for nexus
//!
//! Concrete implementations of the search and scraping boundaries:
//! - `LiveSearchGateway`: DuckDuckGo-backed web search with domain
//!   allow-lists and a relevance heuristic
//! - `PageExtractor`: main-content text extraction with per-site selectors
//! - `PlaytimeLookup`: completion-hours retrieval for the time estimator

pub mod playtime;
pub mod scrape;
pub mod search;

pub use playtime::{extract_hours, PlaytimeLookup};
pub use scrape::PageExtractor;
pub use search::LiveSearchGateway;
