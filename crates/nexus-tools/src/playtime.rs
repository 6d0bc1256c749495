//! Completion-hours lookup.
//!
//! Searches the playtime database site through the gateway and extracts
//! main-story / main+extras / completionist hours from result snippets by
//! pattern matching. The time-estimator agent consumes the result; nothing
//! here goes through a language model.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use nexus_core::{PlaytimeHours, SearchGateway, SearchKind};

const PLAYTIME_SITE: &str = "howlongtobeat.com";

const MAIN_STORY_PATTERNS: &[&str] = &[
    r"(?i)main\s+story[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
    r"(?i)\bstory[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
];

const MAIN_EXTRAS_PATTERNS: &[&str] = &[
    r"(?i)main\s*\+\s*extras?[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
    r"(?i)\bextras?[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
];

const COMPLETIONIST_PATTERNS: &[&str] = &[
    r"(?i)completionist[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
    r"(?i)100%[:\s]+(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)",
];

pub struct PlaytimeLookup {
    gateway: Arc<dyn SearchGateway>,
}

impl PlaytimeLookup {
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch completion hours for a game. Absent metrics stay `None`; a
    /// game with no extractable data yields the empty default.
    pub async fn lookup(&self, game: &str) -> PlaytimeHours {
        let query = format!("{game} hours to beat");
        let results = self
            .gateway
            .search(&query, &[PLAYTIME_SITE], SearchKind::Wiki)
            .await;

        let mut text = String::new();
        for result in &results {
            text.push_str(&result.title);
            text.push(' ');
            text.push_str(&result.snippet);
            text.push(' ');
        }

        let hours = PlaytimeHours {
            main_story: extract_metric(&text, MAIN_STORY_PATTERNS),
            main_extras: extract_metric(&text, MAIN_EXTRAS_PATTERNS),
            completionist: extract_metric(&text, COMPLETIONIST_PATTERNS),
        };
        debug!(
            game,
            found = hours.any(),
            main = hours.main_story,
            extras = hours.main_extras,
            completionist = hours.completionist,
            "playtime lookup"
        );
        hours
    }
}

fn extract_metric(text: &str, patterns: &[&str]) -> Option<f64> {
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(text) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Extract a bare hour figure like "52.5 Hours" or "52½ Hours".
pub fn extract_hours(text: &str) -> Option<f64> {
    let decimal = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)").ok()?;
    if let Some(caps) = decimal.captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            return Some(value);
        }
    }

    let fractional = Regex::new(r"(?i)(\d+)½\s*(?:hours?|hrs?)").ok()?;
    if let Some(caps) = fractional.captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            return Some(value + 0.5);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::testing::{search_result, MockSearch};

    #[test]
    fn test_extract_hours_formats() {
        assert_eq!(extract_hours("takes 52.5 Hours"), Some(52.5));
        assert_eq!(extract_hours("about 30 hrs total"), Some(30.0));
        assert_eq!(extract_hours("roughly 52½ Hours"), Some(52.5));
        assert_eq!(extract_hours("no time data"), None);
    }

    #[test]
    fn test_extract_metric_prefers_specific_pattern() {
        let text = "Main Story: 52.5 Hours, Main + Extras: 80 Hours, Completionist: 130 Hours";
        assert_eq!(extract_metric(text, MAIN_STORY_PATTERNS), Some(52.5));
        assert_eq!(extract_metric(text, MAIN_EXTRAS_PATTERNS), Some(80.0));
        assert_eq!(extract_metric(text, COMPLETIONIST_PATTERNS), Some(130.0));
    }

    #[tokio::test]
    async fn test_lookup_combines_snippets() {
        let search = MockSearch::with_default(vec![
            search_result(
                "Elden Ring - game lengths",
                "https://howlongtobeat.com/game/68151",
                "Main Story: 60 Hours. Completionist: 133 Hours.",
            ),
            search_result(
                "Elden Ring discussion",
                "https://howlongtobeat.com/forum/1",
                "Main + Extras: 100 Hours for most players.",
            ),
        ]);
        let lookup = PlaytimeLookup::new(Arc::new(search));
        let hours = lookup.lookup("Elden Ring").await;
        assert_eq!(hours.main_story, Some(60.0));
        assert_eq!(hours.main_extras, Some(100.0));
        assert_eq!(hours.completionist, Some(133.0));
        assert!(hours.any());
    }

    #[tokio::test]
    async fn test_lookup_with_no_results_is_empty() {
        let lookup = PlaytimeLookup::new(Arc::new(MockSearch::new()));
        let hours = lookup.lookup("Unknown Game").await;
        assert!(!hours.any());
    }
}
