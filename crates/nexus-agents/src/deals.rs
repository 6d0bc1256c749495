//! DealScout: price comparison across game stores.
//!
//! Prices come out of search snippets by pattern matching; the model is
//! only consulted when no pattern matches anywhere. The formatter owns the
//! best-deal recomputation, so this agent's own flags are advisory.

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use nexus_core::{
    cache_key, AgentResult, Artifact, ArtifactBody, DealQuote, PriceData, SearchKind, Source,
};

use crate::context::AgentServices;

const SYSTEM_PROMPT: &str = r#"You are DealScout, a relentless video-game bargain hunter.
Given a list of store prices, identify the best offer and write a short, punchy summary of the savings."#;

const ESTIMATOR_PROMPT: &str = "You are an expert at extracting video-game prices from messy web text. Read the fragments and answer with the most likely current price.";

/// Deals move daily, not hourly.
const DEALS_TTL: Duration = Duration::from_secs(86_400);

struct Store {
    id: &'static str,
    name: &'static str,
    domain: &'static str,
}

const STORES: &[Store] = &[
    Store { id: "steam", name: "Steam", domain: "store.steampowered.com" },
    Store { id: "epic", name: "Epic Games", domain: "store.epicgames.com" },
    Store { id: "eneba", name: "Eneba", domain: "eneba.com" },
    Store { id: "g2a", name: "G2A", domain: "g2a.com" },
    Store { id: "instant_gaming", name: "Instant Gaming", domain: "instant-gaming.com" },
    Store { id: "microsoft", name: "Microsoft Store", domain: "microsoft.com" },
];

// The comma-decimal form must run before the plain euro patterns, or
// "49,99 €" is read as "99 €".
const PRICE_PATTERNS: &[&str] = &[
    r"\$\s*(\d+(?:\.\d{2})?)",
    r"(\d+(?:\.\d{2})?)\s*\$",
    r"(\d+,\d{2})\s*€",
    r"(\d+(?:\.\d{2})?)\s*€",
    r"€\s*(\d+(?:\.\d{2})?)",
    r"(?i)(\d+(?:\.\d{2})?)\s*USD",
    r"(?i)(\d+(?:\.\d{2})?)\s*EUR",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceEstimate {
    price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DealSummary {
    summary: String,
}

pub struct DealScout {
    services: AgentServices,
}

impl DealScout {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Compare prices for a game across the tracked stores. Total.
    pub async fn analyze(&self, game: &str) -> AgentResult {
        let key = cache_key("deals", &[game]);
        if let Some(cached) = self.services.cache.get(&key) {
            return cached;
        }

        let store_domains: Vec<&str> = STORES.iter().map(|s| s.domain).collect();
        let query = format!("\"{game}\" price");
        let results = self
            .services
            .search
            .search(&query, &store_domains, SearchKind::Wiki)
            .await;

        let mut deals: Vec<DealQuote> = Vec::new();
        let mut fragments: Vec<String> = Vec::new();

        for result in &results {
            let Some(store) = store_for(&result.url) else {
                continue;
            };
            let text = format!("{} {}", result.title, result.snippet);
            match extract_price(&text) {
                Some(price) => deals.push(DealQuote {
                    store: store.name.to_string(),
                    store_id: store.id.to_string(),
                    price,
                    currency: "USD".to_string(),
                    url: Some(result.url.clone()),
                    is_best: false,
                }),
                None => fragments.push(format!("Store: {}\n{}", store.name, text)),
            }
        }

        // Pattern matching failed everywhere: let the model estimate once
        if deals.is_empty() && !fragments.is_empty() {
            if let Some(price) = self.estimate_price(game, &fragments).await {
                deals.push(DealQuote {
                    store: "AI estimate".to_string(),
                    store_id: "ai_detected".to_string(),
                    price,
                    currency: "USD".to_string(),
                    url: None,
                    is_best: false,
                });
            }
        }

        if deals.is_empty() {
            return AgentResult::nothing_found(format!(
                "I couldn't find offers for '{game}' at the tracked stores."
            ));
        }

        let artifact = Artifact::price(PriceData {
            game: game.to_string(),
            currency: "USD".to_string(),
            deals,
        });
        let ArtifactBody::PriceComparison(view) = &artifact.body else {
            unreachable!("price formatter returns a price comparison");
        };

        let best = view
            .deals
            .iter()
            .find(|d| d.is_best)
            .cloned()
            .unwrap_or_else(|| view.deals[0].clone());

        let summary = self
            .summarize(game, view.deals.len(), &best.store, best.price, view.savings)
            .await;

        let sources = view
            .deals
            .iter()
            .filter_map(|d| {
                d.url
                    .as_ref()
                    .map(|url| Source::new(d.store.clone(), url.clone()))
            })
            .collect();

        let deal_views = view.deals.clone();
        let result = AgentResult::ok(summary, artifact)
            .with_sources(sources)
            .with_deals(deal_views);
        self.services.cache.set(key, result.clone(), Some(DEALS_TTL));
        result
    }

    async fn estimate_price(&self, game: &str, fragments: &[String]) -> Option<f64> {
        let combined: String = fragments
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n")
            .chars()
            .take(1500)
            .collect();
        let prompt = format!(
            r#"Extract the most likely price of '{game}' from these search fragments.

Fragments:
{combined}

Respond in JSON: {{"price": 19.99}} or {{"price": null}} if none is present."#
        );
        match self
            .services
            .synthesize::<PriceEstimate>(ESTIMATOR_PROMPT, prompt)
            .await
        {
            Ok(estimate) => estimate.price.filter(|p| *p > 0.0),
            Err(err) => {
                warn!(error = %err, game, "price estimation failed");
                None
            }
        }
    }

    async fn summarize(
        &self,
        game: &str,
        deal_count: usize,
        best_store: &str,
        best_price: f64,
        savings: f64,
    ) -> String {
        let prompt = format!(
            r#"Game: {game}. {deal_count} offers found. Best: {best_store} at ${best_price:.2}. Savings vs the most expensive store: ${savings:.2}.

Respond in JSON: {{"summary": "one enthusiastic line about the best deal"}}"#
        );
        match self
            .services
            .synthesize::<DealSummary>(SYSTEM_PROMPT, prompt)
            .await
        {
            Ok(s) if !s.summary.is_empty() => s.summary,
            _ => format!("Best price found at {best_store} for ${best_price:.2}."),
        }
    }
}

fn store_for(url: &str) -> Option<&'static Store> {
    let url = url.to_lowercase();
    STORES.iter().find(|store| url.contains(store.domain))
}

/// Pull a numeric price out of unstructured text. Handles `$X.XX`,
/// `X.XX$`, `X.XX€`, `€X.XX`, `X USD`, `X EUR`, and the European
/// comma-decimal form.
fn extract_price(text: &str) -> Option<f64> {
    for pattern in PRICE_PATTERNS {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(text) {
            let normalized = caps[1].replace(',', ".");
            if let Ok(price) = normalized.parse::<f64>() {
                return Some(price);
            }
        }
    }
    None
}
