//! Live web search over the DuckDuckGo HTML endpoint.
//!
//! Raw hits are filtered against a blacklist and scored with an additive
//! relevance heuristic: authority domains for the requested kind weigh
//! heavily, the game entity must appear for specific queries, and known
//! off-topic noise is penalized. The gateway never fails; any transport or
//! parse problem yields an empty result list.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use nexus_core::{SearchGateway, SearchKind, SearchResult};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Local-language gaming news outlets.
const LOCAL_NEWS_DOMAINS: &[&str] = &[
    "3djuegos.com",
    "vandal.elespanol.com",
    "hobbyconsolas.com",
    "meristation.as.com",
    "vidaextra.com",
    "elotrolado.net",
    "ign.com/es",
    "eurogamer.es",
];

/// Primary-source global outlets and leak trackers.
const GLOBAL_NEWS_DOMAINS: &[&str] = &[
    "bloomberg.com",
    "ign.com",
    "eurogamer.net",
    "videogameschronicle.com",
    "insider-gaming.com",
    "gamespot.com",
    "kotaku.com",
    "pcgamer.com",
    "rockpapershotgun.com",
    "gematsu.com",
];

/// Technical wikis and build databases.
const WIKI_DOMAINS: &[&str] = &[
    "fextralife.com",
    "wiki.gg",
    "wowhead.com",
    "mobafire.com",
    "u.gg",
    "d4builds.gg",
    "maxroll.gg",
    "tftactics.gg",
    "serebii.net",
    "liquipedia.net",
];

/// Community forums, useful for data mining and bug reports.
const FORUM_DOMAINS: &[&str] = &[
    "reddit.com",
    "steamcommunity.com",
    "resetera.com",
    "gamefaqs.gamespot.com",
];

const DOMAIN_BLACKLIST: &[&str] = &[
    "pinterest.com",
    "softonic.com",
    "quora.com",
    "userbenchmark.com",
    "fandom.com/explore",
];

/// Cross-language query expansion: local-language gaming terms mapped to
/// the English vocabulary that technical sources index under.
const QUERY_EXPANSIONS: &[(&str, &[&str])] = &[
    ("noticias", &["news", "updates"]),
    ("parche", &["patch notes", "update"]),
    ("guía", &["guide", "walkthrough"]),
    ("estrategia", &["strategy", "meta"]),
    ("trucos", &["cheats", "tips"]),
    ("lanzamiento", &["release date", "launch"]),
    ("requisitos", &["requirements", "specs"]),
    ("mejor", &["best", "top tier"]),
];

/// Off-topic words that occasionally leak through the domain filters.
const NOISE_WORDS: &[&str] = &["jewelry", "cooking", "travel", "politics"];

fn domains_for(kind: SearchKind) -> &'static [&'static str] {
    match kind {
        SearchKind::LocalNews => LOCAL_NEWS_DOMAINS,
        SearchKind::GlobalNews => GLOBAL_NEWS_DOMAINS,
        SearchKind::Wiki => WIKI_DOMAINS,
        SearchKind::Forum => FORUM_DOMAINS,
    }
}

pub struct LiveSearchGateway {
    client: Client,
    max_results: usize,
}

impl Default for LiveSearchGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveSearchGateway {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            max_results: 15,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    async fn fetch_raw(&self, query: &str) -> Option<Vec<RawHit>> {
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| warn!(error = %e, "search request failed"))
            .ok()?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "search endpoint error");
            return None;
        }

        let html = response
            .text()
            .await
            .map_err(|e| warn!(error = %e, "search response unreadable"))
            .ok()?;

        Some(parse_result_page(&html))
    }
}

#[async_trait]
impl SearchGateway for LiveSearchGateway {
    async fn search(
        &self,
        query: &str,
        domain_hints: &[&str],
        kind: SearchKind,
    ) -> Vec<SearchResult> {
        // Caller hints lead so specific sites (store fronts, lore wikis)
        // survive the site-hint cap in build_query.
        let domains: Vec<&str> = domain_hints
            .iter()
            .chain(domains_for(kind).iter())
            .copied()
            .collect();
        let final_query = build_query(query, &domains);
        debug!(%final_query, %kind, "running web search");

        let raw = match self.fetch_raw(&final_query).await {
            Some(raw) => raw,
            None => return Vec::new(),
        };

        rank_results(raw, query, &domains, self.max_results)
    }
}

struct RawHit {
    title: String,
    url: String,
    snippet: String,
}

fn parse_result_page(html: &str) -> Vec<RawHit> {
    let document = Html::parse_document(html);
    let result_sel = match Selector::parse("div.result") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    let title_sel = Selector::parse("a.result__a").ok();
    let snippet_sel = Selector::parse("a.result__snippet, div.result__snippet").ok();

    let mut hits = Vec::new();
    for result in document.select(&result_sel) {
        let Some(title_sel) = &title_sel else { break };
        let Some(anchor) = result.select(title_sel).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let title = anchor.text().collect::<String>().trim().to_string();
        let snippet = snippet_sel
            .as_ref()
            .and_then(|sel| result.select(sel).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if title.is_empty() || href.is_empty() {
            continue;
        }
        hits.push(RawHit {
            title,
            url: href.to_string(),
            snippet,
        });
    }
    hits
}

/// Build the final query: gaming-context reinforcement, cross-language
/// expansion, and `site:` hints for the top authority domains.
pub(crate) fn build_query(query: &str, domains: &[&str]) -> String {
    let mut expansions: Vec<&str> = Vec::new();
    for word in query.to_lowercase().split_whitespace() {
        if let Some((_, terms)) = QUERY_EXPANSIONS.iter().find(|(key, _)| *key == word) {
            expansions.extend(terms.iter().copied());
        }
    }

    let mut keywords = format!("{query} video game");
    if !expansions.is_empty() {
        keywords.push(' ');
        keywords.push_str(&expansions.join(" "));
    }

    let hints: Vec<String> = domains
        .iter()
        .take(8)
        .map(|d| format!("site:{d}"))
        .collect();
    if hints.is_empty() {
        keywords
    } else {
        format!("{keywords} ({})", hints.join(" OR "))
    }
}

/// Score, filter, and rank raw hits. The first query token stands in for
/// the game entity; industry-wide queries are scored more leniently.
pub(crate) fn rank_results(
    raw: Vec<RawHit>,
    query: &str,
    domains: &[&str],
    max_results: usize,
) -> Vec<SearchResult> {
    let query_lower = query.to_lowercase();
    let game_token = query_lower.split_whitespace().next().unwrap_or_default();
    let industry_wide = query_lower.contains("industry");

    let mut results: Vec<SearchResult> = raw
        .into_iter()
        .filter(|hit| {
            let url = hit.url.to_lowercase();
            !DOMAIN_BLACKLIST.iter().any(|black| url.contains(black))
        })
        .map(|hit| {
            let score = score_hit(&hit, domains, game_token, industry_wide);
            SearchResult {
                title: hit.title,
                url: hit.url,
                snippet: hit.snippet,
                relevance_score: score,
            }
        })
        .collect();

    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    results.truncate(max_results);
    results
}

fn score_hit(hit: &RawHit, domains: &[&str], game_token: &str, industry_wide: bool) -> f64 {
    let url = hit.url.to_lowercase();
    let title = hit.title.to_lowercase();
    let snippet = hit.snippet.to_lowercase();

    let mut score = 0.0;

    let authority = domains.iter().any(|d| url.contains(d));
    if authority {
        score += 40.0;
    }

    if url.contains("fandom.com") && !game_token.is_empty() && url.contains(game_token) {
        score += 15.0;
    }

    if !game_token.is_empty() {
        if title.contains(game_token) {
            score += 10.0;
        } else if snippet.contains(game_token) {
            score += 5.0;
        } else if !industry_wide {
            // A specific-game query that never mentions the game is noise
            score -= 10.0;
        }
    }

    if authority && industry_wide {
        score += 5.0;
    }

    if NOISE_WORDS
        .iter()
        .any(|noise| title.contains(noise) || snippet.contains(noise))
    {
        score -= 20.0;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, url: &str, snippet: &str) -> RawHit {
        RawHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_build_query_adds_site_hints() {
        let q = build_query("elden ring build", WIKI_DOMAINS);
        assert!(q.starts_with("elden ring build video game"));
        assert!(q.contains("site:fextralife.com"));
        assert!(q.contains(" OR "));
    }

    #[test]
    fn test_build_query_expands_local_terms() {
        let q = build_query("elden ring parche", &[]);
        assert!(q.contains("patch notes"));
        assert!(q.contains("update"));
    }

    #[test]
    fn test_authority_domains_outrank_generic_hits() {
        let raw = vec![
            hit("Elden Ring builds", "https://randomblog.net/elden", "elden ring"),
            hit("Elden Ring wiki", "https://fextralife.com/elden-ring", "elden ring builds"),
        ];
        let ranked = rank_results(raw, "elden ring build", WIKI_DOMAINS, 10);
        assert_eq!(ranked[0].url, "https://fextralife.com/elden-ring");
        assert!(ranked[0].relevance_score > ranked[1].relevance_score);
    }

    #[test]
    fn test_blacklisted_domains_are_dropped() {
        let raw = vec![
            hit("Elden pins", "https://pinterest.com/elden", "elden ring"),
            hit("Elden Ring wiki", "https://fextralife.com/elden-ring", "builds"),
        ];
        let ranked = rank_results(raw, "elden ring build", WIKI_DOMAINS, 10);
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].url.contains("fextralife"));
    }

    #[test]
    fn test_unrelated_hits_score_negative_for_specific_games() {
        let raw = vec![hit(
            "Best cooking recipes",
            "https://somewhere.com/food",
            "great cooking tips",
        )];
        let ranked = rank_results(raw, "hades build", WIKI_DOMAINS, 10);
        assert!(ranked[0].relevance_score < 0.0);
    }

    #[test]
    fn test_max_results_cap() {
        let raw = (0..30)
            .map(|i| hit("Elden Ring", &format!("https://fextralife.com/{i}"), "elden"))
            .collect();
        let ranked = rank_results(raw, "elden ring", WIKI_DOMAINS, 15);
        assert_eq!(ranked.len(), 15);
    }

    #[test]
    fn test_parse_result_page() {
        let html = r#"
            <html><body>
              <div class="result">
                <a class="result__a" href="https://fextralife.com/elden">Elden Ring Wiki</a>
                <a class="result__snippet">Builds and weapons</a>
              </div>
              <div class="result">
                <a class="result__a" href="">No url</a>
              </div>
            </body></html>"#;
        let hits = parse_result_page(html);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Elden Ring Wiki");
        assert_eq!(hits[0].snippet, "Builds and weapons");
    }
}
