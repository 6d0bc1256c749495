//! GuideNavigator: walkthroughs, step-by-step guides, and blockers.
//!
//! Steps come back from synthesis with a spoiler tier each; the agent
//! renumbers them and enforces the progressive-reveal invariants before
//! formatting: the opening step is never a spoiler, and a guide that
//! reaches the ending carries the highest tier on its final step.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use nexus_core::{
    cache_key, AgentResult, Artifact, ArtifactBody, GuideData, GuideStepData, SearchKind, Source,
    SpoilerLevel,
};

use crate::context::{render_content_block, scrape_top_k, AgentServices, Topic};

const SYSTEM_PROMPT: &str = r#"You are GuideNavigator, an expert assistant for video-game guides and walkthroughs.
Write numbered, actionable steps grounded in the provided sources.
Classify each step's spoiler level honestly: "low" for setup and mechanics, "medium" for mid-game plot or area reveals, "high" for endings and major twists."#;

const GUIDE_TTL: Duration = Duration::from_secs(3600);
const SCRAPE_DEADLINE: Duration = Duration::from_secs(15);
const PER_SOURCE_CHARS: usize = 2500;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GuideSynthesis {
    summary: String,
    /// True when the guide runs through to the ending or final solution.
    conclusive: bool,
    #[serde(flatten)]
    guide: GuideData,
}

pub struct GuideNavigator {
    services: AgentServices,
}

impl GuideNavigator {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Find a guide or walkthrough. Total.
    pub async fn find_solution(&self, topic: &Topic) -> AgentResult {
        let key = cache_key("guide", &[&topic.game, &topic.query, &topic.language]);
        if let Some(cached) = self.services.cache.get(&key) {
            return cached;
        }

        let query = format!("{} {} guide walkthrough", topic.game, topic.query);
        let mut results = self
            .services
            .search
            .search(&query, &[], SearchKind::Wiki)
            .await;

        if results.is_empty() {
            // Community threads often cover what the wikis miss
            results = self
                .services
                .search
                .search(&query, &[], SearchKind::Forum)
                .await;
        }

        if results.is_empty() {
            return AgentResult::nothing_found(format!(
                "I couldn't find guides for {} about that.",
                topic.game
            ));
        }

        let contents = scrape_top_k(
            &self.services.extractor,
            &results,
            2,
            PER_SOURCE_CHARS,
            SCRAPE_DEADLINE,
        )
        .await;

        let synthesis_prompt = format!(
            r#"Create a step-by-step guide for {game}: {query}.

SOURCES:
{sources}

Respond in JSON:
{{
    "summary": "what this guide covers, one or two lines",
    "hint": "a spoiler-free nudge for players who want to solve it themselves",
    "difficulty": "easy|medium|hard|very_hard",
    "estimated_time": "e.g. 20 minutes" or null,
    "conclusive": true if the guide reaches the ending/final solution else false,
    "steps": [
        {{"number": 1, "title": "...", "content": "...", "tip": "optional", "warning": "optional", "spoiler_level": "low|medium|high"}}
    ],
    "collectibles": ["..."],
    "rewards": ["..."]
}}"#,
            game = topic.game,
            query = topic.query,
            sources = render_content_block(&contents),
        );

        match self
            .services
            .synthesize::<GuideSynthesis>(SYSTEM_PROMPT, synthesis_prompt)
            .await
        {
            Ok(mut synthesis) => {
                normalize_steps(&mut synthesis.guide.steps, synthesis.conclusive);
                let artifact = Artifact::guide(synthesis.guide);
                let steps = match &artifact.body {
                    ArtifactBody::StepGuide(view) => view.steps.clone(),
                    _ => Vec::new(),
                };
                let sources: Vec<Source> = contents
                    .iter()
                    .map(|c| Source::new(c.title.clone(), c.url.clone()))
                    .collect();
                let summary = if synthesis.summary.is_empty() {
                    format!("Guide for {} ready.", topic.game)
                } else {
                    synthesis.summary
                };
                let result = AgentResult::ok(summary, artifact)
                    .with_sources(sources)
                    .with_steps(steps);
                self.services.cache.set(key, result.clone(), Some(GUIDE_TTL));
                result
            }
            Err(err) => {
                warn!(error = %err, game = %topic.game, "guide synthesis failed, serving source list");
                let sources: Vec<Source> = results
                    .iter()
                    .take(3)
                    .map(|r| Source::new(r.title.clone(), r.url.clone()))
                    .collect();
                let data = GuideData {
                    hint: "See the linked guides for the full walkthrough.".to_string(),
                    ..GuideData::default()
                };
                AgentResult::ok(
                    format!("I found guide resources for {}.", topic.game),
                    Artifact::guide(data),
                )
                .with_sources(sources)
            }
        }
    }
}

/// Renumber steps sequentially and enforce the spoiler invariants.
fn normalize_steps(steps: &mut [GuideStepData], conclusive: bool) {
    for (index, step) in steps.iter_mut().enumerate() {
        step.number = index as u32 + 1;
    }
    if let Some(first) = steps.first_mut() {
        first.spoiler_level = SpoilerLevel::Low;
    }
    if conclusive {
        if let Some(last) = steps.last_mut() {
            if last.number > 1 {
                last.spoiler_level = SpoilerLevel::High;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use nexus_core::testing::{search_result, MockExtractor, MockLlm, MockSearch};
    use nexus_core::{ArtifactKind, ResultCache, RetryPolicy};

    fn topic() -> Topic {
        Topic {
            game: "Elden Ring".to_string(),
            query: "how to beat Malenia".to_string(),
            version: None,
            language: "en".to_string(),
        }
    }

    fn step(level: &str) -> String {
        format!(
            r#"{{"number": 0, "title": "step", "content": "do the thing", "spoiler_level": "{level}"}}"#
        )
    }

    #[tokio::test]
    async fn test_conclusive_guide_spoiler_invariants() {
        let search = MockSearch::with_default(vec![search_result(
            "Malenia guide",
            "https://fextralife.com/malenia",
            "boss guide",
        )]);
        let extractor = MockExtractor::new();
        extractor.insert("https://fextralife.com/malenia", "dodge waterfowl dance");
        let llm = MockLlm::new();
        llm.queue_response(format!(
            r#"{{"summary": "Beating Malenia.", "conclusive": true, "difficulty": "very_hard",
                "steps": [{}, {}, {}]}}"#,
            step("high"),
            step("medium"),
            step("medium"),
        ));

        let services = AgentServices::new(
            Arc::new(search),
            Arc::new(extractor),
            Arc::new(llm),
            Arc::new(ResultCache::new()),
        )
        .with_retry(RetryPolicy::immediate());

        let result = GuideNavigator::new(services).find_solution(&topic()).await;
        assert!(result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Guide);
        assert_eq!(result.steps.len(), 3);

        // First step is forced low even though the model said high
        assert_eq!(result.steps[0].spoiler_level, SpoilerLevel::Low);
        assert_eq!(result.steps[0].number, 1);
        assert!(!result.steps[0].hidden);

        // Conclusive guide: last step raised to high, hidden by default
        assert_eq!(result.steps[2].spoiler_level, SpoilerLevel::High);
        assert_eq!(result.steps[2].number, 3);
        assert!(result.steps[2].hidden);
        assert!(result.steps[2].collapsed);
    }

    #[test]
    fn test_inconclusive_guide_keeps_last_step_level() {
        let mut steps = vec![
            GuideStepData {
                spoiler_level: SpoilerLevel::Medium,
                ..GuideStepData::default()
            },
            GuideStepData {
                spoiler_level: SpoilerLevel::Medium,
                ..GuideStepData::default()
            },
        ];
        normalize_steps(&mut steps, false);
        assert_eq!(steps[0].spoiler_level, SpoilerLevel::Low);
        assert_eq!(steps[1].spoiler_level, SpoilerLevel::Medium);
    }

    #[test]
    fn test_single_step_guide_never_raises_its_opener() {
        let mut steps = vec![GuideStepData {
            spoiler_level: SpoilerLevel::Medium,
            ..GuideStepData::default()
        }];
        normalize_steps(&mut steps, true);
        assert_eq!(steps[0].spoiler_level, SpoilerLevel::Low);
    }

    #[tokio::test]
    async fn test_forum_fallback_when_wikis_are_silent() {
        let search = Arc::new(MockSearch::new());
        search.queue_results(vec![]);
        search.queue_results(vec![search_result(
            "Reddit: Malenia tips",
            "https://reddit.com/r/eldenring/1",
            "use bloodhound step",
        )]);
        let services = AgentServices::new(
            Arc::clone(&search) as _,
            Arc::new(MockExtractor::new()),
            Arc::new(MockLlm::new()),
            Arc::new(ResultCache::new()),
        )
        .with_retry(RetryPolicy::immediate());

        let result = GuideNavigator::new(services).find_solution(&topic()).await;
        assert_eq!(search.call_count(), 2);
        assert_eq!(result.artifact.kind, ArtifactKind::Guide);
        assert!(result.sources[0].url.contains("reddit.com"));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let services = AgentServices::new(
            Arc::new(MockSearch::new()),
            Arc::new(MockExtractor::new()),
            Arc::new(MockLlm::new()),
            Arc::new(ResultCache::new()),
        )
        .with_retry(RetryPolicy::immediate());
        let result = GuideNavigator::new(services).find_solution(&topic()).await;
        assert!(!result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Empty);
    }
}
