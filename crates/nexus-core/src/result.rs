use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, DealView, GuideStepView};

/// A cited source attached to an agent answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// The unit every retrieval agent returns, caches, and the graph normalizes.
///
/// `success: false` means the pipeline degraded (nothing found), not that
/// the turn failed; the artifact is still renderable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub summary: String,
    pub artifact: Artifact,
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Item names carried into the follow-up context (builds).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    /// Raw guide steps (guides).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<GuideStepView>,
    /// Per-store quotes (deals).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deals: Vec<DealView>,
}

impl AgentResult {
    pub fn ok(summary: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            success: true,
            summary: summary.into(),
            artifact,
            sources: Vec::new(),
            items: Vec::new(),
            steps: Vec::new(),
            deals: Vec::new(),
        }
    }

    /// A degraded "nothing found" result, stream-level success.
    pub fn nothing_found(summary: impl Into<String>) -> Self {
        let summary = summary.into();
        Self {
            success: false,
            summary: summary.clone(),
            artifact: Artifact::empty(summary),
            sources: Vec::new(),
            items: Vec::new(),
            steps: Vec::new(),
            deals: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    pub fn with_steps(mut self, steps: Vec<GuideStepView>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_deals(mut self, deals: Vec<DealView>) -> Self {
        self.deals = deals;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;

    #[test]
    fn test_nothing_found_is_renderable() {
        let result = AgentResult::nothing_found("No recent news about Hades.");
        assert!(!result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Empty);
        assert!(result.sources.is_empty());
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let result = AgentResult::ok("found it", Artifact::empty("n/a"))
            .with_sources(vec![Source::new("Wiki", "https://example.com")]);
        let json = serde_json::to_string(&result).unwrap();
        let back: AgentResult = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.sources.len(), 1);
        assert_eq!(back.sources[0].url, "https://example.com");
    }
}
