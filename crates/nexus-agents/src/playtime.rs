//! TimeEstimator: completion-time and backlog math.
//!
//! Unlike the retrieval agents, this one works on externally supplied
//! playtime hours (see `nexus-tools`' lookup) and never calls the model.
//! Division by a non-positive daily budget is reported as undefined
//! rather than attempted.

use nexus_core::{AgentResult, Artifact, MarathonData, PlaytimeHours, TimeData, WorthView};

/// Reference full price for the value verdict.
const REFERENCE_PRICE: f64 = 60.0;

pub struct TimeEstimator;

impl Default for TimeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Derive completion estimates for a game at a daily play budget.
    pub fn estimate(&self, game: &str, hours: PlaytimeHours, hours_per_day: f64) -> AgentResult {
        if !hours.any() {
            return AgentResult::nothing_found(format!(
                "No completion-time data found for '{game}'. Try a different spelling."
            ));
        }

        let marathon = if hours_per_day > 0.0 {
            let days_main = hours.main_story.map(|h| round1(h / hours_per_day));
            let best_days = hours.best_estimate().map(|h| round1(h / hours_per_day));
            MarathonData {
                hours_per_day,
                days_main,
                days_extras: hours.main_extras.map(|h| round1(h / hours_per_day)),
                days_completionist: hours.completionist.map(|h| round1(h / hours_per_day)),
                verdict: best_days
                    .map(|days| format!("{days} days at {hours_per_day} h/day"))
                    .unwrap_or_else(|| "N/A".to_string()),
            }
        } else {
            MarathonData {
                hours_per_day,
                days_main: None,
                days_extras: None,
                days_completionist: None,
                verdict: "undefined".to_string(),
            }
        };

        let summary = match (hours.main_story, marathon.days_main) {
            (Some(main), Some(days)) => format!(
                "The main story of {game} takes about {main} hours ({days} days at {hours_per_day} h/day)."
            ),
            (Some(main), None) => {
                format!("The main story of {game} takes about {main} hours.")
            }
            _ => format!(
                "{game} takes about {} hours to complete.",
                hours.best_estimate().unwrap_or(0.0)
            ),
        };

        let artifact = Artifact::time_tracker(TimeData {
            game: game.to_string(),
            times: hours,
            marathon,
            worth: worth_analysis(&hours, REFERENCE_PRICE),
        });

        AgentResult::ok(summary, artifact)
    }
}

/// Cost-per-hour verdict against a reference price.
fn worth_analysis(hours: &PlaytimeHours, price: f64) -> Option<WorthView> {
    let total_hours = hours.best_estimate()?;
    if total_hours <= 0.0 {
        return None;
    }
    let cost_per_hour = round2(price / total_hours);
    let verdict = if cost_per_hour < 0.50 {
        "Excellent Value"
    } else if cost_per_hour < 1.00 {
        "Good Value"
    } else if cost_per_hour < 2.00 {
        "Fair Value"
    } else {
        "Expensive"
    };
    Some(WorthView {
        verdict: verdict.to_string(),
        cost_per_hour,
        price,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::{ArtifactBody, ArtifactKind};

    fn hours(main: f64) -> PlaytimeHours {
        PlaytimeHours {
            main_story: Some(main),
            main_extras: None,
            completionist: None,
        }
    }

    #[test]
    fn test_marathon_division() {
        let result = TimeEstimator::new().estimate("Elden Ring", hours(60.0), 3.0);
        assert!(result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Time);
        let ArtifactBody::TimeTracker(view) = &result.artifact.body else {
            panic!("expected time tracker");
        };
        assert_eq!(view.marathon.days_main, Some(20.0));
        assert_eq!(view.times.main, 60.0);
    }

    #[test]
    fn test_zero_daily_budget_is_undefined() {
        let result = TimeEstimator::new().estimate("Elden Ring", hours(60.0), 0.0);
        assert!(result.success);
        let ArtifactBody::TimeTracker(view) = &result.artifact.body else {
            panic!("expected time tracker");
        };
        assert_eq!(view.marathon.days_main, None);
        assert_eq!(view.marathon.verdict, "undefined");
    }

    #[test]
    fn test_negative_daily_budget_is_undefined() {
        let result = TimeEstimator::new().estimate("Elden Ring", hours(60.0), -2.0);
        let ArtifactBody::TimeTracker(view) = &result.artifact.body else {
            panic!("expected time tracker");
        };
        assert_eq!(view.marathon.verdict, "undefined");
        assert_eq!(view.marathon.days_completionist, None);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let result = TimeEstimator::new().estimate("Hades", hours(50.0), 3.0);
        let ArtifactBody::TimeTracker(view) = &result.artifact.body else {
            panic!("expected time tracker");
        };
        // 50 / 3 = 16.666... -> 16.7
        assert_eq!(view.marathon.days_main, Some(16.7));
    }

    #[test]
    fn test_no_data_degrades() {
        let result =
            TimeEstimator::new().estimate("Obscure Game", PlaytimeHours::default(), 2.0);
        assert!(!result.success);
        assert_eq!(result.artifact.kind, ArtifactKind::Empty);
    }

    #[test]
    fn test_worth_verdicts() {
        let worth = worth_analysis(&hours(150.0), 60.0).unwrap();
        assert_eq!(worth.verdict, "Excellent Value");
        assert_eq!(worth.cost_per_hour, 0.4);

        let worth = worth_analysis(&hours(20.0), 60.0).unwrap();
        assert_eq!(worth.verdict, "Expensive");

        assert!(worth_analysis(&PlaytimeHours::default(), 60.0).is_none());
    }

    #[test]
    fn test_completionist_preferred_for_worth() {
        let hours = PlaytimeHours {
            main_story: Some(10.0),
            main_extras: Some(20.0),
            completionist: Some(120.0),
        };
        let worth = worth_analysis(&hours, 60.0).unwrap();
        assert_eq!(worth.cost_per_hour, 0.5);
        assert_eq!(worth.verdict, "Good Value");
    }
}
