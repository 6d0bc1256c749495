//! Artifact schemas and the formatter that produces them.
//!
//! An artifact is the structured side-panel payload accompanying an agent's
//! chat summary. Variants form a closed union keyed by `display`; every
//! artifact additionally carries the `type`/`timestamp`/`version` stamp.
//!
//! The `*Data` payload structs double as the agents' LLM-synthesis output
//! schemas: every field defaults, so a sparse or sloppy model response still
//! decodes, and the formatter is total over whatever survives decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema stamp attached to every artifact.
pub const SCHEMA_VERSION: &str = "1.0";

/// Spoiler tiers controlling how much plot/solution detail is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpoilerLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for SpoilerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpoilerLevel::Low => write!(f, "low"),
            SpoilerLevel::Medium => write!(f, "medium"),
            SpoilerLevel::High => write!(f, "high"),
        }
    }
}

/// Short template tag, kept alongside the `display` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Table,
    Build,
    Guide,
    Time,
    Price,
    Lore,
    Empty,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    #[serde(flatten)]
    pub body: ArtifactBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "display", rename_all = "snake_case")]
pub enum ArtifactBody {
    Table(TableView),
    BuildDashboard(BuildView),
    StepGuide(GuideView),
    TimeTracker(TimeView),
    PriceComparison(PriceView),
    LoreGraph(LoreView),
    EmptyState { message: String },
    ErrorState { message: String },
}

// ---------------------------------------------------------------------------
// Rendered views (what the client receives)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<serde_json::Value>,
    pub sortable: bool,
    pub filterable: bool,
    pub pagination: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterCard {
    pub name: String,
    pub tier: String,
    pub tier_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStatsView {
    pub win_rate: Option<f64>,
    pub pick_rate: Option<f64>,
    pub display_bars: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSlotView {
    pub name: String,
    pub slot: String,
    pub stats: String,
    pub priority: u8,
    /// 0-100 scale for the priority bar.
    pub priority_bar: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillView {
    pub name: String,
    pub description: String,
    pub max_first: bool,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildView {
    pub character: CharacterCard,
    pub stats: BuildStatsView,
    pub items: Vec<ItemSlotView>,
    pub skills: Vec<SkillView>,
    pub runes: Vec<String>,
    pub playstyle: String,
    pub counters: Vec<String>,
    pub synergies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideStepView {
    pub number: u32,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub spoiler_level: SpoilerLevel,
    pub collapsed: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideView {
    pub hint: String,
    pub steps: Vec<GuideStepView>,
    pub collectibles: Vec<String>,
    pub rewards: Vec<String>,
    pub difficulty: String,
    pub difficulty_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    pub progressive_reveal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayTimesView {
    pub main: f64,
    pub extra: f64,
    pub completionist: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarathonView {
    pub hours_per_day: f64,
    pub days_main: Option<f64>,
    pub days_extras: Option<f64>,
    pub days_completionist: Option<f64>,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorthView {
    pub verdict: String,
    pub cost_per_hour: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeView {
    pub game: String,
    pub times: PlayTimesView,
    pub marathon: MarathonView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worth: Option<WorthView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealView {
    pub store: String,
    pub store_id: String,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_best: bool,
    pub highlight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceView {
    pub game: String,
    pub best_price: f64,
    pub currency: String,
    pub deals: Vec<DealView>,
    pub savings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreView {
    pub title: String,
    pub mermaid_content: String,
    pub spoiler_level: SpoilerLevel,
    pub summary: String,
    pub key_events: Vec<String>,
}

// ---------------------------------------------------------------------------
// Formatter inputs (and LLM synthesis schemas)
// ---------------------------------------------------------------------------

fn unknown() -> String {
    "Unknown".to_string()
}

fn question_mark() -> String {
    "?".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    pub title: String,
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildItemData {
    pub name: String,
    pub slot: String,
    pub stats: String,
    pub priority: u8,
}

impl Default for BuildItemData {
    fn default() -> Self {
        Self {
            name: question_mark(),
            slot: String::new(),
            stats: String::new(),
            priority: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillData {
    pub name: String,
    pub description: String,
    pub max_first: bool,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildData {
    pub character: String,
    pub tier: String,
    pub win_rate: Option<f64>,
    pub pick_rate: Option<f64>,
    pub items: Vec<BuildItemData>,
    pub skills: Vec<SkillData>,
    pub runes: Vec<String>,
    pub playstyle: String,
    pub counters: Vec<String>,
    pub synergies: Vec<String>,
    pub source_warning: Option<String>,
}

impl Default for BuildData {
    fn default() -> Self {
        Self {
            character: unknown(),
            tier: question_mark(),
            win_rate: None,
            pick_rate: None,
            items: Vec::new(),
            skills: Vec::new(),
            runes: Vec::new(),
            playstyle: String::new(),
            counters: Vec::new(),
            synergies: Vec::new(),
            source_warning: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideStepData {
    pub number: u32,
    pub title: String,
    pub content: String,
    pub tip: Option<String>,
    pub warning: Option<String>,
    pub spoiler_level: SpoilerLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideData {
    pub hint: String,
    pub steps: Vec<GuideStepData>,
    pub collectibles: Vec<String>,
    pub rewards: Vec<String>,
    pub difficulty: String,
    pub estimated_time: Option<String>,
}

impl Default for GuideData {
    fn default() -> Self {
        Self {
            hint: String::new(),
            steps: Vec::new(),
            collectibles: Vec::new(),
            rewards: Vec::new(),
            difficulty: "medium".to_string(),
            estimated_time: None,
        }
    }
}

/// Playtime hours as retrieved from an external source. `None` means the
/// metric is unavailable, not zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaytimeHours {
    pub main_story: Option<f64>,
    pub main_extras: Option<f64>,
    pub completionist: Option<f64>,
}

impl PlaytimeHours {
    /// Best available estimate: completionist, then main+extras, then main.
    pub fn best_estimate(&self) -> Option<f64> {
        self.completionist.or(self.main_extras).or(self.main_story)
    }

    pub fn any(&self) -> bool {
        self.best_estimate().is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarathonData {
    pub hours_per_day: f64,
    pub days_main: Option<f64>,
    pub days_extras: Option<f64>,
    pub days_completionist: Option<f64>,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeData {
    pub game: String,
    pub times: PlaytimeHours,
    pub marathon: MarathonData,
    pub worth: Option<WorthView>,
}

impl Default for TimeData {
    fn default() -> Self {
        Self {
            game: unknown(),
            times: PlaytimeHours::default(),
            marathon: MarathonData::default(),
            worth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DealQuote {
    pub store: String,
    pub store_id: String,
    pub price: f64,
    pub currency: String,
    pub url: Option<String>,
    /// Upstream flag; the formatter recomputes this and ignores the input.
    pub is_best: bool,
}

impl Default for DealQuote {
    fn default() -> Self {
        Self {
            store: unknown(),
            store_id: String::new(),
            price: 0.0,
            currency: "USD".to_string(),
            url: None,
            is_best: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceData {
    pub game: String,
    pub currency: String,
    pub deals: Vec<DealQuote>,
}

impl Default for PriceData {
    fn default() -> Self {
        Self {
            game: unknown(),
            currency: "USD".to_string(),
            deals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoreData {
    pub title: String,
    pub summary: String,
    pub spoiler_level: SpoilerLevel,
    pub key_events: Vec<String>,
    pub mermaid_graph: String,
}

impl Default for LoreData {
    fn default() -> Self {
        Self {
            title: "Lore Map".to_string(),
            summary: String::new(),
            spoiler_level: SpoilerLevel::Low,
            key_events: Vec::new(),
            mermaid_graph: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

impl Artifact {
    fn stamped(kind: ArtifactKind, body: ArtifactBody) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            version: SCHEMA_VERSION.to_string(),
            body,
        }
    }

    pub fn table(data: TableData) -> Self {
        let columns = derive_columns(&data.items);
        let title = if data.title.is_empty() {
            "Data Table".to_string()
        } else {
            data.title
        };
        let pagination = data.items.len() > 10;
        Self::stamped(
            ArtifactKind::Table,
            ArtifactBody::Table(TableView {
                title,
                columns,
                rows: data.items,
                sortable: true,
                filterable: true,
                pagination,
            }),
        )
    }

    pub fn build(data: BuildData) -> Self {
        let items = data
            .items
            .into_iter()
            .map(|item| {
                let priority = item.priority.min(5);
                ItemSlotView {
                    name: item.name,
                    slot: item.slot,
                    stats: item.stats,
                    priority,
                    priority_bar: priority * 20,
                }
            })
            .collect();
        let skills = data
            .skills
            .into_iter()
            .map(|skill| SkillView {
                name: skill.name,
                description: skill.description,
                max_first: skill.max_first,
                key: skill.key,
            })
            .collect();
        let tier_color = tier_color(&data.tier).to_string();
        Self::stamped(
            ArtifactKind::Build,
            ArtifactBody::BuildDashboard(BuildView {
                character: CharacterCard {
                    name: data.character,
                    tier: data.tier,
                    tier_color,
                },
                stats: BuildStatsView {
                    win_rate: data.win_rate,
                    pick_rate: data.pick_rate,
                    display_bars: true,
                },
                items,
                skills,
                runes: data.runes,
                playstyle: data.playstyle,
                counters: data.counters,
                synergies: data.synergies,
                source_warning: data.source_warning,
            }),
        )
    }

    pub fn guide(data: GuideData) -> Self {
        let steps = data
            .steps
            .into_iter()
            .map(|step| {
                let collapsed = step.spoiler_level >= SpoilerLevel::Medium;
                let hidden = step.spoiler_level == SpoilerLevel::High;
                GuideStepView {
                    number: step.number,
                    title: step.title,
                    content: step.content,
                    tip: step.tip,
                    warning: step.warning,
                    spoiler_level: step.spoiler_level,
                    collapsed,
                    hidden,
                }
            })
            .collect();
        let difficulty_color = difficulty_color(&data.difficulty).to_string();
        Self::stamped(
            ArtifactKind::Guide,
            ArtifactBody::StepGuide(GuideView {
                hint: data.hint,
                steps,
                collectibles: data.collectibles,
                rewards: data.rewards,
                difficulty: data.difficulty,
                difficulty_color,
                estimated_time: data.estimated_time,
                progressive_reveal: true,
            }),
        )
    }

    pub fn time_tracker(data: TimeData) -> Self {
        Self::stamped(
            ArtifactKind::Time,
            ArtifactBody::TimeTracker(TimeView {
                game: data.game,
                times: PlayTimesView {
                    main: data.times.main_story.unwrap_or(0.0),
                    extra: data.times.main_extras.unwrap_or(0.0),
                    completionist: data.times.completionist.unwrap_or(0.0),
                },
                marathon: MarathonView {
                    hours_per_day: data.marathon.hours_per_day,
                    days_main: data.marathon.days_main,
                    days_extras: data.marathon.days_extras,
                    days_completionist: data.marathon.days_completionist,
                    verdict: data.marathon.verdict,
                },
                worth: data.worth,
            }),
        )
    }

    /// Best-deal and savings flags are recomputed from the price list here;
    /// upstream flags may be stale or inconsistent and are ignored.
    pub fn price(data: PriceData) -> Self {
        let best_index = data
            .deals
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.price.total_cmp(&b.price))
            .map(|(i, _)| i);

        let deals: Vec<DealView> = data
            .deals
            .into_iter()
            .enumerate()
            .map(|(i, quote)| {
                let is_best = Some(i) == best_index;
                DealView {
                    store: quote.store,
                    store_id: quote.store_id,
                    price: quote.price,
                    currency: quote.currency,
                    url: quote.url,
                    is_best,
                    highlight: is_best,
                }
            })
            .collect();

        let best_price = deals
            .iter()
            .map(|d| d.price)
            .fold(f64::INFINITY, f64::min);
        let best_price = if best_price.is_finite() { best_price } else { 0.0 };
        let savings = if deals.len() > 1 {
            let max = deals.iter().map(|d| d.price).fold(f64::NEG_INFINITY, f64::max);
            round2(max - best_price)
        } else {
            0.0
        };

        Self::stamped(
            ArtifactKind::Price,
            ArtifactBody::PriceComparison(PriceView {
                game: data.game,
                best_price,
                currency: data.currency,
                deals,
                savings,
            }),
        )
    }

    pub fn lore(data: LoreData) -> Self {
        Self::stamped(
            ArtifactKind::Lore,
            ArtifactBody::LoreGraph(LoreView {
                title: data.title,
                mermaid_content: clean_mermaid(&data.mermaid_graph),
                spoiler_level: data.spoiler_level,
                summary: data.summary,
                key_events: data.key_events,
            }),
        )
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::stamped(
            ArtifactKind::Empty,
            ArtifactBody::EmptyState {
                message: message.into(),
            },
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::stamped(
            ArtifactKind::Error,
            ArtifactBody::ErrorState {
                message: message.into(),
            },
        )
    }
}

fn derive_columns(items: &[serde_json::Value]) -> Vec<Column> {
    let keys: Vec<String> = match items.first().and_then(|v| v.as_object()) {
        Some(obj) => {
            let mut keys: Vec<String> = obj.keys().cloned().collect();
            // "Game" leads when present
            if let Some(pos) = keys.iter().position(|k| k == "Game") {
                let game = keys.remove(pos);
                keys.insert(0, game);
            }
            keys
        }
        None => ["title", "date", "description", "url"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    keys.into_iter()
        .map(|key| {
            let label = label_for(&key);
            Column { key, label }
        })
        .collect()
}

fn label_for(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tier_color(tier: &str) -> &'static str {
    match tier.trim().to_ascii_uppercase().as_str() {
        "S" => "#ff0055",
        "A" => "#00f3ff",
        "B" => "#00ff88",
        "C" => "#ffcc00",
        "D" => "#888888",
        "F" => "#ff4444",
        _ => "#ffffff",
    }
}

fn difficulty_color(difficulty: &str) -> &'static str {
    match difficulty.trim().to_ascii_lowercase().as_str() {
        "easy" => "#00ff88",
        "medium" => "#ffcc00",
        "hard" => "#ff8800",
        "very_hard" => "#ff0055",
        _ => "#ffffff",
    }
}

/// Strip Markdown code fences from model-produced Mermaid text and ensure a
/// graph declaration line, so the client always gets renderable input.
fn clean_mermaid(raw: &str) -> String {
    let cleaned = raw.replace("```mermaid", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return String::new();
    }
    if cleaned.starts_with("graph") {
        cleaned.to_string()
    } else {
        format!("graph TD\n{cleaned}")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
