//! nexus-agents: Retrieval agents and the turn workflow for nexus
//!
//! This crate provides:
//! - `IntentOrchestrator`: one-shot message classification with a
//!   deterministic fallback
//! - The retrieval agents (`NewsScout`, `Tactician`, `GuideNavigator`,
//!   `Chronos`, `DealScout`, `TimeEstimator`), all sharing the same
//!   cache/search/scrape/synthesize pipeline and all total by contract
//! - `NexusGraph` + `ChatService`: the per-turn workflow and its event
//!   stream

mod chronos;
mod context;
mod deals;
mod graph;
mod guide;
mod news;
mod orchestrator;
mod playtime;
mod tactician;

pub use chronos::Chronos;
pub use context::{consolidate, render_content_block, scrape_top_k, AgentServices, Topic};
pub use deals::DealScout;
pub use graph::{ChatService, NexusGraph};
pub use guide::GuideNavigator;
pub use news::NewsScout;
pub use orchestrator::IntentOrchestrator;
pub use playtime::TimeEstimator;
pub use tactician::Tactician;
