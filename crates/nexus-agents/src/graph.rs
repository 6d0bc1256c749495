//! Turn workflow: intent analysis, conditional dispatch, envelope
//! normalization, and state commit.
//!
//! The graph is a linear state machine per turn. Rejected queries never
//! reach a retrieval agent; otherwise the category picks exactly one of
//! the three routed agents. Conversation state is mutated only after the
//! turn has a terminal result, so cancelling mid-turn cannot corrupt it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use nexus_core::{
    AgentResult, Artifact, Category, Intent, SearchContext, SessionStore, StoredMessage, TurnEvent,
};

use crate::context::{AgentServices, Topic};
use crate::guide::GuideNavigator;
use crate::news::NewsScout;
use crate::orchestrator::IntentOrchestrator;
use crate::tactician::Tactician;

pub struct NexusGraph {
    orchestrator: IntentOrchestrator,
    news: NewsScout,
    tactician: Tactician,
    guide: GuideNavigator,
}

impl NexusGraph {
    pub fn new(services: AgentServices) -> Self {
        Self {
            orchestrator: IntentOrchestrator::new(Arc::clone(&services.llm), services.retry),
            news: NewsScout::new(services.clone()),
            tactician: Tactician::new(services.clone()),
            guide: GuideNavigator::new(services),
        }
    }

    /// Run one turn: classify, dispatch, normalize. Emits `thinking`
    /// events along the way; the terminal event is the caller's job so
    /// that state commit can happen first.
    pub async fn execute(
        &self,
        message: &str,
        context: &SearchContext,
        events: &mpsc::Sender<TurnEvent>,
    ) -> (Intent, AgentResult) {
        let _ = events
            .send(TurnEvent::thinking("Analyzing your request..."))
            .await;

        let mut intent = self.orchestrator.analyze(message, &context.summary()).await;

        // Follow-ups inherit the previous turn's scope
        if intent.is_followup {
            if let Some(game) = &context.game {
                intent.game = game.clone();
            }
            if let Some(category) = context.category {
                intent.category = category;
            }
            if intent.version.is_none() {
                intent.version = context.version.clone();
            }
        }

        let _ = events
            .send(TurnEvent::thinking(format!(
                "Detected: {} | {} | confidence {:.0}%",
                intent.game,
                intent.category,
                intent.confidence * 100.0
            )))
            .await;

        if intent.is_reject() {
            debug!(message, "off-topic query rejected");
            let _ = events
                .send(TurnEvent::thinking("Off-topic query detected."))
                .await;
            return (intent, self.rejection(message));
        }

        let topic = Topic::from_intent(&intent);
        let result = match intent.category {
            Category::News => {
                let _ = events
                    .send(TurnEvent::thinking("NewsScout: scanning live gaming news..."))
                    .await;
                self.news.search(&topic).await
            }
            Category::Build => {
                let _ = events
                    .send(TurnEvent::thinking(
                        "Tactician: analyzing the meta and recommended builds...",
                    ))
                    .await;
                self.tactician.analyze(&topic).await
            }
            Category::Guide => {
                let _ = events
                    .send(TurnEvent::thinking(
                        "GuideNavigator: consulting wikis and specialized guides...",
                    ))
                    .await;
                self.guide.find_solution(&topic).await
            }
        };

        let _ = events.send(TurnEvent::thinking("Formatting results...")).await;
        (intent, result)
    }

    fn rejection(&self, message: &str) -> AgentResult {
        AgentResult {
            success: false,
            summary: format!(
                "Sorry, \"{message}\" doesn't look related to video games. \
                 I can only help with gaming topics: news, builds, guides, \
                 lore, prices, and playtime."
            ),
            artifact: Artifact::empty("Ask me something about video games."),
            sources: Vec::new(),
            items: Vec::new(),
            steps: Vec::new(),
            deals: Vec::new(),
        }
    }
}

/// Ties the graph to the session store and exposes the event stream the
/// transport layer forwards to clients.
pub struct ChatService {
    graph: Arc<NexusGraph>,
    sessions: Arc<SessionStore>,
}

impl ChatService {
    pub fn new(graph: Arc<NexusGraph>, sessions: Arc<SessionStore>) -> Self {
        Self { graph, sessions }
    }

    /// Run a turn for a session, returning the ordered event stream:
    /// `thinking* (response | error) done`.
    pub fn stream_turn(&self, session_id: &str, message: &str) -> ReceiverStream<TurnEvent> {
        let (tx, rx) = mpsc::channel(32);
        let graph = Arc::clone(&self.graph);
        let sessions = Arc::clone(&self.sessions);
        let session_id = session_id.to_string();
        let message = message.to_string();

        tokio::spawn(async move {
            sessions.append_user(&session_id, &message);
            let context = sessions.snapshot_context(&session_id);

            // Run the turn in its own task so a panic inside an agent
            // becomes an error event instead of a silently closed stream.
            let turn = {
                let graph = Arc::clone(&graph);
                let events = tx.clone();
                let message = message.clone();
                tokio::spawn(async move { graph.execute(&message, &context, &events).await })
            };

            match turn.await {
                Ok((intent, result)) => {
                    // Final transition: commit state, then emit the terminal
                    // event. Nothing before this point mutates the session
                    // beyond the user message itself.
                    sessions.with_state(&session_id, |state| {
                        if !intent.is_reject() {
                            state.update_context(
                                Some(intent.game.as_str()),
                                Some(intent.category),
                                intent.version.as_deref(),
                                &result.items,
                            );
                        }
                        state.add_assistant(
                            result.summary.clone(),
                            Some(result.artifact.clone()),
                            Some(result.sources.clone()),
                        );
                    });
                    let _ = tx
                        .send(TurnEvent::Response {
                            content: result.summary,
                            artifact: result.artifact,
                            sources: result.sources,
                        })
                        .await;
                }
                Err(join_error) => {
                    error!(error = %join_error, "turn execution crashed");
                    let _ = tx
                        .send(TurnEvent::error(
                            "The agent hit an unexpected error. Please try again.",
                        ))
                        .await;
                }
            }

            let _ = tx.send(TurnEvent::Done).await;
        });

        ReceiverStream::new(rx)
    }

    /// Ordered message history for a session (empty when unknown).
    pub fn history(&self, session_id: &str, limit: usize) -> Vec<StoredMessage> {
        self.sessions.history(session_id, limit)
    }

    /// Clear a session; clearing a nonexistent session is a no-op.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear(session_id);
    }
}
