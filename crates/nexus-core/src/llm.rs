//! Language-model client boundary.
//!
//! Providers implement [`LlmClient`]; everything above it talks in
//! role/content turns and an output-format hint. Retry behavior lives in
//! one place ([`RetryPolicy`]) instead of per call site, parameterized by
//! error class: quota exhaustion gets a single fast retry, transport
//! failures get capped exponential backoff, invalid-model errors are never
//! retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role/content turn sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Output-format hint for the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Opaque completion capability. Implementations map their transport
/// failures onto the [`Error`] taxonomy so [`RetryPolicy`] can classify
/// them.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, turns: &[ChatTurn], format: OutputFormat) -> Result<String, Error>;
}

/// Centralized retry policy applied to every LLM call in the system.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Fixed delay before the single quota retry.
    pub quota_delay: Duration,
    /// Total attempts for transient transport failures.
    pub transport_attempts: u32,
    /// Backoff base; doubles per transport attempt.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            quota_delay: Duration::from_secs(2),
            transport_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy with no sleeping, for tests.
    pub fn immediate() -> Self {
        Self {
            quota_delay: Duration::ZERO,
            transport_attempts: 3,
            base_backoff: Duration::ZERO,
        }
    }

    /// Run a completion under this policy.
    pub async fn complete(
        &self,
        client: &dyn LlmClient,
        turns: &[ChatTurn],
        format: OutputFormat,
    ) -> Result<String, Error> {
        let mut quota_retried = false;
        let mut transport_failures = 0u32;

        loop {
            match client.complete(turns, format).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_fatal() => {
                    debug!(client = client.name(), error = %err, "LLM error is not retryable");
                    return Err(err);
                }
                Err(err) if err.is_quota() => {
                    if quota_retried {
                        return Err(err);
                    }
                    warn!(client = client.name(), "quota exceeded, retrying once");
                    quota_retried = true;
                    tokio::time::sleep(self.quota_delay).await;
                }
                Err(err) if err.is_retryable() => {
                    transport_failures += 1;
                    if transport_failures >= self.transport_attempts {
                        return Err(err);
                    }
                    let backoff = self.base_backoff * 2u32.saturating_pow(transport_failures - 1);
                    debug!(
                        client = client.name(),
                        attempt = transport_failures,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient LLM failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlm;

    #[test]
    fn test_chat_turn_constructors() {
        let turn = ChatTurn::system("be concise");
        assert_eq!(turn.role, ChatRole::System);
        assert_eq!(turn.content, "be concise");
        assert_eq!(format!("{}", ChatRole::Assistant), "assistant");
    }

    #[tokio::test]
    async fn test_quota_gets_single_fast_retry() {
        let llm = MockLlm::new();
        llm.queue_error(Error::quota("exhausted"));
        llm.queue_response(r#"{"ok": true}"#);

        let policy = RetryPolicy::immediate();
        let out = policy
            .complete(&llm, &[ChatTurn::user("hi")], OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(out, r#"{"ok": true}"#);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_quota_not_retried_twice() {
        let llm = MockLlm::new();
        llm.queue_error(Error::quota("exhausted"));
        llm.queue_error(Error::quota("still exhausted"));
        llm.queue_response("never reached");

        let policy = RetryPolicy::immediate();
        let err = policy
            .complete(&llm, &[ChatTurn::user("hi")], OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.is_quota());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_errors_fail_immediately() {
        let llm = MockLlm::new();
        llm.queue_error(Error::model_not_found("gone"));
        llm.queue_response("never reached");

        let policy = RetryPolicy::immediate();
        let err = policy
            .complete(&llm, &[ChatTurn::user("hi")], OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_backoff_is_capped() {
        let llm = MockLlm::new();
        llm.queue_error(Error::network("reset"));
        llm.queue_error(Error::timeout("slow"));
        llm.queue_error(Error::network("reset again"));
        llm.queue_response("never reached");

        let policy = RetryPolicy::immediate();
        let err = policy
            .complete(&llm, &[ChatTurn::user("hi")], OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transport_recovers_mid_ladder() {
        let llm = MockLlm::new();
        llm.queue_error(Error::network("reset"));
        llm.queue_response("recovered");

        let policy = RetryPolicy::immediate();
        let out = policy
            .complete(&llm, &[ChatTurn::user("hi")], OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, "recovered");
    }
}
