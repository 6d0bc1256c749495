//! Ollama chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_core::{ChatTurn, Error, LlmClient, OutputFormat};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request<'a>(&'a self, turns: &[ChatTurn], format: OutputFormat) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.model,
            messages: turns
                .iter()
                .map(|turn| OllamaMessage {
                    role: turn.role.to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            stream: false,
            format: match format {
                OutputFormat::Json => Some("json"),
                OutputFormat::Text => None,
            },
        }
    }

    fn parse_error(&self, status: u16, body: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: String,
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.to_string());

        match status {
            404 => Error::model_not_found(message),
            429 => Error::quota(message),
            400 => Error::invalid_request(message),
            _ => Error::api(status, message),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, turns: &[ChatTurn], format: OutputFormat) -> Result<String, Error> {
        let url = format!("{}/api/chat", self.base_url);
        let request = self.build_request(turns, format);
        debug!(model = %self.model, turns = turns.len(), "ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(e.to_string())
                } else {
                    Error::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &body));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("ollama response: {e}")))?;
        Ok(parsed.message.content)
    }
}
