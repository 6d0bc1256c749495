//! Gemini generateContent client.
//!
//! Turns are flattened into one role-prefixed prompt; JSON output is
//! requested through the generation config's response MIME type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_core::{ChatTurn, Error, LlmClient, OutputFormat};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, turns: &[ChatTurn], format: OutputFormat) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: flatten_turns(turns),
                }],
            }],
            generation_config: match format {
                OutputFormat::Json => Some(GeminiGenerationConfig {
                    response_mime_type: "application/json".to_string(),
                }),
                OutputFormat::Text => None,
            },
        }
    }

    fn parse_error(&self, status: u16, body: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            404 => Error::model_not_found(message),
            429 => Error::quota(message),
            400 | 401 | 403 => Error::invalid_request(message),
            _ => Error::api(status, message),
        }
    }
}

/// Collapse role/content turns into a single prompt, one `role: content`
/// block per turn.
fn flatten_turns(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, turns: &[ChatTurn], format: OutputFormat) -> Result<String, Error> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = self.build_request(turns, format);
        debug!(model = %self.model, turns = turns.len(), "gemini request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
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

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("gemini response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::parse("gemini returned no candidate text"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_turns() {
        let turns = vec![ChatTurn::system("be terse"), ChatTurn::user("hello")];
        assert_eq!(flatten_turns(&turns), "system: be terse\nuser: hello");
    }

    #[test]
    fn test_json_mode_sets_mime_type() {
        let client = GeminiClient::new("key", "gemini-2.5-flash");
        let request = client.build_request(&[ChatTurn::user("hi")], OutputFormat::Json);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_text_mode_omits_generation_config() {
        let client = GeminiClient::new("key", "gemini-2.5-flash");
        let request = client.build_request(&[ChatTurn::user("hi")], OutputFormat::Text);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_error_mapping() {
        let client = GeminiClient::new("key", "gemini-2.5-flash");

        let body = r#"{"error": {"message": "Resource has been exhausted"}}"#;
        let err = client.parse_error(429, body);
        assert!(err.is_quota());
        assert!(err.to_string().contains("exhausted"));

        let err = client.parse_error(403, r#"{"error": {"message": "key invalid"}}"#);
        assert!(err.is_fatal());

        let err = client.parse_error(404, "no such model");
        assert!(matches!(err, Error::ModelNotFound(_)));
    }
}
