//! nexus-providers: Language-model client implementations for nexus
//!
//! Concrete [`nexus_core::LlmClient`]s for the two supported transports,
//! plus the settings file that selects between them.

pub mod config;
pub mod gemini;
pub mod ollama;

use std::sync::Arc;

use nexus_core::{Error, LlmClient};

pub use config::{LlmSettings, ProviderKind};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Build the configured client.
pub fn build_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>, Error> {
    match settings.provider {
        ProviderKind::Ollama => {
            let client = OllamaClient::new(settings.model_ollama.clone())
                .with_base_url(settings.ollama_base_url.clone());
            Ok(Arc::new(client))
        }
        ProviderKind::Gemini => {
            let api_key = settings
                .api_key
                .clone()
                .ok_or_else(|| Error::config("gemini provider selected but no API key set"))?;
            Ok(Arc::new(GeminiClient::new(
                api_key,
                settings.model_gemini.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_for_ollama() {
        let settings = LlmSettings::default();
        let client = build_client(&settings).unwrap();
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let settings = LlmSettings {
            provider: ProviderKind::Gemini,
            api_key: None,
            ..LlmSettings::default()
        };
        let err = match build_client(&settings) {
            Ok(_) => panic!("expected build_client to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::Config(_)));
    }
}
