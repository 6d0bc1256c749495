//! Provider settings.
//!
//! Loaded from `~/.config/nexus/config.toml` when present, then overridden
//! by environment variables (`OLLAMA_MODEL`, `OLLAMA_BASE_URL`,
//! `GEMINI_API_KEY`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderKind,

    /// API key for hosted providers.
    pub api_key: Option<String>,

    pub model_ollama: String,
    pub model_gemini: String,
    pub ollama_base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            api_key: None,
            model_ollama: "llama3.2".to_string(),
            model_gemini: "gemini-2.5-flash".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }
}

impl LlmSettings {
    /// The model the selected provider will use.
    pub fn model(&self) -> &str {
        match self.provider {
            ProviderKind::Ollama => &self.model_ollama,
            ProviderKind::Gemini => &self.model_gemini,
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nexus").join("config.toml"))
    }

    /// Load settings from the config file (defaults when absent) and apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            _ => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            if !model.is_empty() {
                self.model_ollama = model;
            }
        }
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            if !base_url.is_empty() {
                self.ollama_base_url = base_url;
            }
        }
        if self.api_key.is_none() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                if !key.is_empty() {
                    self.api_key = Some(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LlmSettings::default();
        assert_eq!(settings.provider, ProviderKind::Ollama);
        assert_eq!(settings.model(), "llama3.2");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_parse_from_toml() {
        let settings: LlmSettings = toml::from_str(
            r#"
            provider = "gemini"
            api_key = "secret"
            model_gemini = "gemini-pro"
            "#,
        )
        .unwrap();
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.model(), "gemini-pro");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        // Unset fields keep their defaults
        assert_eq!(settings.model_ollama, "llama3.2");
    }
}
