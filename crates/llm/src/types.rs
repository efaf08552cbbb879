//! Provider selection types.

use cotrag_core::{AppConfig, AppError, AppResult};
use std::time::Duration;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Endpoint used when none is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => DEFAULT_OPENAI_ENDPOINT,
            Self::Ollama => DEFAULT_OLLAMA_ENDPOINT,
        }
    }
}

/// Everything the factory needs to build a client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub provider: ProviderType,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ClientSettings {
    /// Settings for a provider with default endpoint and a 120 second timeout.
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Resolve client settings for the active provider of an [`AppConfig`].
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let provider = ProviderType::parse(&config.provider).ok_or_else(|| {
            AppError::Config(format!("Unknown provider: {}", config.provider))
        })?;

        Ok(Self {
            provider,
            endpoint: config.endpoint.clone(),
            api_key: config.resolve_api_key(&config.provider),
            timeout: Duration::from_secs(config.request_timeout_secs()),
        })
    }

    /// The endpoint to call, falling back to the provider default.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("OLLAMA"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("claude"), None);
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = ClientSettings::from_config(&AppConfig::default()).unwrap();
        assert_eq!(settings.provider, ProviderType::Ollama);
        assert_eq!(settings.endpoint(), DEFAULT_OLLAMA_ENDPOINT);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_settings_unknown_provider() {
        let config = AppConfig {
            provider: "gguf".to_string(),
            ..Default::default()
        };
        assert!(ClientSettings::from_config(&config).is_err());
    }
}
