//! LLM provider factory.
//!
//! Builds the client for the configured provider. Selection happens once,
//! from explicit settings, and the resulting client is injected into the
//! pipeline.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::{ClientSettings, ProviderType};
use cotrag_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client from resolved settings.
///
/// # Errors
/// Returns [`AppError::Config`] if the provider needs an API key and none
/// was resolved.
pub fn create_client(settings: &ClientSettings) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider {
        ProviderType::Ollama => {
            let client = OllamaClient::with_timeout(settings.endpoint(), settings.timeout);
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let client = OpenAiClient::with_base_url(settings.endpoint(), api_key, settings.timeout);
            Ok(Arc::new(client))
        }
    }
}

/// Create the client for the active provider of an [`AppConfig`].
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let settings = ClientSettings::from_config(config)?;
    tracing::debug!(
        provider = settings.provider.as_str(),
        endpoint = settings.endpoint(),
        "Creating LLM client"
    );
    create_client(&settings)
}
