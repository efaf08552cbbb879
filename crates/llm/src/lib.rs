//! LLM integration crate for cotrag.
//!
//! This crate provides the provider-agnostic text generation seam used by
//! the reasoning sampler. Every provider implements [`LlmClient`].
//!
//! # Providers
//! - **Ollama**: Local LLM runtime over HTTP (default)
//! - **OpenAI**: Hosted chat completions over HTTPS with an API key
//! - **Mock**: Scripted in-process responses for tests
//!
//! # Example
//! ```no_run
//! use cotrag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3").with_temperature(0.7);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_from_config};
pub use providers::{MockClient, OllamaClient, OpenAiClient};
pub use types::{ClientSettings, ProviderType};
