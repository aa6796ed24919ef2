//! LLM provider abstraction layer.
//!
//! The recommendation pipeline only needs plain text completions: a fixed
//! system instruction plus one user prompt in, free-form text out. Providers
//! implement [`LlmProvider`] so the backend (Ollama, OpenAI-compatible) can be
//! picked from configuration.

mod ollama;
mod openai;
mod provider;
mod types;

pub use ollama::OllamaProvider;
pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};

use crate::config::LlmSettings;
use anyhow::{bail, Result};
use std::sync::Arc;

/// Build the configured LLM provider.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match settings.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(&settings.base_url, &settings.model)),
        "openai" => Arc::new(OpenAIProvider::new(
            &settings.base_url,
            &settings.model,
            ApiKeySource::from_settings(
                settings.api_key.as_deref(),
                settings.api_key_command.as_deref(),
            ),
        )),
        other => bail!("Unknown LLM provider: {}", other),
    };
    Ok(provider)
}
