//! Chat completions against any OpenAI-compatible endpoint (OpenAI,
//! OpenRouter, vLLM, LM Studio, ...).

use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const KEY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the bearer key comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiKeySource {
    None,
    Static(String),
    /// Shell command printing the key. Run before every request so rotating
    /// tokens keep working.
    Command(String),
}

impl ApiKeySource {
    /// A static key wins over a command.
    pub fn from_settings(api_key: Option<&str>, api_key_command: Option<&str>) -> Self {
        match (api_key, api_key_command) {
            (Some(key), _) => ApiKeySource::Static(key.to_string()),
            (None, Some(command)) => ApiKeySource::Command(command.to_string()),
            (None, None) => ApiKeySource::None,
        }
    }

    async fn resolve(&self) -> Result<Option<String>, LlmError> {
        match self {
            ApiKeySource::None => Ok(None),
            ApiKeySource::Static(key) => Ok(Some(key.clone())),
            ApiKeySource::Command(command) => run_key_command(command).await.map(Some),
        }
    }
}

async fn run_key_command(command: &str) -> Result<String, LlmError> {
    let output = tokio::time::timeout(
        KEY_COMMAND_TIMEOUT,
        Command::new("sh").arg("-c").arg(command).output(),
    )
    .await
    .map_err(|_| {
        warn!("api_key_command timed out");
        LlmError::Timeout
    })?
    .map_err(|e| LlmError::Connection(format!("api_key_command could not run: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(stderr = %stderr.trim(), "api_key_command failed");
        return Err(LlmError::Connection(format!(
            "api_key_command exited with {}",
            output.status
        )));
    }

    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        return Err(LlmError::Connection(
            "api_key_command printed no key".to_string(),
        ));
    }
    Ok(key)
}

pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    model: String,
    key: ApiKeySource,
}

impl OpenAIProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, key: ApiKeySource) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            key,
        }
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, LlmError> {
        Ok(match self.key.resolve().await? {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest::new(&self.model, messages, options);
        debug!(model = %self.model, messages = messages.len(), "Requesting chat completion");

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .timeout(options.timeout);
        let response = self.authorized(request).await?.send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("unreadable completion: {}", e)))?;
        chat.try_into()
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let request = self
            .client
            .get(format!("{}/models", self.base_url))
            .timeout(HEALTH_CHECK_TIMEOUT);
        let response = self.authorized(request).await?.send().await?;

        if !response.status().is_success() {
            return Err(LlmError::Api {
                status: response.status().as_u16(),
                message: "model listing failed".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message], options: &CompletionOptions) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl TryFrom<ChatResponse> for CompletionResponse {
    type Error = LlmError;

    fn try_from(chat: ChatResponse) -> Result<Self, Self::Error> {
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("completion had no choices".to_string()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::MaxTokens,
            Some("content_filter") => FinishReason::Error,
            _ => FinishReason::Stop,
        };

        Ok(CompletionResponse {
            message: Message {
                role: MessageRole::Assistant,
                content: choice.message.content.unwrap_or_default(),
            },
            finish_reason,
            usage: chat.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
