//! The recommendation pipeline entry point.
//!
//! One call runs: rate limit check, input sanitization and validation, prompt
//! construction, the model call, JSON extraction, schema validation, content
//! filtering and catalog enrichment. Every outcome, panics included, comes
//! back as a [`RecommendationResult`].

use super::enrich::CatalogEnricher;
use super::error::RecommendationError;
use super::extract::extract_json;
use super::models::{
    RecommendationFailure, RecommendationOptions, RecommendationRequest, RecommendationResult,
    RecommendationSuccess,
};
use super::prompt::PromptBuilder;
use super::rate_limit::RateLimiter;
use super::sanitize::{InputSanitizer, INVALID_INPUT};
use super::validate::ResponseValidator;
use crate::catalog_search::CatalogSearch;
use crate::config::{AppConfig, ContentSettings};
use crate::llm::{CompletionOptions, FinishReason, LlmProvider};
use crate::persona::{Persona, PersonaStore, PersonaSummary};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pipeline states, logged as a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    RateLimitCheck,
    Validating,
    Prompting,
    AwaitingModel,
    Extracting,
    SchemaValidating,
    ContentFiltering,
    Enriching,
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub content: ContentSettings,
    pub enrichment_concurrency: usize,
    pub completion: CompletionOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            content: ContentSettings::default(),
            enrichment_concurrency: 4,
            completion: CompletionOptions::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            content: config.content.clone(),
            enrichment_concurrency: config.enrichment_concurrency,
            completion: CompletionOptions {
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
                timeout: Duration::from_secs(config.llm.timeout_secs),
            },
        }
    }
}

pub struct RecommendationService {
    llm: Arc<dyn LlmProvider>,
    enricher: CatalogEnricher,
    rate_limiter: Arc<dyn RateLimiter>,
    personas: Arc<PersonaStore>,
    sanitizer: InputSanitizer,
    prompt_builder: PromptBuilder,
    validator: ResponseValidator,
    completion: CompletionOptions,
}

impl RecommendationService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<dyn CatalogSearch>,
        rate_limiter: Arc<dyn RateLimiter>,
        personas: Arc<PersonaStore>,
        settings: PipelineSettings,
    ) -> Self {
        let content = settings.content;
        Self {
            llm,
            enricher: CatalogEnricher::new(catalog, settings.enrichment_concurrency),
            rate_limiter,
            personas,
            sanitizer: InputSanitizer::new(content.max_input_length, content.injection_phrases),
            prompt_builder: PromptBuilder::new(
                content.song_count,
                content.max_favorite_artist_songs,
            ),
            validator: ResponseValidator::new(content.content_denylist),
            completion: settings.completion,
        }
    }

    pub fn personas(&self) -> &PersonaStore {
        &self.personas
    }

    pub fn llm(&self) -> &dyn LlmProvider {
        self.llm.as_ref()
    }

    /// Run the pipeline for `client_id`. Never fails: errors become `Failure`.
    pub async fn request_recommendations(
        &self,
        client_id: &str,
        request: RecommendationRequest,
    ) -> RecommendationResult {
        let persona = self.resolve_persona(request.persona_id.as_deref());
        let summary = persona.map(Persona::summary);

        let run = AssertUnwindSafe(self.run(client_id, &request, persona, summary.clone()));
        let outcome = match run.catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(RecommendationError::Unknown(panic_message(panic.as_ref()))),
        };

        match outcome {
            Ok(success) => {
                log_stage(PipelineStage::Success);
                info!(
                    "Generated {} recommendations for client {}",
                    success.songs.len(),
                    client_id
                );
                RecommendationResult::Success(success)
            }
            Err(e) => {
                log_stage(PipelineStage::Failure);
                warn!(
                    "Recommendation request from {} failed ({}): {}",
                    client_id,
                    e.kind(),
                    e
                );
                RecommendationResult::Failure(RecommendationFailure {
                    error: e.to_string(),
                    persona: summary,
                    kind: e.kind(),
                })
            }
        }
    }

    fn resolve_persona(&self, persona_id: Option<&str>) -> Option<&Persona> {
        let id = persona_id.map(str::trim).filter(|id| !id.is_empty())?;
        let persona = self.personas.get(id);
        if persona.is_none() {
            warn!("Unknown persona id '{}', continuing without persona", id);
        }
        persona
    }

    async fn run(
        &self,
        client_id: &str,
        request: &RecommendationRequest,
        persona: Option<&Persona>,
        summary: Option<PersonaSummary>,
    ) -> Result<RecommendationSuccess, RecommendationError> {
        log_stage(PipelineStage::Idle);

        log_stage(PipelineStage::RateLimitCheck);
        if !self.rate_limiter.allow(client_id) {
            return Err(RecommendationError::RateLimitExceeded);
        }

        log_stage(PipelineStage::Validating);
        let mood = self.sanitizer.sanitize(request.mood.as_deref());
        if mood == INVALID_INPUT {
            warn!("Mood from client {} matched an injection pattern", client_id);
        }
        let filters = self.sanitize_options(request.options.as_ref());

        log_stage(PipelineStage::Prompting);
        let prompt = self.prompt_builder.build(&mood, persona, &filters)?;
        debug!("Prompt case: {:?}", prompt.case);

        log_stage(PipelineStage::AwaitingModel);
        let response = self
            .llm
            .complete(&prompt.messages(), &self.completion)
            .await?;
        if response.finish_reason == FinishReason::MaxTokens {
            warn!("Model response was cut off by the token limit");
        }

        log_stage(PipelineStage::Extracting);
        let json = extract_json(&response.message.content)?;

        log_stage(PipelineStage::SchemaValidating);
        let songs = self.validator.parse_songs(json)?;

        log_stage(PipelineStage::ContentFiltering);
        let songs = self.validator.filter_content(songs)?;

        log_stage(PipelineStage::Enriching);
        let songs = self.enricher.enrich_all(songs).await;

        Ok(RecommendationSuccess {
            songs,
            mood,
            filters,
            persona: summary,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn sanitize_options(&self, options: Option<&RecommendationOptions>) -> RecommendationOptions {
        let Some(options) = options else {
            return RecommendationOptions::default();
        };
        RecommendationOptions {
            genre: self.sanitizer.sanitize_field(options.genre.as_deref()),
            era: self.sanitizer.sanitize_field(options.era.as_deref()),
            popularity: self.sanitizer.sanitize_field(options.popularity.as_deref()),
            language: self.sanitizer.sanitize_field(options.language.as_deref()),
            exclude_mainstream: options.exclude_mainstream,
        }
    }
}

fn log_stage(stage: PipelineStage) {
    debug!("Pipeline stage: {:?}", stage);
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during recommendation".to_string()
    }
}
