//! The recommendation request pipeline.

mod enrich;
mod error;
mod extract;
mod models;
mod prompt;
mod rate_limit;
mod sanitize;
mod service;
mod validate;

pub use enrich::{merge_track, search_query, CatalogEnricher};
pub use error::{FailureKind, RecommendationError};
pub use extract::{extract_json, ExtractionError};
pub use models::{
    EnrichedSong, PopularityBucket, RecommendationFailure, RecommendationOptions,
    RecommendationRequest, RecommendationResult, RecommendationSuccess, ValidatedSong,
};
pub use prompt::{Prompt, PromptBuilder, PromptCase, SYSTEM_INSTRUCTION};
pub use rate_limit::{InMemoryRateLimiter, RateLimiter, MAX_RATE_LIMIT_WINDOW};
pub use sanitize::{InputSanitizer, DEFAULT_INJECTION_PHRASES, DEFAULT_MAX_INPUT_LENGTH, INVALID_INPUT};
pub use service::{PipelineSettings, PipelineStage, RecommendationService};
pub use validate::{ResponseValidator, ValidationError, DEFAULT_CONTENT_DENYLIST};
