use super::extract::ExtractionError;
use super::validate::ValidationError;
use crate::llm::LlmError;
use thiserror::Error;

/// Every way a recommendation run can end without songs.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    #[error("Invalid arguments for song generation. Provide a mood, a persona, or both.")]
    InvalidRequest,

    #[error("Failed to get recommendations from the AI model: {0}")]
    ModelCallFailed(#[from] LlmError),

    #[error("AI response did not contain expected JSON format")]
    ExtractionFailed,

    #[error("AI response contained malformed JSON: {0}")]
    MalformedJson(String),

    #[error("AI response did not match the expected song format: {0}")]
    SchemaMismatch(String),

    #[error("Could not provide appropriate song recommendations. Try a different mood or persona.")]
    AllContentFiltered,

    #[error("Unexpected error while generating recommendations: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureKind {
    RateLimitExceeded,
    InvalidRequest,
    ModelCallFailed,
    ExtractionFailed,
    MalformedJson,
    SchemaMismatch,
    AllContentFiltered,
    #[default]
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimitExceeded => "rate_limit_exceeded",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::ModelCallFailed => "model_call_failed",
            FailureKind::ExtractionFailed => "extraction_failed",
            FailureKind::MalformedJson => "malformed_json",
            FailureKind::SchemaMismatch => "schema_mismatch",
            FailureKind::AllContentFiltered => "all_content_filtered",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RecommendationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RecommendationError::RateLimitExceeded => FailureKind::RateLimitExceeded,
            RecommendationError::InvalidRequest => FailureKind::InvalidRequest,
            RecommendationError::ModelCallFailed(_) => FailureKind::ModelCallFailed,
            RecommendationError::ExtractionFailed => FailureKind::ExtractionFailed,
            RecommendationError::MalformedJson(_) => FailureKind::MalformedJson,
            RecommendationError::SchemaMismatch(_) => FailureKind::SchemaMismatch,
            RecommendationError::AllContentFiltered => FailureKind::AllContentFiltered,
            RecommendationError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

impl From<ExtractionError> for RecommendationError {
    fn from(_: ExtractionError) -> Self {
        RecommendationError::ExtractionFailed
    }
}

impl From<ValidationError> for RecommendationError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::Parse(detail) => RecommendationError::MalformedJson(detail),
            ValidationError::Schema(detail) => RecommendationError::SchemaMismatch(detail),
            ValidationError::EmptyResult => RecommendationError::AllContentFiltered,
        }
    }
}
