use super::error::FailureKind;
use crate::persona::PersonaSummary;
use serde::{Deserialize, Serialize};

/// Structured filters a caller can attach to a request.
///
/// Every string field is free-form and only ever used as a prompt hint, after
/// sanitization. `popularity` is matched against [`PopularityBucket`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_mainstream: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopularityBucket {
    Obscure,
    Indie,
    Classic,
    Any,
}

impl PopularityBucket {
    /// Case-insensitive parse; unrecognised values yield None.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "obscure" => Some(Self::Obscure),
            "indie" => Some(Self::Indie),
            "classic" => Some(Self::Classic),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// One call into the pipeline, before any sanitization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub options: Option<RecommendationOptions>,
}

/// A song proposed by the model that passed schema and content checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSong {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A validated song plus whatever the catalog lookup could add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSong {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_spotify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl From<ValidatedSong> for EnrichedSong {
    fn from(song: ValidatedSong) -> Self {
        EnrichedSong {
            title: song.title,
            artist: song.artist,
            reason: song.reason,
            year: song.year,
            genre: song.genre,
            link: song.link,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSuccess {
    pub songs: Vec<EnrichedSong>,
    pub mood: String,
    pub filters: RecommendationOptions,
    pub persona: Option<PersonaSummary>,
    /// RFC 3339 generation time.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationFailure {
    pub error: String,
    pub persona: Option<PersonaSummary>,
    #[serde(skip)]
    pub kind: FailureKind,
}

/// Outcome of one pipeline run. Serialized without a tag: callers tell the
/// variants apart by the presence of `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationResult {
    Success(RecommendationSuccess),
    Failure(RecommendationFailure),
}

impl RecommendationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RecommendationResult::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RecommendationResult::Success(_) => None,
            RecommendationResult::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn persona(&self) -> Option<&PersonaSummary> {
        match self {
            RecommendationResult::Success(success) => success.persona.as_ref(),
            RecommendationResult::Failure(failure) => failure.persona.as_ref(),
        }
    }
}
