use super::models::ValidatedSong;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONTENT_DENYLIST: &[&str] = &["explicit", "nsfw", "xxx", "porn", "offensive"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed JSON: {0}")]
    Parse(String),

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("every song was removed by the content filter")]
    EmptyResult,
}

#[derive(Deserialize)]
struct RawSongList {
    songs: Vec<RawSong>,
}

#[derive(Deserialize)]
struct RawSong {
    title: String,
    artist: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    year: Option<RawYear>,
    #[serde(default)]
    genre: Option<String>,
}

/// Models emit the year either as a string or as a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawYear {
    fn into_string(self) -> String {
        match self {
            RawYear::Text(s) => s,
            RawYear::Integer(n) => n.to_string(),
            RawYear::Float(f) if f.fract() == 0.0 => (f as i64).to_string(),
            RawYear::Float(f) => f.to_string(),
        }
    }
}

/// Checks model output against the song-list schema and drops unsafe entries.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    denylist: Vec<String>,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_DENYLIST.iter().copied())
    }
}

impl ResponseValidator {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: denylist
                .into_iter()
                .map(|term| term.into().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    /// Schema check followed by the content filter.
    pub fn validate(&self, json_text: &str) -> Result<Vec<ValidatedSong>, ValidationError> {
        let songs = self.parse_songs(json_text)?;
        self.filter_content(songs)
    }

    /// Parse `json_text` into songs, coercing years to strings and dropping unknown fields.
    pub fn parse_songs(&self, json_text: &str) -> Result<Vec<ValidatedSong>, ValidationError> {
        let value: Value =
            serde_json::from_str(json_text).map_err(|e| ValidationError::Parse(e.to_string()))?;

        if !value.is_object() {
            return Err(ValidationError::Schema(
                "expected a JSON object with a \"songs\" array".to_string(),
            ));
        }

        let list: RawSongList =
            serde_json::from_value(value).map_err(|e| ValidationError::Schema(e.to_string()))?;

        list.songs
            .into_iter()
            .enumerate()
            .map(|(index, raw)| to_validated(index, raw))
            .collect()
    }

    /// Drop songs matching the denylist. Emptying a non-empty list is an error.
    pub fn filter_content(
        &self,
        songs: Vec<ValidatedSong>,
    ) -> Result<Vec<ValidatedSong>, ValidationError> {
        let total = songs.len();
        let allowed: Vec<ValidatedSong> = songs
            .into_iter()
            .filter(|song| self.is_allowed(song))
            .collect();

        if total > 0 && allowed.is_empty() {
            return Err(ValidationError::EmptyResult);
        }
        if allowed.len() < total {
            debug!(
                "Content filter removed {} of {} songs",
                total - allowed.len(),
                total
            );
        }

        Ok(allowed)
    }

    fn is_allowed(&self, song: &ValidatedSong) -> bool {
        let Ok(serialized) = serde_json::to_string(song) else {
            return false;
        };
        let lowered = serialized.to_lowercase();
        !self
            .denylist
            .iter()
            .any(|term| lowered.contains(term.as_str()))
    }
}

fn to_validated(index: usize, raw: RawSong) -> Result<ValidatedSong, ValidationError> {
    let title = raw.title.trim().to_string();
    let artist = raw.artist.trim().to_string();
    if title.is_empty() || artist.is_empty() {
        return Err(ValidationError::Schema(format!(
            "song {} has an empty title or artist",
            index
        )));
    }

    Ok(ValidatedSong {
        title,
        artist,
        reason: non_empty(raw.reason),
        year: non_empty(raw.year.map(RawYear::into_string)),
        genre: non_empty(raw.genre),
        link: non_empty(raw.link),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
