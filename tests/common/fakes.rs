//! In-process stand-ins for the model and the music catalog.

use async_trait::async_trait;
use moodmix_server::catalog_search::{
    CatalogAlbum, CatalogArtist, CatalogSearch, CatalogSearchError, CatalogTrack,
};
use moodmix_server::llm::{
    CompletionOptions, CompletionResponse, LlmError, LlmProvider, Message,
};
use std::sync::Mutex;

use super::constants::{CATALOG_TITLE_SUFFIX, CATALOG_TRACK_ID};

/// What the scripted model does on each call.
#[derive(Clone, Debug)]
pub enum ModelReply {
    Text(String),
    Fail,
}

/// Replies with a fixed script and records every prompt it receives.
pub struct ScriptedLlm {
    reply: ModelReply,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    pub fn new(reply: ModelReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            ModelReply::Text(text) => Ok(CompletionResponse::text(text.clone())),
            ModelReply::Fail => Err(LlmError::Connection("connection refused".to_string())),
        }
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

/// Matches every query with one track, except titles listed in `unknown`.
///
/// The catalog title is the queried one plus [`CATALOG_TITLE_SUFFIX`], so
/// tests can tell catalog names from model names.
#[derive(Default)]
pub struct FakeCatalog {
    pub unknown: Vec<String>,
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search_tracks(
        &self,
        query: &str,
        _limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogSearchError> {
        if self.unknown.iter().any(|title| query.starts_with(title.as_str())) {
            return Err(CatalogSearchError::Timeout);
        }
        let title = query.split(" artist:").next().unwrap_or(query);
        Ok(vec![CatalogTrack {
            id: CATALOG_TRACK_ID.to_string(),
            uri: format!("spotify:track:{}", CATALOG_TRACK_ID),
            name: format!("{}{}", title, CATALOG_TITLE_SUFFIX),
            artists: vec![CatalogArtist {
                name: query.split(" artist:").nth(1).unwrap_or_default().to_string(),
                external_url: None,
            }],
            album: Some(CatalogAlbum {
                name: "Fake Album".to_string(),
                images: vec![],
                release_date: Some("1970-01-01".to_string()),
            }),
            external_url: Some(format!("https://open.spotify.com/track/{}", CATALOG_TRACK_ID)),
            preview_url: None,
            popularity: Some(50),
        }])
    }
}
